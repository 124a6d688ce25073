use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use nu_plugin_social_clean::algo::scan;
use nu_plugin_social_clean::{ops, Cleaner, Registry};
use serde_json::Value;
use std::io::{self, BufRead, Read};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "social-clean",
    version,
    about = "Strip tracking parameters from social-media URLs"
)]
struct Cli {
    /// Start as an MCP (Model Context Protocol) server on stdio.
    /// AI assistants (Claude Desktop, Cursor, etc.) connect via JSON-RPC.
    #[cfg(feature = "mcp")]
    #[arg(long, exclusive = true)]
    mcp: bool,

    /// Start as an LSP (Language Server Protocol) server on stdio.
    /// Editors get diagnostics and quick fixes for tracking links.
    #[cfg(feature = "lsp")]
    #[arg(long, exclusive = true)]
    lsp: bool,

    /// Platform registry JSON file. Defaults to $SOCIAL_CLEAN_REGISTRY,
    /// then $XDG_DATA_HOME/social-clean/registry.json, then the built-in table
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace). RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean URLs given as arguments, or one per line on stdin
    Clean {
        /// URLs to clean
        urls: Vec<String>,
        /// Print JSON objects with platform and removed parameters
        #[arg(long)]
        json: bool,
    },
    /// Rewrite every social link in text read from stdin
    Text {
        /// Print a JSON report of findings instead of the rewritten text
        #[arg(long)]
        report: bool,
    },
    /// Add _clean_url / _platform columns to JSON records read from stdin
    Records {
        /// JSON field containing the URL
        #[arg(short, long, default_value = "url")]
        field: String,
    },
    /// List supported platforms in lookup order
    Platforms {
        /// Only show the platform with this key (e.g. youtube)
        key: Option<String>,
        /// Print the registry as JSON (loadable with --registry)
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let registry = match Registry::load(cli.registry.as_deref()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to load registry: {e}");
            std::process::exit(1);
        }
    };
    log::info!("loaded {} platforms", registry.len());
    let cleaner = Cleaner::new(registry);

    // ── MCP server mode ─────────────────────────────────────────────────
    #[cfg(feature = "mcp")]
    if cli.mcp {
        let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
        rt.block_on(async {
            if let Err(e) = nu_plugin_social_clean::mcp::serve_stdio(cleaner).await {
                eprintln!("MCP server error: {e}");
                std::process::exit(1);
            }
        });
        return;
    }

    // ── LSP server mode ─────────────────────────────────────────────────
    #[cfg(feature = "lsp")]
    if cli.lsp {
        let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
        rt.block_on(async {
            if let Err(e) = nu_plugin_social_clean::lsp::serve_stdio(cleaner).await {
                eprintln!("LSP server error: {e}");
                std::process::exit(1);
            }
        });
        return;
    }

    // ── Normal subcommand dispatch ──────────────────────────────────────
    let command = cli.command.unwrap_or_else(|| {
        eprintln!("No subcommand provided. Run `social-clean --help` for usage.");
        std::process::exit(1);
    });

    let ok = match command {
        Commands::Clean { urls, json } => cmd_clean(&cleaner, urls, json),
        Commands::Text { report } => cmd_text(&cleaner, report),
        Commands::Records { field } => cmd_records(&cleaner, &field),
        Commands::Platforms { key, json } => {
            cmd_platforms(cleaner.registry(), key.as_deref(), json)
        }
    };
    if !ok {
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn read_stdin() -> Option<String> {
    let mut buf = String::new();
    match io::stdin().read_to_string(&mut buf) {
        Ok(_) => Some(buf),
        Err(e) => {
            eprintln!("Failed to read stdin: {e}");
            None
        }
    }
}

fn read_stdin_json() -> Option<Vec<Value>> {
    let buf = read_stdin()?;
    match serde_json::from_str::<Value>(&buf) {
        Ok(Value::Array(arr)) => Some(arr),
        Ok(single) => Some(vec![single]),
        Err(e) => {
            eprintln!("Invalid JSON on stdin: {e}");
            None
        }
    }
}

fn print_json(v: &Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
    );
}

fn cmd_clean(cleaner: &Cleaner, mut urls: Vec<String>, json: bool) -> bool {
    if urls.is_empty() {
        let lines: io::Result<Vec<String>> = io::stdin().lock().lines().collect();
        urls = match lines {
            Ok(lines) => lines.into_iter().filter(|l| !l.trim().is_empty()).collect(),
            Err(e) => {
                eprintln!("Failed to read stdin: {e}");
                return false;
            }
        };
    }

    if json {
        let result = ops::op_clean_urls(cleaner, &urls);
        print_json(&result);
        return result
            .as_array()
            .is_some_and(|rows| rows.iter().all(|r| r.get("error").is_none()));
    }

    let mut ok = true;
    for url in &urls {
        match cleaner.clean(url) {
            Ok(r) => println!("{}", r.canonical_url),
            Err(e) => {
                eprintln!("{}: {e}", url.trim());
                ok = false;
            }
        }
    }
    ok
}

fn cmd_text(cleaner: &Cleaner, report: bool) -> bool {
    let Some(text) = read_stdin() else {
        return false;
    };
    if report {
        print_json(&ops::op_clean_text(cleaner, &text));
    } else {
        print!("{}", scan::clean_text(cleaner, &text));
    }
    true
}

fn cmd_records(cleaner: &Cleaner, field: &str) -> bool {
    let Some(rows) = read_stdin_json() else {
        return false;
    };
    print_json(&ops::op_clean_records(cleaner, &rows, field));
    true
}

fn cmd_platforms(registry: &Registry, key: Option<&str>, json: bool) -> bool {
    let selected = match key {
        Some(k) => match registry.get(k) {
            Some(p) => std::slice::from_ref(p),
            None => {
                eprintln!("Unknown platform key: {k}");
                return false;
            }
        },
        None => {
            if json {
                println!("{}", registry.to_json());
                return true;
            }
            registry.platforms()
        }
    };

    if json {
        print_json(&serde_json::json!(selected));
        return true;
    }
    for p in selected {
        println!("{:<12} {:<14} {}", p.key, p.display_name, p.hostnames.join(", "));
    }
    true
}
