//! LSP (Language Server Protocol) server for social-clean.
//!
//! Flags every supported social-media link that carries tracking parameters
//! and offers a quick fix that replaces it with the canonical URL. The cleaner
//! is also reachable through `workspace/executeCommand`.
//!
//! Start with: `social-clean --lsp`
//!
//! ## Commands
//!
//! All commands accept a single JSON object argument and return JSON results:
//!
//! | Command              | Description                                  |
//! |----------------------|----------------------------------------------|
//! | `social.clean_url`   | Clean one URL (`{"url": ...}`)               |
//! | `social.clean_text`  | Rewrite links inside text (`{"text": ...}`)  |
//! | `social.platforms`   | List supported platforms                     |

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tower_lsp::jsonrpc::{Error as RpcError, Result as RpcResult};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};

use crate::algo::cleaner::Cleaner;
use crate::algo::scan::{self, Finding};
use crate::ops;

// ── Constants ───────────────────────────────────────────────────────────────

const COMMAND_CLEAN_URL: &str = "social.clean_url";
const COMMAND_CLEAN_TEXT: &str = "social.clean_text";
const COMMAND_PLATFORMS: &str = "social.platforms";

const ALL_COMMANDS: &[&str] = &[COMMAND_CLEAN_URL, COMMAND_CLEAN_TEXT, COMMAND_PLATFORMS];

const DIAGNOSTIC_SOURCE: &str = "social-clean";
const DIAGNOSTIC_CODE: &str = "tracking-params";

// ── Server struct ───────────────────────────────────────────────────────────

pub struct SocialCleanLsp {
    client: Client,
    cleaner: Arc<Cleaner>,
    documents: DashMap<Url, String>,
}

impl SocialCleanLsp {
    pub fn new(client: Client, cleaner: Arc<Cleaner>) -> Self {
        Self {
            client,
            cleaner,
            documents: DashMap::new(),
        }
    }

    async fn refresh(&self, uri: Url, text: String, version: Option<i32>) {
        let diagnostics = diagnostics(&self.cleaner, &text);
        log::debug!("{uri}: {} tracking links", diagnostics.len());
        self.documents.insert(uri.clone(), text);
        self.client
            .publish_diagnostics(uri, diagnostics, version)
            .await;
    }
}

// ── LanguageServer impl ─────────────────────────────────────────────────────

#[tower_lsp::async_trait]
impl LanguageServer for SocialCleanLsp {
    async fn initialize(&self, _: InitializeParams) -> RpcResult<InitializeResult> {
        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: "social-clean".into(),
                version: Some(env!("CARGO_PKG_VERSION").into()),
            }),
            capabilities: ServerCapabilities {
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: ALL_COMMANDS.iter().map(|s| s.to_string()).collect(),
                    work_done_progress_options: WorkDoneProgressOptions {
                        work_done_progress: Some(false),
                    },
                }),
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                code_action_provider: Some(CodeActionProviderCapability::Simple(true)),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(
                MessageType::INFO,
                format!(
                    "social-clean LSP server v{} ready, {} platforms",
                    env!("CARGO_PKG_VERSION"),
                    self.cleaner.registry().len()
                ),
            )
            .await;
    }

    async fn shutdown(&self) -> RpcResult<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        self.refresh(doc.uri, doc.text, Some(doc.version)).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // Full sync: the last change holds the whole document.
        if let Some(change) = params.content_changes.into_iter().last() {
            let doc = params.text_document;
            self.refresh(doc.uri, change.text, Some(doc.version)).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.remove(&uri);
        self.client.publish_diagnostics(uri, vec![], None).await;
    }

    async fn code_action(&self, params: CodeActionParams) -> RpcResult<Option<CodeActionResponse>> {
        let uri = params.text_document.uri;
        let Some(text) = self.documents.get(&uri).map(|t| t.value().clone()) else {
            return Ok(None);
        };
        let actions = code_actions(&self.cleaner, &uri, &text, params.range);
        Ok((!actions.is_empty()).then_some(actions))
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> RpcResult<Option<Value>> {
        let cmd = params.command.as_str();

        let arg = params
            .arguments
            .into_iter()
            .next()
            .unwrap_or(Value::Object(serde_json::Map::new()));

        let result = match cmd {
            COMMAND_CLEAN_URL => exec_clean_url(&self.cleaner, &arg),
            COMMAND_CLEAN_TEXT => exec_clean_text(&self.cleaner, &arg),
            COMMAND_PLATFORMS => Ok(ops::op_platforms(self.cleaner.registry())),
            _ => Err(format!("Unknown command: {cmd}")),
        };

        match result {
            Ok(value) => Ok(Some(value)),
            Err(msg) => {
                self.client.log_message(MessageType::ERROR, &msg).await;
                Err(RpcError::invalid_params(msg))
            }
        }
    }
}

// ── Entry point ─────────────────────────────────────────────────────────────

/// Start the LSP server on stdio. Called from `cli.rs` when `--lsp` is passed.
pub async fn serve_stdio(cleaner: Cleaner) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let cleaner = Arc::new(cleaner);
    let (service, socket) = LspService::new(|client| SocialCleanLsp::new(client, cleaner));
    Server::new(stdin, stdout, socket).serve(service).await;
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
//  Document analysis: pure functions over text
// ═══════════════════════════════════════════════════════════════════════════

/// LSP position (UTF-16 columns) of a byte offset in `text`.
fn position_at(text: &str, offset: usize) -> Position {
    let before = &text[..offset];
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    Position::new(
        before.matches('\n').count() as u32,
        before[line_start..].encode_utf16().count() as u32,
    )
}

fn finding_range(text: &str, f: &Finding) -> Range {
    Range::new(position_at(text, f.span.start), position_at(text, f.span.end))
}

fn tracked_links(cleaner: &Cleaner, text: &str) -> Vec<Finding> {
    scan::scan(cleaner, text)
        .into_iter()
        .filter(|f| f.changed)
        .collect()
}

fn diagnostics(cleaner: &Cleaner, text: &str) -> Vec<Diagnostic> {
    tracked_links(cleaner, text)
        .iter()
        .map(|f| Diagnostic {
            range: finding_range(text, f),
            severity: Some(DiagnosticSeverity::INFORMATION),
            code: Some(NumberOrString::String(DIAGNOSTIC_CODE.into())),
            source: Some(DIAGNOSTIC_SOURCE.into()),
            message: format!(
                "{} link carries tracking parameters: {}",
                f.platform,
                f.removed.join(", ")
            ),
            ..Default::default()
        })
        .collect()
}

fn overlaps(a: &Range, b: &Range) -> bool {
    a.start <= b.end && b.start <= a.end
}

fn edit_action(
    title: String,
    kind: CodeActionKind,
    uri: &Url,
    edits: Vec<TextEdit>,
) -> CodeActionOrCommand {
    let mut changes = HashMap::new();
    changes.insert(uri.clone(), edits);
    CodeActionOrCommand::CodeAction(CodeAction {
        title,
        kind: Some(kind),
        edit: Some(WorkspaceEdit {
            changes: Some(changes),
            ..Default::default()
        }),
        is_preferred: Some(true),
        ..Default::default()
    })
}

/// One quick fix per tracking link under `range`, plus a fix-all action.
fn code_actions(
    cleaner: &Cleaner,
    uri: &Url,
    text: &str,
    range: Range,
) -> Vec<CodeActionOrCommand> {
    let links = tracked_links(cleaner, text);
    let edits: Vec<TextEdit> = links
        .iter()
        .map(|f| TextEdit::new(finding_range(text, f), f.clean_url.clone()))
        .collect();

    let mut actions: Vec<CodeActionOrCommand> = links
        .iter()
        .zip(&edits)
        .filter(|(_, edit)| overlaps(&edit.range, &range))
        .map(|(f, edit)| {
            edit_action(
                format!("Remove {} tracking parameters", f.platform),
                CodeActionKind::QUICKFIX,
                uri,
                vec![edit.clone()],
            )
        })
        .collect();

    if !edits.is_empty() {
        actions.push(edit_action(
            format!("Clean all tracking links ({})", edits.len()),
            CodeActionKind::SOURCE_FIX_ALL,
            uri,
            edits,
        ));
    }
    actions
}

// ═══════════════════════════════════════════════════════════════════════════
//  Thin command dispatchers: extract params, delegate to ops::op_*
// ═══════════════════════════════════════════════════════════════════════════

fn exec_clean_url(cleaner: &Cleaner, arg: &Value) -> Result<Value, String> {
    let url = arg
        .get("url")
        .and_then(|v| v.as_str())
        .ok_or("Missing required string field 'url'")?;
    ops::op_clean_url(cleaner, url)
}

fn exec_clean_text(cleaner: &Cleaner, arg: &Value) -> Result<Value, String> {
    let text = arg
        .get("text")
        .and_then(|v| v.as_str())
        .ok_or("Missing required string field 'text'")?;
    Ok(ops::op_clean_text(cleaner, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri() -> Url {
        Url::parse("file:///tmp/notes.md").unwrap()
    }

    #[test]
    fn position_counts_lines_and_utf16() {
        let text = "first\nsé😀 x";
        assert_eq!(position_at(text, 0), Position::new(0, 0));
        assert_eq!(position_at(text, 6), Position::new(1, 0));
        // "sé😀 " = s(1) + é(1) + 😀(2) + space(1) UTF-16 units
        let x = text.find('x').unwrap();
        assert_eq!(position_at(text, x), Position::new(1, 5));
    }

    #[test]
    fn diagnostics_only_for_tracking_links() {
        let cleaner = Cleaner::default();
        let text = "clean: https://instagram.com/p/a/\ntracked: https://youtu.be/x?si=1\n";
        let diags = diagnostics(&cleaner, text);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].range.start, Position::new(1, 9));
        assert!(diags[0].message.contains("si"));
        assert_eq!(diags[0].source.as_deref(), Some(DIAGNOSTIC_SOURCE));
    }

    #[test]
    fn quick_fix_replaces_link() {
        let cleaner = Cleaner::default();
        let text = "see https://youtu.be/x?si=1 ok";
        let range = Range::new(Position::new(0, 6), Position::new(0, 6));
        let actions = code_actions(&cleaner, &uri(), text, range);
        assert_eq!(actions.len(), 2);
        let CodeActionOrCommand::CodeAction(fix) = &actions[0] else {
            panic!("expected a code action");
        };
        assert_eq!(fix.kind, Some(CodeActionKind::QUICKFIX));
        let edits = &fix.edit.as_ref().unwrap().changes.as_ref().unwrap()[&uri()];
        assert_eq!(edits[0].new_text, "https://youtu.be/x");
        assert_eq!(edits[0].range.start, Position::new(0, 4));
    }

    #[test]
    fn fix_all_when_cursor_elsewhere() {
        let cleaner = Cleaner::default();
        let text = "a\nhttps://x.com/u/status/1?s=20\nb";
        let range = Range::new(Position::new(0, 0), Position::new(0, 1));
        let actions = code_actions(&cleaner, &uri(), text, range);
        assert_eq!(actions.len(), 1);
        let CodeActionOrCommand::CodeAction(all) = &actions[0] else {
            panic!("expected a code action");
        };
        assert_eq!(all.kind, Some(CodeActionKind::SOURCE_FIX_ALL));
    }

    #[test]
    fn no_actions_without_tracking() {
        let cleaner = Cleaner::default();
        assert!(code_actions(&cleaner, &uri(), "plain text", Range::default()).is_empty());
    }

    #[test]
    fn exec_clean_url_requires_url() {
        let cleaner = Cleaner::default();
        assert!(exec_clean_url(&cleaner, &serde_json::json!({})).is_err());
        let v = exec_clean_url(&cleaner, &serde_json::json!({"url": "fb.me/x?fbclid=1"})).unwrap();
        assert_eq!(v["clean_url"], "https://fb.me/x/");
    }
}
