//! MCP (Model Context Protocol) server for social-clean.
//!
//! Exposes the cleaner as MCP tools so that AI assistants (Claude Desktop,
//! Cursor, etc.) can clean links over stdio JSON-RPC.
//!
//! Start with: `social-clean --mcp`

use std::sync::Arc;

use rmcp::{
    handler::server::tool::{ToolCallContext, ToolRouter},
    handler::server::wrapper::Parameters,
    model::*,
    service::RequestContext,
    tool, tool_router, ErrorData as McpError, RoleServer, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::algo::cleaner::Cleaner;
use crate::ops;

// ── Parameter structs ───────────────────────────────────────────────────────
// Each struct maps 1:1 with a CLI subcommand. `JsonSchema` is required by
// rmcp so that the tool's input schema is auto-generated for the AI client.

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CleanUrlParams {
    /// URL to clean. A missing scheme is treated as https.
    pub url: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CleanUrlsParams {
    /// URLs to clean. Failures are reported per URL.
    pub urls: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CleanRecordsParams {
    /// JSON array of objects (or plain URL strings).
    pub records: Vec<serde_json::Value>,
    /// Field containing the URL (default: "url").
    #[serde(default = "default_url_field")]
    pub field: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CleanTextParams {
    /// Free text (message, post, markdown) containing links.
    pub text: String,
}

fn default_url_field() -> String {
    "url".into()
}

fn json_text(v: &serde_json::Value) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}

fn join_error(e: tokio::task::JoinError) -> McpError {
    McpError::internal_error(format!("task join error: {e}"), None)
}

// ── MCP Server ──────────────────────────────────────────────────────────────

/// The MCP server struct. Holds the shared cleaner and the tool router.
#[derive(Clone)]
pub struct SocialCleanMcp {
    cleaner: Arc<Cleaner>,
    #[allow(dead_code)] // accessed at runtime by the #[tool_router] macro
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl SocialCleanMcp {
    pub fn new(cleaner: Cleaner) -> Self {
        Self {
            cleaner: Arc::new(cleaner),
            tool_router: Self::tool_router(),
        }
    }

    // ── clean_url ───────────────────────────────────────────────────────

    #[tool(
        name = "clean_url",
        description = "Strip tracking parameters from an Instagram, Facebook, Threads, TikTok, X/Twitter or YouTube URL. Returns the canonical URL, the platform name, and the removed parameter names. Video id (v), timestamp (t) and playlist (list) are always kept."
    )]
    async fn clean_url(
        &self,
        params: Parameters<CleanUrlParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let result = ops::op_clean_url(&self.cleaner, &p.url)
            .map_err(|e| McpError::invalid_params(e, None))?;
        Ok(CallToolResult::success(vec![Content::text(json_text(&result))]))
    }

    // ── clean_urls ──────────────────────────────────────────────────────

    #[tool(
        name = "clean_urls",
        description = "Clean a batch of social-media URLs. Returns one object per input; unsupported or malformed URLs get `error` and `error_kind` fields instead of failing the batch."
    )]
    async fn clean_urls(
        &self,
        params: Parameters<CleanUrlsParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let cleaner = Arc::clone(&self.cleaner);
        let result = tokio::task::spawn_blocking(move || ops::op_clean_urls(&cleaner, &p.urls))
            .await
            .map_err(join_error)?;
        Ok(CallToolResult::success(vec![Content::text(json_text(&result))]))
    }

    // ── clean_records ───────────────────────────────────────────────────

    #[tool(
        name = "clean_records",
        description = "Clean the URL field of every JSON record. Returns the records with added `_clean_url` and `_platform` columns (null plus `_clean_error` when a URL cannot be cleaned)."
    )]
    async fn clean_records(
        &self,
        params: Parameters<CleanRecordsParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let cleaner = Arc::clone(&self.cleaner);
        let result = tokio::task::spawn_blocking(move || {
            ops::op_clean_records(&cleaner, &p.records, &p.field)
        })
        .await
        .map_err(join_error)?;
        Ok(CallToolResult::success(vec![Content::text(json_text(&result))]))
    }

    // ── clean_text ──────────────────────────────────────────────────────

    #[tool(
        name = "clean_text",
        description = "Find every supported social-media link in free text and rewrite it without tracking parameters. Returns the rewritten text and a list of findings with byte offsets."
    )]
    async fn clean_text(
        &self,
        params: Parameters<CleanTextParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let result = ops::op_clean_text(&self.cleaner, &p.text);
        Ok(CallToolResult::success(vec![Content::text(json_text(&result))]))
    }

    // ── list_platforms ──────────────────────────────────────────────────

    #[tool(
        name = "list_platforms",
        description = "List supported platforms in lookup order with their hostnames and platform-specific tracking parameters."
    )]
    async fn list_platforms(&self) -> Result<CallToolResult, McpError> {
        let result = ops::op_platforms(self.cleaner.registry());
        Ok(CallToolResult::success(vec![Content::text(json_text(&result))]))
    }
}

// ── ServerHandler glue ──────────────────────────────────────────────────────

impl ServerHandler for SocialCleanMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Social link cleaner. Tools: clean_url, clean_urls, clean_records, \
                 clean_text, list_platforms. Pass a single URL, a batch of URLs, \
                 JSON records, or free text containing links."
                    .into(),
            ),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: None }),
                ..Default::default()
            },
            server_info: Implementation {
                name: "social-clean".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: Some("Social Link Cleaner".into()),
                description: Some("Strip tracking parameters from social-media URLs".into()),
                icons: None,
                website_url: None,
            },
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult {
            tools: self.tool_router.list_all(),
            next_cursor: None,
            meta: Default::default(),
        }))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        let tool_context = ToolCallContext::new(self, request, context);
        async move { self.tool_router.call(tool_context).await }
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.tool_router.get(name).cloned()
    }
}

// ── Entry point ─────────────────────────────────────────────────────────────

/// Start the MCP server on stdio. Called from `cli.rs` when `--mcp` is passed.
pub async fn serve_stdio(cleaner: Cleaner) -> Result<(), Box<dyn std::error::Error>> {
    let server = SocialCleanMcp::new(cleaner);
    let transport = rmcp::transport::io::stdio();
    let service = server.serve(transport).await.inspect_err(|e| {
        log::error!("MCP serve error: {e}");
    })?;
    log::info!("MCP server ready");
    service.waiting().await?;
    Ok(())
}
