//! MCP (Model Context Protocol) server for survey insights.
//!
//! Exposes every operation in `ops` as an MCP tool so that AI assistants
//! (Claude Desktop, Cursor, etc.) can invoke them over stdio JSON-RPC.
//!
//! Start with: `survey --mcp`

use rmcp::{
    handler::server::tool::{ToolCallContext, ToolRouter},
    handler::server::wrapper::Parameters,
    model::*,
    service::RequestContext,
    tool, tool_router, ErrorData as McpError, RoleServer, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::ops;

// ── Parameter structs ───────────────────────────────────────────────────────
// Each struct maps 1:1 with a CLI subcommand. `JsonSchema` is required by
// rmcp so that the tool's input schema is auto-generated for the AI client.

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ParseParams {
    /// Raw survey text (CSV, TSV or JSON).
    pub raw: String,
    /// Format hint: "csv", "tsv", "json" (default: "json"; JSON falls back to CSV).
    #[serde(default = "default_format")]
    pub format: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RecordsParams {
    /// JSON array of survey response objects.
    pub records: Vec<Value>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct NormalizeParams {
    /// JSON array of survey response objects.
    pub records: Vec<Value>,
    /// Keep only rows that have a branch.
    #[serde(default)]
    pub branch_only: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ImprovementParams {
    /// JSON array of survey response objects.
    pub records: Vec<Value>,
    /// Count score reasons that hint at an improvement (default: true).
    #[serde(default = "default_true")]
    pub scan_reasons: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MatrixParams {
    /// JSON array of survey response objects.
    pub records: Vec<Value>,
    /// Recommendation categories. If omitted, the configured default list is used.
    pub categories: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReportParams {
    /// JSON array of survey response objects.
    pub records: Vec<Value>,
    /// Count score reasons that hint at an improvement (default: true).
    #[serde(default = "default_true")]
    pub scan_reasons: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExtractParams {
    /// Raw model response text.
    pub text: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct InterpretParams {
    /// Kind: "comprehensive", "sentiment", "themes", "kpis".
    pub kind: String,
    /// Raw model response text.
    pub text: String,
    /// Verbatim comments used when the response is unusable.
    #[serde(default)]
    pub verbatims: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ColumnParams {
    /// Header names to normalize.
    pub headers: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CategorizeParams {
    /// Improvement phrases to categorize.
    pub texts: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RatingParams {
    /// Raw rating cells (numbers or strings).
    pub values: Vec<Value>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CategoriesParams {
    /// Path to a category list JSON file. If omitted, the default resolution applies.
    pub path: Option<String>,
}

fn default_format() -> String {
    "json".into()
}
fn default_true() -> bool {
    true
}

// ── Shared helpers ──────────────────────────────────────────────────────────

fn json_text(v: &Value) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}

/// Run a synchronous op off the async executor.
async fn run_blocking<F>(op: F) -> Result<CallToolResult, McpError>
where
    F: FnOnce() -> Result<Value, String> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| McpError::internal_error(format!("task join error: {e}"), None))?
        .map_err(|e| McpError::invalid_params(e, None))?;
    Ok(CallToolResult::success(vec![Content::text(json_text(
        &result,
    ))]))
}

// ── MCP Server ──────────────────────────────────────────────────────────────

/// The MCP server struct. Holds only the auto-generated tool router.
#[derive(Clone)]
pub struct SurveyMcp {
    #[allow(dead_code)] // accessed at runtime by the #[tool_router] macro
    tool_router: ToolRouter<Self>,
}

impl Default for SurveyMcp {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl SurveyMcp {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        name = "parse",
        description = "Parse raw survey text into JSON records. CSV handles quoted fields and tab delimiters; ragged rows are padded or truncated; cells become null, numbers, booleans, or strings. Invalid JSON is retried as CSV."
    )]
    async fn parse(&self, params: Parameters<ParseParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        run_blocking(move || ops::op_parse(&p.raw, &p.format)).await
    }

    #[tool(
        name = "normalize",
        description = "Rename survey columns to canonical names (Branch, AS, Reasons Of Score, ...) using an English/French synonym table. Unknown columns pass through unchanged."
    )]
    async fn normalize(
        &self,
        params: Parameters<NormalizeParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        run_blocking(move || Ok(ops::op_normalize(&p.records, p.branch_only))).await
    }

    #[tool(
        name = "rank",
        description = "Rank branches by average satisfaction over valid ratings. Each entry has responseCount, advocateScore, a representative comment, and valid rating counts."
    )]
    async fn rank(&self, params: Parameters<RecordsParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        run_blocking(move || ops::op_rank(&p.records)).await
    }

    #[tool(
        name = "improvements",
        description = "Histogram of improvement categories (Waiting Time, Staff Attitude, ...) with counts and percentages of all mentions, most frequent first."
    )]
    async fn improvements(
        &self,
        params: Parameters<ImprovementParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        run_blocking(move || ops::op_improvements(&p.records, p.scan_reasons)).await
    }

    #[tool(
        name = "reasons",
        description = "List score reasons with branch, score, YYYY-MM-DD date, and Yes/No callback flag."
    )]
    async fn reasons(&self, params: Parameters<RecordsParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        run_blocking(move || ops::op_reasons(&p.records)).await
    }

    #[tool(
        name = "branch_improvements",
        description = "Top three improvement categories per branch with the branch's average satisfaction."
    )]
    async fn branch_improvements(
        &self,
        params: Parameters<ImprovementParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        run_blocking(move || ops::op_branch_improvements(&p.records, p.scan_reasons)).await
    }

    #[tool(
        name = "matrix",
        description = "Branch × recommendation-category count matrix. Unmatched improvements go to Unclassified. `synthetic: true` marks placeholder values when no improvement data exists."
    )]
    async fn matrix(&self, params: Parameters<MatrixParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        run_blocking(move || ops::op_matrix(&p.records, p.categories.as_deref(), None)).await
    }

    #[tool(
        name = "nps",
        description = "Net Promoter Score from AS values (promoters 9-10, passives 7-8, detractors 0-6). Returns null when no valid score exists."
    )]
    async fn nps(&self, params: Parameters<RecordsParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        run_blocking(move || ops::op_nps(&p.records)).await
    }

    #[tool(
        name = "report",
        description = "Full branch analysis: normalized rows with a branch, rankings, improvement categories, reasons, branch improvements, recommendation matrix, and NPS."
    )]
    async fn report(&self, params: Parameters<ReportParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        run_blocking(move || ops::op_report(&p.records, None, p.scan_reasons)).await
    }

    #[tool(
        name = "extract",
        description = "Recover a JSON object from model output: direct parse, fenced block, balanced braces, key/quote repairs, then key: value pairs. Returns {value, stage} or null."
    )]
    async fn extract(&self, params: Parameters<ExtractParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        run_blocking(move || ops::op_extract(&p.text)).await
    }

    #[tool(
        name = "interpret",
        description = "Interpret a model response as comprehensive analysis, sentiment, themes, or KPIs. Falls back to deterministic heuristics over the verbatims and sets `degraded: true` when it does."
    )]
    async fn interpret(
        &self,
        params: Parameters<InterpretParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        run_blocking(move || ops::op_interpret(&p.kind, &p.text, &p.verbatims)).await
    }

    #[tool(
        name = "column",
        description = "Show the canonical column each header normalizes to."
    )]
    async fn column(&self, params: Parameters<ColumnParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        run_blocking(move || Ok(ops::op_column(&p.headers))).await
    }

    #[tool(
        name = "categorize",
        description = "Categorize improvement phrases by keyword. Unmatched phrases come back capitalized with `known: false`."
    )]
    async fn categorize(
        &self,
        params: Parameters<CategorizeParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        run_blocking(move || Ok(ops::op_categorize(&p.texts))).await
    }

    #[tool(
        name = "rating",
        description = "Coerce rating cells to numbers. Understands numeric strings and English/French labels (excellent, bien, moyen, ...); unparseable values are null."
    )]
    async fn rating(&self, params: Parameters<RatingParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        run_blocking(move || Ok(ops::op_rating(&p.values))).await
    }

    #[tool(
        name = "categories",
        description = "Return the recommendation category list in effect ($SURVEY_CATEGORIES, XDG data dir, or built-in default)."
    )]
    async fn categories(
        &self,
        params: Parameters<CategoriesParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        run_blocking(move || ops::op_categories(p.path.as_deref())).await
    }
}

// ── ServerHandler glue ──────────────────────────────────────────────────────

impl ServerHandler for SurveyMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Survey insights engine. Tools: parse, normalize, rank, improvements, \
                 reasons, branch_improvements, matrix, nps, report, extract, interpret, \
                 column, categorize, rating, categories. Pass survey rows as JSON \
                 records; raw column names are normalized automatically."
                    .into(),
            ),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: None }),
                ..Default::default()
            },
            server_info: Implementation {
                name: "survey".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: Some("Survey Insights".into()),
                description: Some(
                    "Survey normalization, branch aggregation, and model-response repair engine"
                        .into(),
                ),
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
pub async fn serve_stdio() -> Result<(), Box<dyn std::error::Error>> {
    let server = SurveyMcp::new();
    let transport = rmcp::transport::io::stdio();
    let service = server.serve(transport).await.inspect_err(|e| {
        tracing::error!(error = %e, "MCP serve error");
    })?;
    service.waiting().await?;
    Ok(())
}
