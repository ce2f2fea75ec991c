//! MCP server using rmcp SDK
//!
//! Exposes HTML deployment and status checks as MCP tools over stdio.

use crate::tools::*;
use pagedrop_storage::Publisher;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::tool::Parameters;
use rmcp::model::*;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use serde_json::{json, Value};
use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

const HTML_SUFFIX: &str = ".html";

fn text_content(s: impl Into<String>) -> Content {
    Content {
        raw: RawContent::Text(RawTextContent { text: s.into() }),
        annotations: None,
    }
}

fn to_text(value: &Value) -> Result<String, ErrorData> {
    serde_json::to_string(value).map_err(|e| ErrorData {
        code: ErrorCode(-32603),
        message: Cow::from(e.to_string()),
        data: None,
    })
}

/// Pick the object file name: a generated one when none is given, and always with
/// an `.html` suffix.
pub fn normalize_filename(filename: Option<&str>) -> String {
    match filename.map(str::trim).filter(|f| !f.is_empty()) {
        Some(name) if name.to_lowercase().ends_with(HTML_SUFFIX) => name.to_string(),
        Some(name) => format!("{}{}", name, HTML_SUFFIX),
        None => format!("page-{}{}", Uuid::new_v4().simple(), HTML_SUFFIX),
    }
}

#[derive(Clone)]
pub struct PagedropService {
    publisher: Arc<Publisher>,
    tool_router: ToolRouter<PagedropService>,
}

#[tool_router]
impl PagedropService {
    pub fn new(publisher: Publisher) -> Self {
        Self {
            publisher: Arc::new(publisher),
            tool_router: Self::tool_router(),
        }
    }

    /// Deploy and build the result envelope; `Err` carries the failure envelope.
    pub async fn run_deploy(&self, req: DeployHtmlRequest) -> Result<Value, Value> {
        let filename = normalize_filename(req.filename.as_deref());
        let remote_path = req.remote_path.unwrap_or_default();
        tracing::info!(filename = %filename, remote_path = %remote_path, "Deploying HTML");

        match self
            .publisher
            .deploy_html(&req.html_content, &remote_path, &filename)
            .await
        {
            Ok(result) => Ok(json!({
                "success": true,
                "message": "HTML deployed successfully",
                "filename": filename,
                "remote_path": remote_path,
                "url": result.url,
                "size_bytes": result.byte_size,
            })),
            Err(e) => {
                tracing::error!(error = %e, filename = %filename, "HTML deployment failed");
                Err(json!({
                    "success": false,
                    "error": format!("HTML deployment failed: {}", e),
                    "filename": filename,
                }))
            }
        }
    }

    pub async fn run_status(&self) -> Value {
        let connected = self.publisher.check_connection().await;
        let endpoint = self.publisher.endpoint();
        json!({
            "success": true,
            "server_status": "running",
            "storage_connection": if connected { "ok" } else { "failed" },
            "provider": endpoint.provider().as_str(),
            "bucket": endpoint.bucket(),
            "endpoint": endpoint.endpoint(),
            "base_path": self.publisher.base_path(),
        })
    }

    #[tool(
        description = "Deploy an HTML document to object storage and return its public URL"
    )]
    async fn deploy_html(
        &self,
        Parameters(req): Parameters<DeployHtmlRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        match self.run_deploy(req).await {
            Ok(body) => Ok(CallToolResult::success(vec![text_content(to_text(&body)?)])),
            Err(body) => Ok(CallToolResult::error(vec![text_content(to_text(&body)?)])),
        }
    }

    #[tool(description = "Check server status and the storage connection")]
    async fn check_status(&self) -> Result<CallToolResult, ErrorData> {
        let body = self.run_status().await;
        Ok(CallToolResult::success(vec![text_content(to_text(&body)?)]))
    }
}

#[tool_handler]
impl ServerHandler for PagedropService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "pagedrop-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
            },
            instructions: Some(
                "Pagedrop MCP: deploy_html publishes an HTML page to object storage and returns \
                 its URL; check_status reports the storage connection."
                    .to_string(),
            ),
        }
    }
}
