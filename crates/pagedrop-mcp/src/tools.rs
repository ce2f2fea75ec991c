//! MCP tool request types with JSON Schema for AI parameter generation

use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DeployHtmlRequest {
    #[schemars(description = "Full HTML document to publish")]
    pub html_content: String,
    #[schemars(
        description = "File name for the page; '.html' is appended when missing. A unique name is generated when omitted"
    )]
    pub filename: Option<String>,
    #[schemars(description = "Directory under the configured base path (default: root)")]
    pub remote_path: Option<String>,
}
