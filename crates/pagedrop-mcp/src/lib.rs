//! Pagedrop MCP Server
//!
//! Model Context Protocol server that publishes HTML documents to object storage
//! and reports storage status, for AI assistants (Claude Desktop, Cursor, etc.)

pub mod server;
pub mod tools;

pub use pagedrop_storage::Publisher;
pub use server::PagedropService;

/// Initialize tracing on stderr; stdout carries the MCP transport.
///
/// `RUST_LOG` takes precedence over `default_level`.
pub fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level.to_lowercase())),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
