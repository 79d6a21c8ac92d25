//! MCP server on top of pmcp.
//!
//! pmcp handles JSON-RPC framing and both transports; this module only
//! registers the pipeline tools with it.

use crate::mcp::tools::ToolRegistry;
use crate::pipeline::ResearchPipeline;
use async_trait::async_trait;
use pmcp::{
    server::streamable_http_server::{StreamableHttpServer, StreamableHttpServerConfig},
    Error, RequestHandlerExtra, Server, ServerCapabilities, ToolHandler, ToolInfo,
};
use serde_json::Value;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// The MCP server exposing the research pipeline
///
/// Tools: `search_articles`, `summarize_article`, `format_academic` and
/// `assemble_document`, over stdio or streamable HTTP.
#[derive(Debug, Clone)]
pub struct McpServer {
    server: Arc<Mutex<Server>>,
}

impl McpServer {
    /// Create a new MCP server around the given pipeline
    ///
    /// `output_dir` is where `assemble_document` writes when the client does
    /// not pass an explicit path.
    pub fn new(pipeline: Arc<ResearchPipeline>, output_dir: PathBuf) -> Result<Self, pmcp::Error> {
        let tools = ToolRegistry::from_pipeline(pipeline, output_dir);
        let server = build_server(&tools)?;
        Ok(Self {
            server: Arc::new(Mutex::new(server)),
        })
    }

    /// Get the underlying pmcp server
    pub fn server(&self) -> Arc<Mutex<Server>> {
        self.server.clone()
    }

    /// Serve over stdin/stdout until the client disconnects
    ///
    /// Consumes the server: the stdio transport needs sole ownership.
    pub async fn run(self) -> Result<(), pmcp::Error> {
        tracing::info!("Starting MCP server in stdio mode");
        let server = Arc::try_unwrap(self.server)
            .map_err(|_| Error::internal("MCP server is still shared, cannot hand it to stdio"))?
            .into_inner();
        server.run_stdio().await
    }

    /// Serve streamable HTTP on `addr`, returning the bound address and server task
    pub async fn run_http(&self, addr: &str) -> Result<(SocketAddr, JoinHandle<()>), pmcp::Error> {
        let socket_addr = parse_addr(addr)?;
        tracing::info!(%socket_addr, "Starting MCP server in HTTP mode");
        StreamableHttpServer::new(socket_addr, self.server.clone())
            .start()
            .await
    }

    /// Like [`run_http`](Self::run_http) with explicit transport settings
    pub async fn run_http_with_config(
        &self,
        addr: &str,
        config: StreamableHttpServerConfig,
    ) -> Result<(SocketAddr, JoinHandle<()>), pmcp::Error> {
        let socket_addr = parse_addr(addr)?;
        tracing::info!(%socket_addr, "Starting MCP server in HTTP mode");
        StreamableHttpServer::with_config(socket_addr, self.server.clone(), config)
            .start()
            .await
    }
}

fn build_server(tools: &ToolRegistry) -> Result<Server, pmcp::Error> {
    tools
        .all()
        .into_iter()
        .map(|tool| ToolWrapper {
            name: tool.name.clone(),
            description: Some(tool.description.clone()),
            input_schema: tool.input_schema.clone(),
            handler: tool.handler.clone(),
        })
        .fold(
            Server::builder()
                .name("research-scribe")
                .version(env!("CARGO_PKG_VERSION"))
                .capabilities(ServerCapabilities::default()),
            |builder, wrapper| builder.tool(wrapper.name.clone(), wrapper),
        )
        .build()
}

fn parse_addr(addr: &str) -> Result<SocketAddr, pmcp::Error> {
    addr.parse()
        .map_err(|e| Error::invalid_params(format!("Invalid listen address '{}': {}", addr, e)))
}

/// Adapts a registry [`Tool`](crate::mcp::Tool) to pmcp's handler trait
#[derive(Clone)]
struct ToolWrapper {
    name: String,
    description: Option<String>,
    input_schema: Value,
    handler: Arc<dyn crate::mcp::tools::ToolHandler>,
}

#[async_trait]
impl ToolHandler for ToolWrapper {
    async fn handle(&self, args: Value, _extra: RequestHandlerExtra) -> Result<Value, Error> {
        self.handler
            .execute(args)
            .await
            .map_err(|e| Error::internal(&e))
    }

    fn metadata(&self) -> Option<ToolInfo> {
        Some(ToolInfo::new(
            self.name.clone(),
            self.description.clone(),
            self.input_schema.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Unconfigured;
    use crate::sources::MockSource;

    #[tokio::test]
    async fn test_server_builds_with_all_tools() {
        let pipeline = ResearchPipeline::builder(Arc::new(Unconfigured), Arc::new(MockSource::new()))
            .build()
            .unwrap();
        let server = McpServer::new(Arc::new(pipeline), PathBuf::from("documents"));
        assert!(server.is_ok());
    }

    #[test]
    fn test_parse_addr() {
        assert_eq!(parse_addr("127.0.0.1:3000").unwrap().port(), 3000);
        assert!(parse_addr("localhost").is_err());
    }

    #[tokio::test]
    async fn test_http_rejects_bad_address() {
        let pipeline = ResearchPipeline::builder(Arc::new(Unconfigured), Arc::new(MockSource::new()))
            .build()
            .unwrap();
        let server = McpServer::new(Arc::new(pipeline), PathBuf::from("documents")).unwrap();
        assert!(server.run_http("not-an-address").await.is_err());
    }
}
