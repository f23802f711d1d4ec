//! The MCP server handler: routes `tools/list` and `tools/call` to the five
//! tool modules under [`crate::tools`].

use std::sync::Arc;

use librovore_core::registry::{ProcessorContext, ProcessorRegistry};
use rmcp::ErrorData;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{RoleServer, ServerHandler};
use serde_json::{Map, Value, json};

use crate::error::to_tool_error_json;

/// MCP server for librovore.
#[derive(Clone)]
pub struct LibrovoreMcpServer {
    registry: Arc<ProcessorRegistry>,
    ctx: Arc<ProcessorContext>,
}

impl LibrovoreMcpServer {
    /// Builds a server from an already-constructed registry and context.
    #[must_use]
    pub fn new(registry: ProcessorRegistry, ctx: ProcessorContext) -> Self {
        Self {
            registry: Arc::new(registry),
            ctx: Arc::new(ctx),
        }
    }

    fn tool_definitions() -> Vec<Tool> {
        vec![
            tool_from_schema(
                "detect",
                "Detect which documentation processors recognize a source.",
                schemars::schema_for!(crate::tools::detect::DetectParams),
            ),
            tool_from_schema(
                "query-inventory",
                "Search a documentation source's object inventory by name.",
                schemars::schema_for!(crate::tools::query_inventory::QueryInventoryParams),
            ),
            tool_from_schema(
                "query-content",
                "Search a documentation source's object inventory and fetch matching pages' content.",
                schemars::schema_for!(crate::tools::query_content::QueryContentParams),
            ),
            tool_from_schema(
                "summarize-inventory",
                "Produce a human-readable summary of a documentation source's inventory.",
                schemars::schema_for!(crate::tools::summarize_inventory::SummarizeInventoryParams),
            ),
            tool_from_schema(
                "survey-processors",
                "List the registered inventory and structure processors and their capabilities.",
                schemars::schema_for!(crate::tools::survey_processors::SurveyProcessorsParams),
            ),
        ]
    }

    async fn dispatch(&self, name: &str, arguments: Value) -> Result<Value, crate::error::McpError> {
        match name {
            "detect" => crate::tools::detect::handle(&self.registry, &self.ctx, arguments).await,
            "query-inventory" => {
                crate::tools::query_inventory::handle(&self.registry, &self.ctx, arguments).await
            },
            "query-content" => {
                crate::tools::query_content::handle(&self.registry, &self.ctx, arguments).await
            },
            "summarize-inventory" => {
                crate::tools::summarize_inventory::handle(&self.registry, &self.ctx, arguments).await
            },
            "survey-processors" => crate::tools::survey_processors::handle(&self.registry, arguments),
            other => Err(crate::error::McpError::Transport(format!(
                "unknown tool: {other}"
            ))),
        }
    }
}

/// Converts a `schemars` schema into an `rmcp` tool definition. `rmcp`
/// expects the input schema as a bare JSON object map, not the wrapped
/// `RootSchema` schemars produces.
fn tool_from_schema(name: &str, description: &str, schema: schemars::schema::RootSchema) -> Tool {
    let schema_value = serde_json::to_value(schema).unwrap_or_else(|_| json!({}));
    let schema_map = match schema_value {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    Tool {
        name: name.to_string().into(),
        title: None,
        description: Some(description.to_string().into()),
        input_schema: Arc::new(schema_map),
        output_schema: None,
        annotations: None,
        icons: None,
    }
}

impl ServerHandler for LibrovoreMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "librovore-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Detects documentation site formats and searches their object inventories \
                 and page content. See the detect, query-inventory, query-content, \
                 summarize-inventory, and survey-processors tools."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: Self::tool_definitions(),
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let arguments = request
            .arguments
            .map_or(Value::Object(Map::new()), Value::Object);
        match self.dispatch(&request.name, arguments).await {
            Ok(value) => {
                let text = match value {
                    Value::String(text) => text,
                    other => serde_json::to_string_pretty(&other).unwrap_or_default(),
                };
                Ok(CallToolResult::success(vec![Content::text(text)]))
            },
            Err(err) => {
                let body = to_tool_error_json(&err).to_string();
                Ok(CallToolResult::error(vec![Content::text(body)]))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use librovore_core::Config;

    #[test]
    fn tool_definitions_cover_all_five_operations() {
        let names: Vec<String> = LibrovoreMcpServer::tool_definitions()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "detect",
                "query-inventory",
                "query-content",
                "summarize-inventory",
                "survey-processors",
            ]
        );
    }

    #[test]
    fn server_info_reports_tool_capability() {
        let config = Config::default();
        let registry = ProcessorRegistry::with_builtins(&config);
        let ctx = ProcessorContext::new(&config);
        let server = LibrovoreMcpServer::new(registry, ctx);
        let info = server.get_info();
        assert_eq!(info.server_info.name, "librovore-mcp");
        assert!(info.capabilities.tools.is_some());
    }
}
