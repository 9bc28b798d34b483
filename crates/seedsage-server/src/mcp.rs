//! MCP (Model Context Protocol) server implementation.
//!
//! The caller boundary: tools for asking questions, inserting seed packs,
//! browsing the collection and inspecting the catalog. All rendering and
//! session state belong to the connected client; each tool call is one
//! self-contained interaction.

use async_trait::async_trait;
use rust_mcp_schema::{
    schema_utils::CallToolError, CallToolRequest, CallToolResult, ContentBlock, Implementation,
    InitializeResult, ListToolsRequest, ListToolsResult, RpcError, ServerCapabilities,
    ServerCapabilitiesTools, TextContent, Tool, ToolInputSchema, LATEST_PROTOCOL_VERSION,
};
use rust_mcp_sdk::{mcp_server::ServerHandler, McpServer};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

use seedsage_store::{NewSeedPack, SeedFilter};

use crate::ask::{wants_general_advice, Assistant};

/// Seed Sage MCP server handler.
pub struct SeedSageHandler {
    assistant: Arc<Assistant>,
}

impl SeedSageHandler {
    pub fn new(assistant: Assistant) -> Self {
        Self {
            assistant: Arc::new(assistant),
        }
    }

    /// Create server initialization details
    pub fn server_info() -> InitializeResult {
        InitializeResult {
            protocol_version: LATEST_PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ServerCapabilitiesTools { list_changed: None }),
                ..Default::default()
            },
            server_info: Implementation {
                name: "seedsage-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("Seed Sage gardening inventory assistant".to_string()),
            },
            instructions: Some(
                "Seed Sage - personal seed library with natural-language queries. \
                 Use 'ask' for questions about the collection, 'add_seed' to record \
                 a new pack, 'list_seeds' to browse and 'companion' for planting advice."
                    .to_string(),
            ),
            meta: None,
        }
    }

    fn string_prop(description: &str) -> Map<String, Value> {
        let mut prop = Map::new();
        prop.insert("type".to_string(), Value::String("string".to_string()));
        prop.insert(
            "description".to_string(),
            Value::String(description.to_string()),
        );
        prop
    }

    /// Define available MCP tools
    fn tools() -> Vec<Tool> {
        let mut tools = Vec::new();

        {
            let mut properties = HashMap::new();
            properties.insert(
                "question".to_string(),
                Self::string_prop(
                    "Natural language question about the seed collection \
                     (e.g., 'how many seeds do I have?' or 'show me all herbs')",
                ),
            );

            tools.push(Tool {
                name: "ask".to_string(),
                description: Some(
                    "Ask a natural language question about the seed collection. \
                     The question is translated into a validated read-only SQL query, \
                     executed against the seed database, and the results are narrated \
                     with gardening advice when a model is configured."
                        .to_string(),
                ),
                input_schema: ToolInputSchema::new(vec!["question".to_string()], Some(properties)),
                title: None,
                annotations: None,
                meta: None,
                output_schema: None,
            });
        }

        {
            let mut properties = HashMap::new();
            properties.insert(
                "seed_name".to_string(),
                Self::string_prop("Seed name (e.g., 'Cherokee Purple Tomato')"),
            );
            properties.insert(
                "variety".to_string(),
                Self::string_prop("Variety; defaults to 'unknown' when omitted"),
            );
            properties.insert(
                "quantity".to_string(),
                Self::string_prop("One of: Very Few, Few, Medium, Lots, Bulk"),
            );
            properties.insert(
                "plant_type".to_string(),
                Self::string_prop(
                    "One of: Vegetable, Herb, Flower, Fruit, Trees & Shrubs, Other",
                ),
            );
            properties.insert(
                "seed_source".to_string(),
                Self::string_prop("Where the seeds came from; defaults to 'unknown'"),
            );
            properties.insert(
                "date_acquired".to_string(),
                Self::string_prop("Acquisition date (YYYY-MM-DD); defaults to today"),
            );

            tools.push(Tool {
                name: "add_seed".to_string(),
                description: Some(
                    "Record a new seed pack in the collection. The pack id is assigned \
                     by the store."
                        .to_string(),
                ),
                input_schema: ToolInputSchema::new(
                    vec![
                        "seed_name".to_string(),
                        "quantity".to_string(),
                        "plant_type".to_string(),
                    ],
                    Some(properties),
                ),
                title: None,
                annotations: None,
                meta: None,
                output_schema: None,
            });
        }

        {
            let mut properties = HashMap::new();
            properties.insert(
                "plant_type".to_string(),
                Self::string_prop("Filter by plant type"),
            );
            properties.insert(
                "quantity".to_string(),
                Self::string_prop("Filter by quantity bucket"),
            );
            properties.insert(
                "seed_source".to_string(),
                Self::string_prop("Filter by seed source"),
            );

            tools.push(Tool {
                name: "list_seeds".to_string(),
                description: Some(
                    "Browse the seed collection, newest acquisitions first, with \
                     optional plant type, quantity and source filters."
                        .to_string(),
                ),
                input_schema: ToolInputSchema::new(vec![], Some(properties)),
                title: None,
                annotations: None,
                meta: None,
                output_schema: None,
            });
        }

        {
            tools.push(Tool {
                name: "catalog".to_string(),
                description: Some(
                    "Get the seed database schema: columns, constrained values, \
                     record count and sample rows."
                        .to_string(),
                ),
                input_schema: ToolInputSchema::new(vec![], Some(HashMap::new())),
                title: None,
                annotations: None,
                meta: None,
                output_schema: None,
            });
        }

        {
            let mut properties = HashMap::new();
            properties.insert(
                "plant".to_string(),
                Self::string_prop("Plant to analyze (e.g., 'Basil')"),
            );

            tools.push(Tool {
                name: "companion".to_string(),
                description: Some(
                    "Generate a companion-planting guide for one plant, using the \
                     collection as context. Requires a configured generative model."
                        .to_string(),
                ),
                input_schema: ToolInputSchema::new(vec!["plant".to_string()], Some(properties)),
                title: None,
                annotations: None,
                meta: None,
                output_schema: None,
            });
        }

        tools
    }
}

#[async_trait]
impl ServerHandler for SeedSageHandler {
    async fn handle_list_tools_request(
        &self,
        _request: ListToolsRequest,
        _runtime: Arc<dyn McpServer>,
    ) -> std::result::Result<ListToolsResult, RpcError> {
        info!("Listing available tools");

        Ok(ListToolsResult {
            tools: Self::tools(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn handle_call_tool_request(
        &self,
        request: CallToolRequest,
        _runtime: Arc<dyn McpServer>,
    ) -> std::result::Result<CallToolResult, CallToolError> {
        info!("Tool called: {}", request.params.name);
        let args = request
            .params
            .arguments
            .map(|m| serde_json::Value::Object(m));

        match request.params.name.as_str() {
            "ask" => self.handle_ask(args).await,
            "add_seed" => self.handle_add_seed(args).await,
            "list_seeds" => self.handle_list_seeds(args).await,
            "catalog" => self.handle_catalog().await,
            "companion" => self.handle_companion(args).await,
            _ => Err(CallToolError::unknown_tool(request.params.name.clone())),
        }
    }
}

fn text_result(text: String) -> CallToolResult {
    CallToolResult {
        content: vec![ContentBlock::TextContent(TextContent::new(text, None, None))],
        is_error: None,
        meta: None,
        structured_content: None,
    }
}

fn required_str<'a>(
    args: &'a Option<serde_json::Value>,
    name: &str,
) -> std::result::Result<&'a str, CallToolError> {
    args.as_ref()
        .and_then(|a| a.get(name))
        .and_then(|v| v.as_str())
        .ok_or_else(|| CallToolError::from_message(format!("Missing required argument: {name}")))
}

fn optional_str(args: &Option<serde_json::Value>, name: &str) -> Option<String> {
    args.as_ref()
        .and_then(|a| a.get(name))
        .and_then(|v| v.as_str())
        .map(String::from)
}

impl SeedSageHandler {
    async fn handle_ask(
        &self,
        args: Option<serde_json::Value>,
    ) -> std::result::Result<CallToolResult, CallToolError> {
        let question = required_str(&args, "question")?.to_string();
        info!("Question received: {}", question);

        // General-knowledge questions skip the query path entirely.
        if wants_general_advice(&question) && self.assistant.has_narrator() {
            let advice = self.assistant.advise(&question).await.map_err(|e| {
                error!("Advice generation failed: {}", e);
                CallToolError::from_message(e.to_string())
            })?;
            return Ok(text_result(format!("Growing Advice\n\n{advice}")));
        }

        let answer = self.assistant.answer(&question).await.map_err(|e| {
            error!("Question cycle failed: {}", e);
            CallToolError::from_message(e.to_string())
        })?;

        let mut response = format!(
            "Question: {}\n\nGenerated SQL ({:?}):\n{}\n\nResults:\n{}",
            question,
            answer.origin,
            answer.sql,
            serde_json::to_string_pretty(&answer.results).unwrap_or_default(),
        );
        if let Some(narrative) = answer.narrative {
            response.push_str("\n\nInsights:\n");
            response.push_str(&narrative);
        }

        Ok(text_result(response))
    }

    async fn handle_add_seed(
        &self,
        args: Option<serde_json::Value>,
    ) -> std::result::Result<CallToolResult, CallToolError> {
        let seed_name = required_str(&args, "seed_name")?.to_string();
        let quantity = required_str(&args, "quantity")?
            .parse()
            .map_err(|e| CallToolError::from_message(format!("{e}")))?;
        let plant_type = required_str(&args, "plant_type")?
            .parse()
            .map_err(|e| CallToolError::from_message(format!("{e}")))?;

        let date_acquired = match optional_str(&args, "date_acquired") {
            Some(raw) => Some(
                chrono::NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                    CallToolError::from_message(format!("Invalid date (expected YYYY-MM-DD): {raw}"))
                })?,
            ),
            None => None,
        };

        let pack = NewSeedPack {
            seed_name: seed_name.clone(),
            variety: optional_str(&args, "variety"),
            quantity,
            plant_type,
            seed_source: optional_str(&args, "seed_source"),
            date_acquired,
        };

        let id = self.assistant.store().insert(&pack).map_err(|e| {
            error!("Insert failed: {}", e);
            CallToolError::from_message(e.to_string())
        })?;

        Ok(text_result(format!(
            "Added {seed_name} (pack id {id}) to your collection."
        )))
    }

    async fn handle_list_seeds(
        &self,
        args: Option<serde_json::Value>,
    ) -> std::result::Result<CallToolResult, CallToolError> {
        let mut filter = SeedFilter::default();
        if let Some(raw) = optional_str(&args, "plant_type") {
            filter.plant_type =
                Some(raw.parse().map_err(|e| CallToolError::from_message(format!("{e}")))?);
        }
        if let Some(raw) = optional_str(&args, "quantity") {
            filter.quantity =
                Some(raw.parse().map_err(|e| CallToolError::from_message(format!("{e}")))?);
        }
        filter.seed_source = optional_str(&args, "seed_source");

        let packs = self.assistant.store().list(&filter).map_err(|e| {
            error!("Listing failed: {}", e);
            CallToolError::from_message(e.to_string())
        })?;

        let body = serde_json::to_string_pretty(&packs)
            .map_err(|e| CallToolError::from_message(e.to_string()))?;
        Ok(text_result(format!(
            "Total seed packs: {}\n\n{}",
            packs.len(),
            body
        )))
    }

    async fn handle_catalog(&self) -> std::result::Result<CallToolResult, CallToolError> {
        let context = self.assistant.store().describe().map_err(|e| {
            error!("Catalog extraction failed: {}", e);
            CallToolError::from_message(e.to_string())
        })?;

        Ok(text_result(context.to_prompt_block()))
    }

    async fn handle_companion(
        &self,
        args: Option<serde_json::Value>,
    ) -> std::result::Result<CallToolResult, CallToolError> {
        let plant = required_str(&args, "plant")?.to_string();

        let guide = self.assistant.companion_guide(&plant).await.map_err(|e| {
            error!("Companion analysis failed: {}", e);
            CallToolError::from_message(e.to_string())
        })?;

        Ok(text_result(guide))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tools_cover_every_interaction() {
        let names: Vec<String> = SeedSageHandler::tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["ask", "add_seed", "list_seeds", "catalog", "companion"]);
    }

    #[test]
    fn server_info_names_the_assistant() {
        let info = SeedSageHandler::server_info();
        assert_eq!(info.server_info.name, "seedsage-server");
    }
}
