//! Seed Sage MCP server.
//!
//! Personal seed library with a natural-language query layer: questions are
//! translated to read-only SQL (OpenAI when configured, ordered pattern
//! rules otherwise), validated against the table allow-list and executed
//! against DuckDB.

use rust_mcp_sdk::mcp_server::{hyper_server, HyperServerOptions};
use tracing::info;

use seedsage_core::{AllowList, RuleTable, Synthesizer};
use seedsage_store::SeedStore;

mod ask;
mod config;
mod llm;
mod logging;
mod mcp;

use config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::load_or_default("config.yaml");
    config.apply_logging_env();
    logging::init();

    // Open the record store and make sure the table exists.
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let store = SeedStore::open(&config.database.path);
    store.init()?;
    info!("Record store ready at {}", config.database.path);

    // The generative backend is optional: without a key the pattern table
    // still answers the anticipated question shapes.
    let mut synthesizer = Synthesizer::new(RuleTable::builtin());
    let narrator = match Config::openai_api_key() {
        Ok(api_key) => {
            let openai_config = async_openai::config::OpenAIConfig::new().with_api_key(api_key);
            let client = async_openai::Client::with_config(openai_config);
            synthesizer = synthesizer.with_generator(Box::new(llm::OpenAiSqlGenerator::new(
                client.clone(),
                config.model.name.clone(),
            )));
            info!("Generative synthesis enabled (model: {})", config.model.name);
            Some(llm::Narrator::new(client, config.model.name.clone()))
        }
        Err(_) => {
            info!("OPENAI_API_KEY not set; using the pattern table only");
            None
        }
    };

    let assistant = ask::Assistant::new(store, synthesizer, AllowList::seed_packs(), narrator);
    let handler = mcp::SeedSageHandler::new(assistant);
    let server_info = mcp::SeedSageHandler::server_info();

    info!(
        "Starting Seed Sage MCP server on {}:{}",
        config.server.host, config.server.port
    );

    let server = hyper_server::create_server(
        server_info,
        handler,
        HyperServerOptions {
            host: config.server.host.clone(),
            port: config.server.port,
            sse_support: true,
            ..Default::default()
        },
    );

    server.start().await?;

    Ok(())
}
