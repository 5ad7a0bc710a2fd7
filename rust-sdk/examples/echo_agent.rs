//! Minimal agent: echoes each query back and reports its marketplace stats
//! on startup.
//!
//! ```text
//! MT_API_KEY=... MT_AGENT_ID=echo MT_WEBHOOK_SECRET=... cargo run --example echo_agent
//! ```

use agent_sdk::{logging, AgentServer, Config, MarketplaceClient, Metadata, Query, QueryResult};
use serde_json::json;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = logging::init();

    let config = Config::from_env();
    info!(?config, "config_loaded");

    let client = MarketplaceClient::new(&config)?;
    match client.agent_stats(&config.agent_id).await {
        Ok(stats) => info!(
            total_queries = stats.total_queries,
            success_rate = stats.success_rate(),
            "agent_stats_loaded"
        ),
        Err(e) => warn!(error = %e, "agent_stats_unavailable"),
    }

    let mut server = AgentServer::new(config);
    server.on_query(|query: Query| async move {
        let mut metadata = Metadata::new();
        metadata.insert("capabilities".into(), json!(query.capabilities));

        Ok::<_, anyhow::Error>(
            QueryResult::new(format!("echo: {}", query.text)).with_metadata(metadata),
        )
    });

    server.start().await
}
