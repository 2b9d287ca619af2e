mod cache;
mod config;
mod error;
mod prompt;
mod server;

use std::sync::Arc;

use rmcp::{ServiceExt, transport::stdio};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cache::AdviceCache;
use config::Config;
use oyster_common::advisor::{AdvisorClient, AdvisorConfig};
use oyster_common::redis::RedisCache;
use server::EcoOysterServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries MCP JSON-RPC, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting ecooyster MCP server");

    let config = Config::from_env()?;
    info!(
        output_dir = %config.output_dir.display(),
        redis = config.redis_url.is_some(),
        "configuration loaded"
    );

    let advisor_config = AdvisorConfig::from_env();
    if advisor_config.api_key.is_none() {
        info!("no advisor API key set, advisory requests will be sent unauthenticated");
    }
    info!(
        base_url = %advisor_config.base_url,
        model = %advisor_config.model,
        "advisor configured"
    );
    let advisor = Arc::new(AdvisorClient::new(advisor_config)?);

    // Redis is optional; without it every advisory request goes to the model
    let redis_cache = RedisCache::new(config.redis_url.as_deref());
    if redis_cache.is_available().await {
        info!("redis connected");
    } else {
        info!("redis unavailable, running without cache");
    }
    let cache = Arc::new(AdviceCache::new(redis_cache));

    let server = EcoOysterServer::new(advisor, cache, &config);

    info!("MCP server ready, serving on stdio");
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!(error = %e, "MCP server error");
    })?;

    service.waiting().await?;
    info!("MCP server shut down");
    Ok(())
}
