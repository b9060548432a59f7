//! Sample Service Entry Point

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use sample_service::SampleService;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Sample Service - OpenAPI demo target for the playground
#[derive(Parser, Debug)]
#[command(name = "sample-service")]
#[command(version, about, long_about = None)]
struct ServiceConfig {
    /// Host address to bind to
    #[arg(long, env = "SAMPLE_SERVICE_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "SAMPLE_SERVICE_PORT", default_value_t = 8080)]
    port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SAMPLE_SERVICE_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("sample_service={},tower_http={}", log_level, log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::parse();
    init_tracing(&config.log_level);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid socket address {}:{}", config.host, config.port))?;

    tracing::info!("Sample Service v{}", sample_service::VERSION);
    tracing::info!(%addr, "Open the playground with: playground --api-root http://{}", addr);

    SampleService::new(addr).run().await?;
    Ok(())
}
