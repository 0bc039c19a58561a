//! article_crew - HTTP Server Entry Point
//!
//! Starts the HTTP server that exposes the article generation API.

use article_crew::{api, config::Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "article_crew=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Loaded configuration: provider={}, stages={}",
        config.provider,
        config
            .stages
            .iter()
            .map(|s| s.name())
            .collect::<Vec<_>>()
            .join(",")
    );

    api::serve(config).await?;

    Ok(())
}
