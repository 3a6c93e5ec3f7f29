use agentbook_core::{scrape, ScrapeConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agentbook_cli=info,agentbook_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "sites.json".into());
    let out_path: PathBuf = std::env::var("AGENTBOOK_OUT")
        .unwrap_or_else(|_| "data/agents.json".into())
        .into();

    let config = ScrapeConfig::load(&config_path)?;
    let records = scrape::run(&config, &out_path).await?;
    tracing::info!(total = records.len(), "run complete");
    Ok(())
}
