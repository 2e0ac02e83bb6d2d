use anyhow::{Context, Result};
use clap::Parser;
use warden_cli::{init_logging, run_cli, App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_logging(&config.log_level, config.json_logs)?;

    tracing::info!(
        policy = %config.permissions_file.display(),
        watch = config.watch,
        "starting warden"
    );

    let app = App::from_config(&config).context("failed to start warden")?;
    run_cli(app).await?;
    Ok(())
}
