mod cli;
mod config;
mod inventory;
mod logs;
mod models;
mod prompt;
mod push;
mod session;
mod transport;
mod utils;

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;
use config::Config;
use logs::LogWriter;
use prompt::Chooser;
use push::PushService;
use session::Outcome;
use transport::SshTransport;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Optional .env next to the inventory (SSH_USER, SSH_PASS, ...)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forge_push=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut cfg = Config::load();
    cli.apply(&mut cfg);
    tracing::debug!("Inventory: {}", cfg.inventory_path);
    tracing::debug!("Commands: {}", cfg.commands_path);
    tracing::debug!("Log dir: {}", cfg.log_dir);

    let devices = inventory::load_hosts(&cfg.inventory_path).await?;
    let batch = inventory::load_commands(&cfg.commands_path).await?;
    tracing::info!(
        "Loaded {} devices and {} config lines",
        devices.len(),
        batch.len()
    );

    let service = PushService::new(
        Arc::new(SshTransport::new(cfg.ssh_settings())),
        LogWriter::new(&cfg.log_dir),
        cli.push_options(&cfg),
    );

    let stdin = std::io::stdin();
    let mut chooser = Chooser::new(stdin.lock(), std::io::stdout());
    let outcome = session::run(&mut chooser, &devices, batch, &service, &cli.session_options()).await?;

    if let Outcome::Completed { timestamp, results, summary } = &outcome {
        for result in results {
            for path in &result.log_files {
                tracing::debug!("{}: {}", result.device_name, path.display());
            }
        }
        tracing::info!("Run {} finished: {}", timestamp, summary);
    }

    Ok(outcome.exit_code())
}
