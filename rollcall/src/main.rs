use clap::Parser;
use ingest::overflow::FilesystemFailureStore;
use metrics_exporter_statsd::StatsdBuilder;
use sheets::{SheetsClient, StaticTokenProvider};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;

use config::Config;

/// Environment variable holding the spreadsheet API bearer token. Minting
/// and refreshing the token is the deployment's job.
const TOKEN_ENV_VAR: &str = "SHEETS_ACCESS_TOKEN";

#[derive(Parser)]
#[command(
    name = "rollcall",
    about = "Receives end-of-call report webhooks and records them in a spreadsheet"
)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::from_file(&cli.config)?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Sentry wants to exist before the async runtime starts.
    let _sentry_guard = config
        .common
        .logging
        .as_ref()
        .and_then(|logging| logging.sentry_dsn.as_deref())
        .map(|dsn| {
            sentry::init((
                dsn,
                sentry::ClientOptions {
                    release: sentry::release_name!(),
                    ..Default::default()
                },
            ))
        });

    if let Some(metrics_config) = &config.common.metrics {
        let recorder = StatsdBuilder::from(
            metrics_config.statsd_host.clone(),
            metrics_config.statsd_port,
        )
        .build(Some("rollcall"))?;
        metrics::set_global_recorder(recorder)
            .map_err(|e| format!("failed to install metrics recorder: {e}"))?;
    }
    for def in ingest::metrics_defs::ALL_METRICS {
        tracing::debug!(
            name = def.name,
            r#type = def.metric_type.as_str(),
            "metric registered"
        );
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(config))
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let tokens = Arc::new(StaticTokenProvider::from_env(TOKEN_ENV_VAR)?);
    let appender = Arc::new(SheetsClient::new(config.sheets, tokens)?);
    let overflow = Arc::new(FilesystemFailureStore::new(
        config.ingest.overflow_path.clone(),
    ));

    tracing::info!(
        host = %config.ingest.listener.host,
        port = config.ingest.listener.port,
        "starting webhook listener"
    );
    ingest::run(config.ingest, appender, overflow).await?;
    Ok(())
}
