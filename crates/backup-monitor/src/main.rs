//! Backup monitor - reports Velero backup completions and failures.

use std::path::PathBuf;

use anyhow::{Context, Result};
use backup_monitor::{BackupPoller, Config, KubeBackupSource};
use clap::Parser;
use notify::Notifier;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Watch Velero backups and send Slack/email notifications when they finish.
#[derive(Parser)]
#[command(name = "backup-monitor")]
#[command(version)]
struct Cli {
    /// Path of the YAML configuration file
    #[arg(long, default_value = "config/config.yaml", env = "BACKUP_MONITOR_CONFIG")]
    config: PathBuf,

    /// Path to a kubeconfig file (defaults to $KUBECONFIG, ~/.kube/config, then in-cluster)
    #[arg(long)]
    kubeconfig: Option<PathBuf>,

    /// Enable verbose output (overrides logging.verbose)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    let verbose = cli.verbose || config.logging.verbose;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new(format!(
                "{},backup_monitor=debug,notify=debug",
                config.logging.level
            ))
        } else {
            EnvFilter::new(&config.logging.level)
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    info!(
        "Starting backup monitor v{}",
        env!("CARGO_PKG_VERSION")
    );

    let source = KubeBackupSource::connect(&config.namespace, cli.kubeconfig.as_deref())
        .await
        .context("Unable to connect to the Kubernetes API server")?;
    info!(namespace = %config.namespace, "Connected to Kubernetes cluster");

    let http = reqwest::Client::builder()
        .timeout(config.delivery_timeout())
        .build()
        .context("Failed to build HTTP client")?;

    let notifier = Notifier::with_channels(config.notifications.channels(&http))
        .with_timeout(config.delivery_timeout());

    let mut poller = BackupPoller::new(source, notifier, config.interval()).verbose(verbose);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            cancel.cancel();
        }
    });

    poller.run(cancel).await;

    info!("Backup monitor stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        () = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
