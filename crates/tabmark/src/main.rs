mod commands;
mod config;

use std::future::Future;
use std::sync::Arc;

use clap::Parser;
use tabmark_core::IdGenerator;
use tabmark_storage_drive::{DriveAuth, DriveClient, DriveRemoteStore, StaticTokenSource};
use tabmark_storage_local::LocalStore;
use tabmark_sync::{SyncCoordinator, SyncEvent};
use tokio::signal;
use tokio::sync::{broadcast, watch};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{Command, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the listing.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();

    let dir = config.effective_data_dir();
    info!("Starting tabmark");
    info!("  Data dir: {}", dir.display());
    match config.quota() {
        Some(quota) => info!("  Quota: {} bytes", quota),
        None => info!("  Quota: unlimited"),
    }

    let local = Arc::new(LocalStore::open(&dir).with_quota(config.quota()));

    let drive_config = config.drive_config();
    info!("  Drive API: {}", drive_config.api_base);
    let client = DriveClient::new(drive_config);
    let auth = Arc::new(DriveAuth::new(
        client.clone(),
        local.clone(),
        Arc::new(StaticTokenSource::new(
            config.access_token.clone(),
            config.expires_in,
        )),
    ));
    let remote = Arc::new(DriveRemoteStore::new(client, auth.clone()));

    let coordinator = SyncCoordinator::new(local, remote, auth);
    let mut events = coordinator.subscribe();

    let mut shutdown_rx = create_shutdown_signal();
    let outcome = until_shutdown(run(&coordinator, &config.command), &mut shutdown_rx).await;

    coordinator.flush().await;
    report(&mut events);

    outcome
}

async fn run(coordinator: &SyncCoordinator, command: &Command) -> anyhow::Result<()> {
    let doc = coordinator.initialize().await;
    info!("Sync state: {}", coordinator.state());

    match command {
        Command::Show => {
            print!("{}", commands::render(&doc));
        }
        Command::SignIn => {
            if !coordinator.sign_in().await {
                anyhow::bail!("sign-in failed");
            }
            print!("{}", commands::render(&coordinator.document()));
        }
        Command::SignOut => {
            coordinator.sign_out().await;
        }
        edit => {
            let ids = IdGenerator::new();
            if let Some(edited) = commands::apply(edit, &doc, &ids) {
                let edited = edited?;
                coordinator.on_document_changed(edited.clone())?;
                print!("{}", commands::render(&edited));
            }
        }
    }
    Ok(())
}

/// Drive `work` to completion unless a shutdown signal arrives first, in which
/// case the run counts as failed.
async fn until_shutdown<F>(work: F, shutdown: &mut watch::Receiver<bool>) -> anyhow::Result<()>
where
    F: Future<Output = anyhow::Result<()>>,
{
    tokio::select! {
        outcome = work => outcome,
        Ok(_) = shutdown.wait_for(|&v| v) => {
            info!("Interrupted, waiting for pending pushes");
            Err(anyhow::anyhow!("interrupted before the command finished"))
        }
    }
}

/// Print the notifications raised during this run.
fn report(events: &mut broadcast::Receiver<SyncEvent>) {
    loop {
        match events.try_recv() {
            Ok(SyncEvent::StateChanged(_)) => {}
            Ok(event) if event.is_failure() => eprintln!("! {}", event.message()),
            Ok(event) => eprintln!("{}", event.message()),
            Err(broadcast::error::TryRecvError::Lagged(n)) => {
                warn!("Missed {} sync notifications", n);
            }
            Err(_) => break,
        }
    }
}

/// Create a shutdown signal that triggers on Ctrl+C or SIGTERM.
fn create_shutdown_signal() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        let ctrl_c = async {
            match signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C, initiating shutdown"),
                Err(e) => {
                    warn!("Failed to install Ctrl+C handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                    info!("Received SIGTERM, initiating shutdown");
                }
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }

        let _ = tx.send(true);
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completed_run_keeps_its_outcome() {
        let (_tx, mut rx) = watch::channel(false);
        let done = until_shutdown(async { Ok::<(), anyhow::Error>(()) }, &mut rx).await;
        assert!(done.is_ok());

        let failed = until_shutdown(
            async { Err::<(), _>(anyhow::anyhow!("sign-in failed")) },
            &mut rx,
        )
        .await;
        assert_eq!(failed.unwrap_err().to_string(), "sign-in failed");
    }

    #[tokio::test]
    async fn test_interrupted_run_is_an_error() {
        let (tx, mut rx) = watch::channel(false);
        tx.send(true).unwrap();

        let outcome = until_shutdown(std::future::pending(), &mut rx).await;
        assert!(outcome.unwrap_err().to_string().contains("interrupted"));
    }

    #[tokio::test]
    async fn test_dropped_signal_does_not_interrupt() {
        let (tx, mut rx) = watch::channel(false);
        drop(tx);

        let outcome = until_shutdown(
            async {
                tokio::task::yield_now().await;
                Ok::<(), anyhow::Error>(())
            },
            &mut rx,
        )
        .await;
        assert!(outcome.is_ok());
    }
}
