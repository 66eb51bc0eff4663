use anyhow::Result;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::Context;
use crate::ingest::Scheduler;

/// Collect feeds every `interval` until Ctrl-C or SIGTERM.
pub async fn run(ctx: &mut Context, interval: Duration) -> Result<()> {
    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(cancel_on_shutdown(cancel.clone()));

    println!("Collecting feeds every {:?} (Ctrl-C to stop)", interval);
    let cycles = Scheduler::new(interval)
        .run(&ctx.db, &ctx.http, &cancel)
        .await;

    watcher.abort();
    println!("Stopped after {} collection cycle(s)", cycles);
    Ok(())
}

/// Cancel `token` on the first SIGINT or SIGTERM.
async fn cancel_on_shutdown(token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    tracing::warn!(error = %e, "Failed to install signal handlers, falling back to Ctrl-C");
                    if tokio::signal::ctrl_c().await.is_ok() {
                        token.cancel();
                    }
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down gracefully"),
            _ = sigint.recv() => tracing::info!("Received SIGINT, shutting down gracefully"),
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            return;
        }
        tracing::info!("Received Ctrl-C, shutting down gracefully");
    }

    token.cancel();
}
