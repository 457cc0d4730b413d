//! # PingTap Worker
//!
//! Runs the subscription expiry sweeper until Ctrl-C / SIGTERM.
//!
//! ```bash
//! DATABASE_URL=postgresql://... SWEEP_INTERVAL_SECS=300 cargo run -p pingtap-worker
//! ```

use anyhow::Context;
use pingtap_shared::db::pool::{create_pool, DatabaseConfig};
use pingtap_worker::sweeper::{SubscriptionSweeper, SweeperConfig};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pingtap_worker=debug,pingtap_shared=info".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let fmt_layer = if json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

async fn wait_for_shutdown(token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl-C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown signal received");
    token.cancel();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!("PingTap Worker v{} starting...", env!("CARGO_PKG_VERSION"));

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = create_pool(DatabaseConfig::new(database_url).with_max_connections(2))
        .await
        .context("failed to connect to database")?;

    let shutdown = CancellationToken::new();
    let sweeper = SubscriptionSweeper::new(pool.clone(), SweeperConfig::from_env(), shutdown.clone());

    tokio::spawn(wait_for_shutdown(shutdown));
    sweeper.run().await;

    pool.close().await;
    tracing::info!("Worker stopped");

    Ok(())
}
