/// Subscription expiry sweeper
///
/// Every `interval` the sweeper flips `active` subscriptions whose
/// `end_date` has passed to `expired`. A failed sweep is logged and retried
/// on the next tick; only the shutdown token stops the loop.
///
/// # Example
///
/// ```no_run
/// use pingtap_worker::sweeper::{SubscriptionSweeper, SweeperConfig};
/// use sqlx::PgPool;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example(pool: PgPool) {
/// let shutdown = CancellationToken::new();
/// let sweeper = SubscriptionSweeper::new(pool, SweeperConfig::default(), shutdown.clone());
///
/// let handle = tokio::spawn(sweeper.run());
/// shutdown.cancel();
/// handle.await.unwrap();
/// # }
/// ```

use chrono::{DateTime, Utc};
use pingtap_shared::models::subscription::Subscription;
use sqlx::PgPool;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Default sweep interval (5 minutes)
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct SweeperConfig {
    pub interval_secs: u64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

impl SweeperConfig {
    /// Reads `SWEEP_INTERVAL_SECS`; zero or unparsable values fall back to
    /// the default
    pub fn from_env() -> Self {
        let interval_secs = std::env::var("SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS);

        Self { interval_secs }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

pub struct SubscriptionSweeper {
    pool: PgPool,
    config: SweeperConfig,
    shutdown_token: CancellationToken,
}

impl SubscriptionSweeper {
    pub fn new(pool: PgPool, config: SweeperConfig, shutdown_token: CancellationToken) -> Self {
        Self {
            pool,
            config,
            shutdown_token,
        }
    }

    /// Expires every subscription that lapsed before `now`
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let expired = Subscription::expire_lapsed(&self.pool, now).await?;

        if expired > 0 {
            tracing::info!(expired, "Expired lapsed subscriptions");
        } else {
            tracing::debug!("No lapsed subscriptions");
        }

        Ok(expired)
    }

    /// Sweeps on every tick until the shutdown token is cancelled
    ///
    /// The first tick fires immediately, so a restarted worker catches up
    /// without waiting a full interval.
    pub async fn run(self) {
        let mut ticker = interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = self.config.interval_secs,
            "Subscription sweeper started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown_token.cancelled() => {
                    tracing::info!("Shutdown requested, stopping sweeper");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep_once(Utc::now()).await {
                        tracing::error!(error = %e, "Subscription sweep failed");
                    }
                }
            }
        }
    }
}
