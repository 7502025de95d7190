//! Background sweeper for the in-memory tiers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::local::Sweep;

/// Shortest interval the sweeper will run at.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(100);

/// Handle for a running sweeper task.
///
/// Dropping the handle without calling [`SweeperHandle::stop`] also stops the
/// task, since the shutdown sender is dropped with it.
pub struct SweeperHandle {
    handle: JoinHandle<()>,
    shutdown: oneshot::Sender<()>,
}

impl SweeperHandle {
    /// Spawn a task that sweeps every target once per `interval`.
    ///
    /// Intervals below [`MIN_SWEEP_INTERVAL`] (including zero) are raised to
    /// it. Must be called from within a Tokio runtime.
    pub fn spawn(targets: Vec<Arc<dyn Sweep>>, interval: Duration) -> Self {
        let interval = if interval < MIN_SWEEP_INTERVAL {
            warn!(
                requested_ms = interval.as_millis() as u64,
                "Sweep interval too short, using minimum"
            );
            MIN_SWEEP_INTERVAL
        } else {
            interval
        };
        let (shutdown, mut shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately.
            ticker.tick().await;

            info!(interval_ms = interval.as_millis() as u64, "Cache sweeper started");

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        for target in &targets {
                            let removed = target.sweep();
                            if removed > 0 {
                                debug!(tier = target.name(), removed, "Swept expired cache entries");
                            }
                        }
                    }
                }
            }

            info!("Cache sweeper stopped");
        });

        Self { handle, shutdown }
    }

    /// Signal the sweeper to stop and wait for it to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.handle.await;
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl std::fmt::Debug for SweeperHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweeperHandle")
            .field("finished", &self.handle.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalTier;

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_purges_on_interval() {
        let tier = Arc::new(LocalTier::new("test"));
        tier.set("a", 1u8, Duration::from_secs(5));
        tier.set("b", 2u8, Duration::from_secs(500));

        let sweeper = SweeperHandle::spawn(
            vec![Arc::clone(&tier) as Arc<dyn Sweep>],
            Duration::from_secs(10),
        );

        // Expired but not yet swept: still held, but never returned.
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(tier.len(), 2);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(tier.len(), 1);
        assert_eq!(tier.get("b"), Some(2));

        sweeper.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_terminates_task() {
        let tier = Arc::new(LocalTier::<u8>::new("test"));
        let sweeper = SweeperHandle::spawn(vec![tier as Arc<dyn Sweep>], Duration::from_secs(1));
        assert!(!sweeper.is_finished());
        sweeper.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_is_clamped() {
        let tier = Arc::new(LocalTier::new("test"));
        tier.set("a", 1u8, Duration::from_millis(50));

        let sweeper = SweeperHandle::spawn(
            vec![Arc::clone(&tier) as Arc<dyn Sweep>],
            Duration::ZERO,
        );

        tokio::time::sleep(MIN_SWEEP_INTERVAL * 2).await;
        assert_eq!(tier.len(), 0);
        assert!(!sweeper.is_finished());

        sweeper.stop().await;
    }
}
