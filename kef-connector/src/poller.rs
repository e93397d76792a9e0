//! Periodic polling task
//!
//! Hosts that do not schedule polls themselves can hand a player to
//! [`PollingTask`], which updates it at a fixed interval until shut down or
//! until the player is dropped.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::config::PollerConfig;
use crate::player::KefMediaPlayer;

/// Background poll loop for one player
#[derive(Debug)]
pub struct PollingTask {
    interval: Duration,
    task_handle: Option<JoinHandle<()>>,
    shutdown: Arc<Notify>,
    poll_count: Arc<AtomicU64>,
    error_count: Arc<AtomicU32>,
}

impl PollingTask {
    /// Start polling `player` every `config.scan_interval`
    ///
    /// The first tick fires immediately.
    pub fn start(player: &Arc<KefMediaPlayer>, config: &PollerConfig) -> Self {
        let shutdown = Arc::new(Notify::new());
        let poll_count = Arc::new(AtomicU64::new(0));
        let error_count = Arc::new(AtomicU32::new(0));

        let task_handle = tokio::spawn(Self::polling_loop(
            Arc::downgrade(player),
            config.scan_interval,
            Arc::clone(&shutdown),
            Arc::clone(&poll_count),
            Arc::clone(&error_count),
        ));

        Self {
            interval: config.scan_interval,
            task_handle: Some(task_handle),
            shutdown,
            poll_count,
            error_count,
        }
    }

    async fn polling_loop(
        player: Weak<KefMediaPlayer>,
        interval: Duration,
        shutdown: Arc<Notify>,
        poll_count: Arc<AtomicU64>,
        error_count: Arc<AtomicU32>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.notified() => {
                    debug!("Polling task shutting down");
                    break;
                }
            }

            let Some(player) = player.upgrade() else {
                debug!("Player dropped; stopping polling task");
                break;
            };

            poll_count.fetch_add(1, Ordering::Relaxed);
            match player.update().await {
                Ok(_) => error_count.store(0, Ordering::Relaxed),
                Err(err) => {
                    let errors = error_count.fetch_add(1, Ordering::Relaxed) + 1;
                    warn!(
                        host = %player.connection().host(),
                        consecutive_errors = errors,
                        "Poll failed, keeping previous state: {}",
                        err
                    );
                }
            }
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of polls attempted so far
    pub fn poll_count(&self) -> u64 {
        self.poll_count.load(Ordering::Relaxed)
    }

    /// Number of consecutive failed polls
    pub fn error_count(&self) -> u32 {
        self.error_count.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.task_handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stop the loop and wait for it to exit
    pub async fn shutdown(mut self) {
        self.shutdown.notify_one();
        if let Some(handle) = self.task_handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for PollingTask {
    fn drop(&mut self) {
        if let Some(handle) = &self.task_handle {
            handle.abort();
        }
    }
}
