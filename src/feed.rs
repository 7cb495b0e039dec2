//! The consumer loop: drains a [`BarReceiver`] into a [`BarTracker`].

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::channel::BarReceiver;
use crate::config::FeedConfig;
use crate::error::Result;
use crate::tracker::{BarEvent, BarKind, BarTracker, FeedSummary};

/// Trait for receiving bar state changes from the feed loop.
///
/// A display implements this to draw bars. All methods have default no-op
/// implementations for convenience.
pub trait BarObserver: Send + Sync {
    /// Called when a bar is registered.
    fn on_created(&self, _name: &str, _kind: BarKind, _total: u64) {}

    /// Called after a bar's position or total changed.
    fn on_advanced(&self, _name: &str, _position: u64, _total: u64) {}

    /// Called when a bar completes.
    fn on_finished(&self, _name: &str) {}

    /// Called when a bar is closed before completing.
    fn on_closed(&self, _name: &str) {}

    /// Called when a finished bar is dropped from tracking.
    fn on_removed(&self, _name: &str) {}

    /// Called once when the loop exits without error.
    fn on_complete(&self, _summary: &FeedSummary) {}
}

/// A null observer that ignores all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObserver;

impl BarObserver for NoObserver {}

/// Observer that writes every event to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl BarObserver for LogObserver {
    fn on_created(&self, name: &str, kind: BarKind, total: u64) {
        log::info!("Bar created: {name} ({kind:?}, total {total})");
    }

    fn on_advanced(&self, name: &str, position: u64, total: u64) {
        log::debug!("Bar advanced: {name} {position}/{total}");
    }

    fn on_finished(&self, name: &str) {
        log::info!("Bar finished: {name}");
    }

    fn on_closed(&self, name: &str) {
        log::warn!("Bar closed before completion: {name}");
    }

    fn on_removed(&self, name: &str) {
        log::debug!("Bar removed: {name}");
    }

    fn on_complete(&self, summary: &FeedSummary) {
        log::info!(
            "Feed done: {} created, {} finished, {} closed",
            summary.created,
            summary.finished,
            summary.closed
        );
    }
}

fn dispatch(observer: &dyn BarObserver, events: &[BarEvent]) {
    for event in events {
        match event {
            BarEvent::Created { name, kind, total } => observer.on_created(name, *kind, *total),
            BarEvent::Advanced {
                name,
                position,
                total,
            } => observer.on_advanced(name, *position, *total),
            BarEvent::Finished { name } => observer.on_finished(name),
            BarEvent::Closed { name } => observer.on_closed(name),
            BarEvent::Removed { name } => observer.on_removed(name),
        }
    }
}

/// Single-consumer loop applying bar messages in arrival order.
#[derive(Debug, Clone)]
pub struct Feed {
    config: FeedConfig,
    cancel: CancellationToken,
}

impl Feed {
    #[must_use]
    pub fn new(config: FeedConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Uses `token` to stop the loop from outside.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Returns a handle that stops [`Feed::run`] when cancelled.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    #[must_use]
    pub const fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Drains `receiver` until the display is complete.
    ///
    /// Returns when the tracker reports completion, when every sender has
    /// been dropped and no timed bar is still waiting, or when the
    /// cancellation token fires.
    ///
    /// # Errors
    ///
    /// In strict mode, the first message the tracker rejects ends the loop
    /// with that error. Otherwise rejected messages are logged and skipped.
    pub async fn run(
        &self,
        mut receiver: BarReceiver,
        observer: &dyn BarObserver,
    ) -> Result<FeedSummary> {
        let mut tracker = BarTracker::new(&self.config);
        let mut ticker = tokio::time::interval(self.config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut open = true;

        loop {
            tokio::select! {
                biased;

                () = self.cancel.cancelled() => {
                    log::info!("Feed cancelled");
                    break;
                }
                message = receiver.recv(), if open => {
                    let Some(message) = message else {
                        log::debug!("All senders dropped");
                        open = false;
                        if tracker.has_pending_deadlines() {
                            continue;
                        }
                        break;
                    };
                    let kind = message.kind();
                    match tracker.apply(message, Utc::now()) {
                        Ok(events) => dispatch(observer, &events),
                        Err(e) if self.config.strict => return Err(e),
                        Err(e) => log::warn!("Ignoring {kind} message: {e}"),
                    }
                }
                _ = ticker.tick() => {
                    let events = tracker.tick(Utc::now());
                    dispatch(observer, &events);
                    if !open && !tracker.has_pending_deadlines() {
                        break;
                    }
                }
            }

            if tracker.is_complete() {
                log::debug!("All bars done");
                break;
            }
        }

        let summary = tracker.summary();
        observer.on_complete(&summary);
        Ok(summary)
    }
}
