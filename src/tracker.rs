//! Bar state tracking.
//!
//! [`BarTracker`] applies [`BarMessage`]s in arrival order and decides when
//! the whole display is done. It does no I/O; the feed loop owns one and
//! forwards the [`BarEvent`]s it produces to an observer.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::config::FeedConfig;
use crate::error::{Error, Result};
use crate::message::{BarClose, BarCreation, BarMessage, BarUpdate, TimedBarCreation};

/// How a bar was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarKind {
    /// Counts toward the minimum.
    Required,
    /// Does not count toward the minimum.
    Optional,
    /// Finishes when its deadline passes.
    Timed,
}

/// Lifecycle state of a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarStatus {
    Running,
    Finished,
    /// Terminated before completion.
    Closed,
}

/// Current state of one bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarState {
    pub kind: BarKind,
    pub position: u64,
    pub total: u64,
    pub status: BarStatus,
    /// Deadline, for timed bars.
    pub end: Option<DateTime<Utc>>,
}

impl BarState {
    const fn new(kind: BarKind, total: u64, end: Option<DateTime<Utc>>) -> Self {
        Self {
            kind,
            position: 0,
            total,
            status: BarStatus::Running,
            end,
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status == BarStatus::Running
    }
}

/// State change produced by applying a message or a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BarEvent {
    Created { name: String, kind: BarKind, total: u64 },
    Advanced { name: String, position: u64, total: u64 },
    Finished { name: String },
    Closed { name: String },
    /// Dropped from the tracker; the name may be reused.
    Removed { name: String },
}

/// Counters describing a feed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSummary {
    /// Bars created, of any kind.
    pub created: usize,
    /// Bars that ran to completion.
    pub finished: usize,
    /// Bars closed before completion.
    pub closed: usize,
    /// Required bars created.
    pub required: usize,
}

/// Applies bar messages and tracks overall completion.
#[derive(Debug, Default)]
pub struct BarTracker {
    bars: HashMap<String, BarState>,
    minimum: usize,
    remove_finished_timed: bool,
    touched: bool,
    summary: FeedSummary,
}

/// Adds a signed delta to an unsigned counter, clamping at both ends.
const fn apply_delta(value: u64, delta: i64) -> u64 {
    if delta >= 0 {
        value.saturating_add(delta.unsigned_abs())
    } else {
        value.saturating_sub(delta.unsigned_abs())
    }
}

impl BarTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            remove_finished_timed: config.remove_finished_timed,
            ..Self::default()
        }
    }

    /// Applies one message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateBar`] when creating a bar whose name is
    /// still tracked, and [`Error::UnknownBar`] when updating or closing a
    /// bar that is not. The tracker is left unchanged in both cases.
    pub fn apply(&mut self, message: BarMessage, now: DateTime<Utc>) -> Result<Vec<BarEvent>> {
        let result = match message {
            BarMessage::MinimumRequiredBars(min) => {
                self.minimum = min.count;
                Ok(Vec::new())
            }
            BarMessage::RequiredBar(creation) => self.create(creation, BarKind::Required),
            BarMessage::OptionalBar(creation) => self.create(creation, BarKind::Optional),
            BarMessage::TimedBar(timed) => self.create_timed(timed, now),
            BarMessage::Update(update) => self.update(update),
            BarMessage::Close(close) => self.close(close),
        };
        if result.is_ok() {
            self.touched = true;
        }
        result
    }

    /// Finishes every running timed bar whose deadline is at or before `now`.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<BarEvent> {
        let expired: Vec<String> = self
            .bars
            .iter()
            .filter(|(_, bar)| bar.is_running() && bar.end.is_some_and(|end| end <= now))
            .map(|(name, _)| name.clone())
            .collect();

        let mut events = Vec::new();
        for name in expired {
            events.extend(self.finish(&name));
        }
        events
    }

    /// Whether the minimum of required bars exists and no bar is running.
    ///
    /// A tracker that has not seen any message is never complete.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.touched
            && self.summary.required >= self.minimum
            && self.bars.values().all(|bar| !bar.is_running())
    }

    /// Whether any bar is a timed bar still waiting on its deadline.
    #[must_use]
    pub fn has_pending_deadlines(&self) -> bool {
        self.bars
            .values()
            .any(|bar| bar.is_running() && bar.end.is_some())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BarState> {
        self.bars.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    #[must_use]
    pub const fn minimum(&self) -> usize {
        self.minimum
    }

    #[must_use]
    pub const fn summary(&self) -> FeedSummary {
        self.summary
    }

    fn register(&mut self, name: String, state: BarState) -> Result<Vec<BarEvent>> {
        if self.bars.contains_key(&name) {
            return Err(Error::DuplicateBar { name });
        }
        self.summary.created += 1;
        if state.kind == BarKind::Required {
            self.summary.required += 1;
        }
        let event = BarEvent::Created {
            name: name.clone(),
            kind: state.kind,
            total: state.total,
        };
        self.bars.insert(name, state);
        Ok(vec![event])
    }

    fn create(&mut self, creation: BarCreation, kind: BarKind) -> Result<Vec<BarEvent>> {
        let BarCreation {
            bar_name,
            total_entities,
        } = creation;
        self.register(bar_name, BarState::new(kind, total_entities, None))
    }

    fn create_timed(
        &mut self,
        timed: TimedBarCreation,
        now: DateTime<Utc>,
    ) -> Result<Vec<BarEvent>> {
        let TimedBarCreation { bar_name, end } = timed;
        let mut events =
            self.register(bar_name.clone(), BarState::new(BarKind::Timed, 0, Some(end)))?;
        if end <= now {
            events.extend(self.finish(&bar_name));
        }
        Ok(events)
    }

    fn update(&mut self, update: BarUpdate) -> Result<Vec<BarEvent>> {
        let BarUpdate {
            bar_name,
            total_change,
            trigger_done,
            change,
        } = update;
        let Some(bar) = self.bars.get_mut(&bar_name) else {
            return Err(Error::UnknownBar { name: bar_name });
        };
        if !bar.is_running() {
            log::debug!("Ignoring update for stopped bar {bar_name}");
            return Ok(Vec::new());
        }

        bar.position = apply_delta(bar.position, change);
        bar.total = apply_delta(bar.total, total_change);
        let done = trigger_done || (bar.total > 0 && bar.position >= bar.total);

        let mut events = vec![BarEvent::Advanced {
            name: bar_name.clone(),
            position: bar.position,
            total: bar.total,
        }];
        if done {
            events.extend(self.finish(&bar_name));
        }
        Ok(events)
    }

    fn close(&mut self, close: BarClose) -> Result<Vec<BarEvent>> {
        let BarClose { bar_name } = close;
        let Some(bar) = self.bars.get_mut(&bar_name) else {
            return Err(Error::UnknownBar { name: bar_name });
        };
        if !bar.is_running() {
            return Ok(Vec::new());
        }
        bar.status = BarStatus::Closed;
        self.summary.closed += 1;
        Ok(vec![BarEvent::Closed { name: bar_name }])
    }

    fn finish(&mut self, name: &str) -> Vec<BarEvent> {
        let Some(bar) = self.bars.get_mut(name) else {
            return Vec::new();
        };
        bar.status = BarStatus::Finished;
        self.summary.finished += 1;

        let mut events = vec![BarEvent::Finished {
            name: name.to_string(),
        }];
        if bar.kind == BarKind::Timed && self.remove_finished_timed {
            self.bars.remove(name);
            events.push(BarEvent::Removed {
                name: name.to_string(),
            });
        }
        events
    }
}
