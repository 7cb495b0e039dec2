//! Messages accepted by the progress feed.
//!
//! Every request a producer can make of the bar display is one variant of
//! [`BarMessage`]. The constructors copy their arguments verbatim and never
//! fail; validation, where wanted, is opt-in (see [`BarUpdate::try_new`]).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Sets how many required bars must be created before the feed can finish.
///
/// Prevents the display from completing before every producer has had a
/// chance to register its bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimumRequiredBars {
    /// Required bars expected before completion.
    pub count: usize,
}

impl MinimumRequiredBars {
    #[must_use]
    pub const fn new(count: usize) -> Self {
        Self { count }
    }
}

/// Payload shared by required and optional bar creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarCreation {
    /// Identity key for later updates and closes.
    pub bar_name: String,
    /// Count at which the bar is full.
    pub total_entities: u64,
}

impl BarCreation {
    #[must_use]
    pub fn new(name: impl Into<String>, total: u64) -> Self {
        Self {
            bar_name: name.into(),
            total_entities: total,
        }
    }
}

/// Advances a bar and/or grows its total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarUpdate {
    /// Bar being advanced.
    pub bar_name: String,
    /// Amount added to the bar's total; zero leaves it as is.
    #[serde(default)]
    pub total_change: i64,
    /// Marks the bar finished regardless of its position.
    #[serde(default)]
    pub trigger_done: bool,
    /// Amount added to the bar's position. Expected to be positive.
    pub change: i64,
}

impl BarUpdate {
    /// Creates an update advancing `name` by `change`.
    ///
    /// `change` is expected to be positive. It is not checked here; use
    /// [`BarUpdate::try_new`] to reject non-positive values.
    #[must_use]
    pub fn new(name: impl Into<String>, change: i64) -> Self {
        Self {
            bar_name: name.into(),
            total_change: 0,
            trigger_done: false,
            change,
        }
    }

    /// Like [`BarUpdate::new`], but refuses a non-positive `change`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonPositiveChange`] when `change <= 0`.
    pub fn try_new(name: impl Into<String>, change: i64) -> Result<Self> {
        let name = name.into();
        if change <= 0 {
            return Err(Error::NonPositiveChange { name, change });
        }
        Ok(Self::new(name, change))
    }

    /// Sets how much the bar's total grows (or shrinks) with this update.
    #[must_use]
    pub const fn with_total_change(mut self, total_change: i64) -> Self {
        self.total_change = total_change;
        self
    }

    /// Sets whether this update marks the bar finished.
    #[must_use]
    pub const fn with_trigger_done(mut self, done: bool) -> Self {
        self.trigger_done = done;
        self
    }
}

/// Creates a bar whose progress runs on the wall clock until `end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedBarCreation {
    /// Identity key for later closes.
    pub bar_name: String,
    /// Wall-clock deadline at which the bar finishes.
    pub end: DateTime<Utc>,
}

impl TimedBarCreation {
    #[must_use]
    pub fn new(name: impl Into<String>, end: DateTime<Utc>) -> Self {
        Self {
            bar_name: name.into(),
            end,
        }
    }
}

/// Terminates a bar whether or not it completed.
///
/// Producers that fail part-way send this so the display does not wait on
/// a bar that will never fill. Closing a finished bar is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarClose {
    /// Bar to terminate.
    pub bar_name: String,
}

impl BarClose {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            bar_name: name.into(),
        }
    }
}

/// Every message a producer can put on the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BarMessage {
    /// Minimum number of required bars before completion.
    MinimumRequiredBars(MinimumRequiredBars),
    /// New bar counted toward the minimum.
    RequiredBar(BarCreation),
    /// New bar not counted toward the minimum.
    OptionalBar(BarCreation),
    /// Progress for an existing bar.
    Update(BarUpdate),
    /// New bar driven by a deadline.
    TimedBar(TimedBarCreation),
    /// Early termination of a bar.
    Close(BarClose),
}

impl BarMessage {
    /// Requires `count` required bars before the feed can finish.
    #[must_use]
    pub const fn minimum_required_bars(count: usize) -> Self {
        Self::MinimumRequiredBars(MinimumRequiredBars::new(count))
    }

    /// Creates a bar counted toward the minimum.
    #[must_use]
    pub fn required_bar(name: impl Into<String>, total: u64) -> Self {
        Self::RequiredBar(BarCreation::new(name, total))
    }

    /// Creates a bar not counted toward the minimum.
    #[must_use]
    pub fn optional_bar(name: impl Into<String>, total: u64) -> Self {
        Self::OptionalBar(BarCreation::new(name, total))
    }

    /// See [`BarUpdate::new`]; `change` is passed through unchecked.
    #[must_use]
    pub fn update(name: impl Into<String>, change: i64) -> Self {
        Self::Update(BarUpdate::new(name, change))
    }

    /// Creates a bar that finishes once `end` has passed.
    #[must_use]
    pub fn timed_bar(name: impl Into<String>, end: DateTime<Utc>) -> Self {
        Self::TimedBar(TimedBarCreation::new(name, end))
    }

    /// Closes `name`, finished or not.
    #[must_use]
    pub fn close(name: impl Into<String>) -> Self {
        Self::Close(BarClose::new(name))
    }

    /// Returns the tag of this message.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::MinimumRequiredBars(_) => MessageKind::MinimumRequiredBars,
            Self::RequiredBar(_) => MessageKind::RequiredBar,
            Self::OptionalBar(_) => MessageKind::OptionalBar,
            Self::Update(_) => MessageKind::Update,
            Self::TimedBar(_) => MessageKind::TimedBar,
            Self::Close(_) => MessageKind::Close,
        }
    }

    /// Returns the bar this message refers to, if any.
    #[must_use]
    pub fn bar_name(&self) -> Option<&str> {
        match self {
            Self::MinimumRequiredBars(_) => None,
            Self::RequiredBar(c) | Self::OptionalBar(c) => Some(&c.bar_name),
            Self::Update(u) => Some(&u.bar_name),
            Self::TimedBar(t) => Some(&t.bar_name),
            Self::Close(c) => Some(&c.bar_name),
        }
    }
}

impl From<MinimumRequiredBars> for BarMessage {
    fn from(value: MinimumRequiredBars) -> Self {
        Self::MinimumRequiredBars(value)
    }
}

impl From<BarUpdate> for BarMessage {
    fn from(value: BarUpdate) -> Self {
        Self::Update(value)
    }
}

impl From<TimedBarCreation> for BarMessage {
    fn from(value: TimedBarCreation) -> Self {
        Self::TimedBar(value)
    }
}

impl From<BarClose> for BarMessage {
    fn from(value: BarClose) -> Self {
        Self::Close(value)
    }
}

/// Fieldless tag of a [`BarMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    MinimumRequiredBars,
    RequiredBar,
    OptionalBar,
    Update,
    TimedBar,
    Close,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MinimumRequiredBars => "minimum_required_bars",
            Self::RequiredBar => "required_bar",
            Self::OptionalBar => "optional_bar",
            Self::Update => "update",
            Self::TimedBar => "timed_bar",
            Self::Close => "close",
        };
        f.write_str(name)
    }
}
