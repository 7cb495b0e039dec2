//! Error types for the barfeed library.

use thiserror::Error;

/// Errors that can occur while building or consuming bar messages.
#[derive(Error, Debug)]
pub enum Error {
    /// An update or close referred to a bar that was never created.
    #[error("Unknown bar: {name}")]
    UnknownBar {
        /// Name carried by the message.
        name: String,
    },

    /// A bar with this name is already live.
    #[error("Bar already exists: {name}")]
    DuplicateBar {
        /// Name carried by the message.
        name: String,
    },

    /// Validated update constructor was given a change that is not positive.
    #[error("Update for {name} has non-positive change {change}")]
    NonPositiveChange {
        /// Bar the update was meant for.
        name: String,
        /// Rejected change value.
        change: i64,
    },

    /// The receiving side of the feed channel is gone.
    #[error("Feed channel closed")]
    ChannelClosed,

    /// Configuration could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// I/O error while reading configuration or message scripts.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line of a message script was not a valid message.
    #[error("Script line {line}: {source}")]
    Script {
        /// One-based line number in the script.
        line: usize,
        /// Parse failure for that line.
        source: serde_json::Error,
    },
}

/// A specialized `Result` type for barfeed operations.
pub type Result<T> = std::result::Result<T, Error>;
