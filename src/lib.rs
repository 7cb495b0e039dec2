//! barfeed - typed messages for driving a multi-bar progress display.
//!
//! Producers describe what the display should show with [`BarMessage`]s
//! (create required, optional or timed bars, advance them, close them) and
//! push them through a [`BarSender`]. A single [`Feed`] loop drains the
//! channel, tracks every bar and reports state changes to a
//! [`BarObserver`], abstracted from any specific rendering framework.
//!
//! # Example
//!
//! ```no_run
//! use barfeed::{Feed, FeedConfig, LogObserver, channel};
//!
//! # async fn example() -> barfeed::Result<()> {
//! let feed = Feed::new(FeedConfig::default());
//! let (tx, rx) = channel(feed.config());
//!
//! tokio::spawn(async move {
//!     tx.require(1).await?;
//!     tx.required_bar("files", 3).await?;
//!     for _ in 0..3 {
//!         tx.update("files", 1).await?;
//!     }
//!     Ok::<_, barfeed::Error>(())
//! });
//!
//! let summary = feed.run(rx, &LogObserver).await?;
//! println!("{} bar(s) finished", summary.finished);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod channel;
pub mod config;
pub mod error;
pub mod feed;
pub mod message;
pub mod tracker;

// Re-export main types for convenience
pub use channel::{BarReceiver, BarSender, channel};
pub use config::FeedConfig;
pub use error::{Error, Result};
pub use feed::{BarObserver, Feed, LogObserver, NoObserver};
pub use message::{
    BarClose, BarCreation, BarMessage, BarUpdate, MessageKind, MinimumRequiredBars,
    TimedBarCreation,
};
pub use tracker::{BarEvent, BarKind, BarState, BarStatus, BarTracker, FeedSummary};
