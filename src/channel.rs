//! Typed channel carrying [`BarMessage`]s from producers to the feed loop.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::config::FeedConfig;
use crate::error::{Error, Result};
use crate::message::{BarMessage, BarUpdate};

/// Producer handle. Clone it to hand out to more tasks.
#[derive(Debug, Clone)]
pub struct BarSender {
    tx: mpsc::Sender<BarMessage>,
}

/// Consumer handle, drained by [`crate::Feed::run`].
#[derive(Debug)]
pub struct BarReceiver {
    rx: mpsc::Receiver<BarMessage>,
}

/// Creates a bounded sender/receiver pair sized by `config`.
#[must_use]
pub fn channel(config: &FeedConfig) -> (BarSender, BarReceiver) {
    let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
    (BarSender { tx }, BarReceiver { rx })
}

impl BarSender {
    /// Sends any message, waiting for channel capacity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the receiver was dropped.
    pub async fn send(&self, message: impl Into<BarMessage>) -> Result<()> {
        self.tx
            .send(message.into())
            .await
            .map_err(|_| Error::ChannelClosed)
    }

    /// Sets the minimum number of required bars.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the receiver was dropped.
    pub async fn require(&self, count: usize) -> Result<()> {
        self.send(BarMessage::minimum_required_bars(count)).await
    }

    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the receiver was dropped.
    pub async fn required_bar(&self, name: impl Into<String>, total: u64) -> Result<()> {
        self.send(BarMessage::required_bar(name, total)).await
    }

    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the receiver was dropped.
    pub async fn optional_bar(&self, name: impl Into<String>, total: u64) -> Result<()> {
        self.send(BarMessage::optional_bar(name, total)).await
    }

    /// Advances `name` by `change`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the receiver was dropped.
    pub async fn update(&self, name: impl Into<String>, change: i64) -> Result<()> {
        self.send(BarMessage::update(name, change)).await
    }

    /// Marks `name` finished without advancing it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the receiver was dropped.
    pub async fn finish(&self, name: impl Into<String>) -> Result<()> {
        self.send(BarUpdate::new(name, 0).with_trigger_done(true))
            .await
    }

    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the receiver was dropped.
    pub async fn timed_bar(&self, name: impl Into<String>, end: DateTime<Utc>) -> Result<()> {
        self.send(BarMessage::timed_bar(name, end)).await
    }

    /// Closes `name` early, e.g. after the work behind it failed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the receiver was dropped.
    pub async fn close(&self, name: impl Into<String>) -> Result<()> {
        self.send(BarMessage::close(name)).await
    }

    /// Whether the receiver has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl BarReceiver {
    /// Waits for the next message; `None` once every sender is dropped.
    pub async fn recv(&mut self) -> Option<BarMessage> {
        self.rx.recv().await
    }

    /// Stops accepting messages while still draining buffered ones.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn helpers_send_matching_messages() {
        let (tx, mut rx) = channel(&FeedConfig::default());
        let end = Utc::now();

        tx.require(2).await.unwrap();
        tx.required_bar("a", 3).await.unwrap();
        tx.optional_bar("b", 4).await.unwrap();
        tx.update("a", 1).await.unwrap();
        tx.finish("b").await.unwrap();
        tx.timed_bar("t", end).await.unwrap();
        tx.close("a").await.unwrap();
        drop(tx);

        let mut received = Vec::new();
        while let Some(msg) = rx.recv().await {
            received.push(msg);
        }

        assert_eq!(
            received,
            vec![
                BarMessage::minimum_required_bars(2),
                BarMessage::required_bar("a", 3),
                BarMessage::optional_bar("b", 4),
                BarMessage::update("a", 1),
                BarUpdate::new("b", 0).with_trigger_done(true).into(),
                BarMessage::timed_bar("t", end),
                BarMessage::close("a"),
            ]
        );
    }

    #[tokio::test]
    async fn send_after_receiver_dropped_fails() {
        let (tx, rx) = channel(&FeedConfig::default());
        drop(rx);
        assert!(tx.is_closed());
        assert!(matches!(tx.update("a", 1).await, Err(Error::ChannelClosed)));
    }

    #[tokio::test]
    async fn closed_receiver_drains_buffered_messages() {
        let (tx, mut rx) = channel(&FeedConfig::default());
        tx.required_bar("a", 1).await.unwrap();
        tx.update("a", 1).await.unwrap();

        rx.close();
        assert!(tx.is_closed());
        assert!(matches!(tx.close("a").await, Err(Error::ChannelClosed)));

        assert_eq!(rx.recv().await, Some(BarMessage::required_bar("a", 1)));
        assert_eq!(rx.recv().await, Some(BarMessage::update("a", 1)));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn cloned_senders_share_one_queue() {
        let (tx, mut rx) = channel(&FeedConfig::new().with_channel_capacity(4));
        let other = tx.clone();
        tx.required_bar("a", 1).await.unwrap();
        other.required_bar("b", 1).await.unwrap();
        drop((tx, other));

        assert_eq!(rx.recv().await, Some(BarMessage::required_bar("a", 1)));
        assert_eq!(rx.recv().await, Some(BarMessage::required_bar("b", 1)));
        assert_eq!(rx.recv().await, None);
    }
}
