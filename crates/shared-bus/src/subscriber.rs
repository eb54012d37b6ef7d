//! # Event Subscriber
//!
//! Defines the subscription side of the event bus.

use crate::events::{EventFilter, HarvestEvent, Priority};
use crate::publisher::SubscriberTable;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio_stream::Stream;
use tracing::debug;

/// One sender per priority band, highest first.
pub(crate) type BandSenders = [mpsc::UnboundedSender<HarvestEvent>; Priority::COUNT];

/// One receiver per priority band, highest first.
pub(crate) type BandReceivers = [mpsc::UnboundedReceiver<HarvestEvent>; Priority::COUNT];

/// Create the per-band queues for a new subscription.
pub(crate) fn band_channels() -> (BandSenders, BandReceivers) {
    let (critical_tx, critical_rx) = mpsc::unbounded_channel();
    let (high_tx, high_rx) = mpsc::unbounded_channel();
    let (normal_tx, normal_rx) = mpsc::unbounded_channel();
    (
        [critical_tx, high_tx, normal_tx],
        [critical_rx, high_rx, normal_rx],
    )
}

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The event bus was closed and every queue is drained.
    #[error("Event bus closed")]
    Closed,
}

/// Trait for subscribing to events from the bus.
pub trait EventSubscriber: Send + Sync {
    /// Subscribe to events matching a filter.
    fn subscribe(&self, filter: EventFilter) -> Subscription;
}

/// A subscription handle for receiving events.
///
/// When dropped, the subscription is automatically removed from the bus.
pub struct Subscription {
    /// Identifier in the bus subscriber table.
    id: u64,

    /// Queues, highest priority first.
    bands: BandReceivers,

    /// Filter for this subscription.
    filter: EventFilter,

    /// Reference to the subscriber table (for cleanup).
    subscribers: SubscriberTable,
}

impl Subscription {
    /// Create a new subscription.
    pub(crate) fn new(
        id: u64,
        bands: BandReceivers,
        filter: EventFilter,
        subscribers: SubscriberTable,
    ) -> Self {
        Self {
            id,
            bands,
            filter,
            subscribers,
        }
    }

    /// Receive the next event, highest priority band first.
    ///
    /// # Returns
    ///
    /// - `Some(event)` - The next matching event
    /// - `None` - The bus was closed and all queued events were consumed
    pub async fn recv(&mut self) -> Option<HarvestEvent> {
        let [critical, high, normal] = &mut self.bands;
        tokio::select! {
            biased;
            Some(event) = critical.recv() => Some(event),
            Some(event) = high.recv() => Some(event),
            Some(event) = normal.recv() => Some(event),
            else => None,
        }
    }

    /// Try to receive the next event without blocking.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(event))` - An event was queued
    /// - `Ok(None)` - Nothing queued right now
    /// - `Err(SubscriptionError::Closed)` - The bus was closed and drained
    pub fn try_recv(&mut self) -> Result<Option<HarvestEvent>, SubscriptionError> {
        let mut closed = 0;
        for band in &mut self.bands {
            match band.try_recv() {
                Ok(event) => return Ok(Some(event)),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => closed += 1,
            }
        }

        if closed == Priority::COUNT {
            Err(SubscriptionError::Closed)
        } else {
            Ok(None)
        }
    }

    /// Get the filter for this subscription.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let id = self.id;
        self.subscribers.lock().retain(|entry| entry.id != id);
        debug!(id, "Subscription dropped");
    }
}

/// A stream wrapper for subscriptions.
///
/// Implements `tokio_stream::Stream` for use with stream combinators.
pub struct EventStream {
    subscription: Subscription,
}

impl EventStream {
    /// Create a new event stream from a subscription.
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        Self { subscription }
    }

    /// Get the filter for this stream.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        self.subscription.filter()
    }
}

impl Stream for EventStream {
    type Item = HarvestEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let mut open = false;

        for band in &mut this.subscription.bands {
            match band.poll_recv(cx) {
                Poll::Ready(Some(event)) => return Poll::Ready(Some(event)),
                Poll::Ready(None) => {}
                Poll::Pending => open = true,
            }
        }

        if open {
            Poll::Pending
        } else {
            Poll::Ready(None)
        }
    }
}
