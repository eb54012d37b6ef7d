//! # Event Publisher
//!
//! Defines the publishing side of the event bus.

use crate::events::{EventFilter, HarvestEvent, Priority};
use crate::subscriber::{band_channels, BandSenders, EventStream, EventSubscriber, Subscription};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Trait for publishing events to the bus.
///
/// This is the only interface data source services use to emit output.
/// Publishing never waits on consumers.
pub trait EventPublisher: Send + Sync {
    /// Publish an event to the bus at the given priority.
    ///
    /// # Returns
    ///
    /// The number of subscriptions the event was queued for.
    fn publish(&self, priority: Priority, event: HarvestEvent) -> usize;

    /// Get the total number of events published.
    fn events_published(&self) -> u64;
}

/// A registered subscription as seen from the publishing side.
pub(crate) struct SubscriberEntry {
    pub(crate) id: u64,
    pub(crate) filter: EventFilter,
    pub(crate) senders: BandSenders,
}

/// Subscriber table shared between the bus and its subscriptions.
pub(crate) type SubscriberTable = Arc<Mutex<Vec<SubscriberEntry>>>;

/// In-memory implementation of the event bus.
///
/// Each subscription owns one unbounded queue per priority band, so a slow
/// consumer never blocks a publisher and nothing is dropped while the
/// subscription is alive. Fan-out runs under a single lock, which gives every
/// subscriber the same relative order of events.
pub struct InMemoryEventBus {
    /// Registered subscriptions.
    subscribers: SubscriberTable,

    /// Next subscription identifier.
    next_id: AtomicU64,

    /// Total events published.
    events_published: AtomicU64,

    /// Set once `close()` has been called.
    closed: AtomicBool,
}

impl InMemoryEventBus {
    /// Create a new, open event bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(1),
            events_published: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Subscribe to events matching a filter.
    ///
    /// Only events published after this call are delivered. Subscribing to a
    /// closed bus yields a subscription that is already at end-of-stream.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (senders, receivers) = band_channels();

        {
            let mut subs = self.subscribers.lock();
            if self.closed.load(Ordering::Acquire) {
                warn!(topics = ?filter.topics, "Subscribed to a closed bus");
            } else {
                subs.push(SubscriberEntry {
                    id,
                    filter: filter.clone(),
                    senders,
                });
            }
        }

        debug!(id, topics = ?filter.topics, "New subscription created");

        Subscription::new(id, receivers, filter, Arc::clone(&self.subscribers))
    }

    /// Get a stream of events matching a filter.
    ///
    /// This is a convenience method that returns an `EventStream`.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.subscribe(filter))
    }

    /// Get the number of active subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Whether `close()` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Shut the bus down.
    ///
    /// Later publishes are refused. Existing subscriptions still receive what
    /// was queued before the call, then observe end-of-stream.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let dropped = {
            let mut subs = self.subscribers.lock();
            let count = subs.len();
            subs.clear();
            count
        };

        info!(
            subscriptions = dropped,
            events = self.events_published(),
            "Event bus closed"
        );
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for InMemoryEventBus {
    fn publish(&self, priority: Priority, event: HarvestEvent) -> usize {
        let topic = event.topic();

        // Always increment counter (event was attempted)
        self.events_published.fetch_add(1, Ordering::Relaxed);

        if self.is_closed() {
            warn!(
                topic = topic.as_str(),
                source = event.source(),
                "Event refused (bus closed)"
            );
            return 0;
        }

        let mut delivered = 0;
        {
            let mut subs = self.subscribers.lock();
            subs.retain(|entry| {
                if !entry.filter.matches(&event) {
                    return true;
                }
                // A failed send means the receiving half is gone.
                match entry.senders[priority.index()].send(event.clone()) {
                    Ok(()) => {
                        delivered += 1;
                        true
                    }
                    Err(_) => false,
                }
            });
        }

        debug!(
            topic = topic.as_str(),
            source = event.source(),
            priority = ?priority,
            receivers = delivered,
            "Event published"
        );

        delivered
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, filter: EventFilter) -> Subscription {
        InMemoryEventBus::subscribe(self, filter)
    }
}
