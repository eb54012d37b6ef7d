//! # Shared Bus - Event Bus for Service Output
//!
//! Every data source service reports through this bus and nothing else:
//! discovered names, heartbeats and log records.
//!
//! ## Delivery Rules
//!
//! - Publishing is non-blocking and never drops an event for a live
//!   subscription.
//! - Each subscription drains `Critical` before `High` before `Normal`.
//! - Within a band, events arrive in publish order.
//! - After `close()`, publishes are refused and subscriptions end once their
//!   queues are empty.
//!
//! ```text
//! ┌──────────────┐   publish()   ┌──────────────┐   recv()   ┌──────────────┐
//! │ Data source  │ ────────────▶ │  Event Bus   │ ─────────▶ │   Consumer   │
//! └──────────────┘               └──────────────┘            └──────────────┘
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, HarvestEvent, LogMessage, Priority, Severity};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, EventSubscriber, Subscription, SubscriptionError};
