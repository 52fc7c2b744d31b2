//! # Event Bus
//!
//! A type-safe, asynchronous broadcast bus shared by the whole application.
//!
//! ## Overview
//!
//! Events are routed by their Rust type. Consumers either pull from a raw
//! [`tokio::sync::broadcast::Receiver`] ([`EventBus::subscribe`]) or register a callback
//! ([`EventBus::listen`]) and get back a [`Subscription`] handle. Dropping the handle, or
//! calling [`Subscription::unsubscribe`], guarantees the callback is not invoked again.
//!
//! Delivery order per subscriber equals publish order. Subscribers only see events
//! published after they subscribed.
//!
//! # Example
//!
//! ```rust
//! use lovebird_event_bus::{EventBus, EventBusError};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct UserSignedIn { id: u64 }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), EventBusError> {
//!     let bus = EventBus::new();
//!     let last = Arc::new(AtomicU64::new(0));
//!
//!     let seen = Arc::clone(&last);
//!     let subscription = bus.listen(move |event: &UserSignedIn| seen.store(event.id, Ordering::SeqCst))?;
//!     bus.publish(UserSignedIn { id: 42 })?;
//!
//!     subscription.unsubscribe();
//!     Ok(())
//! }
//! ```

mod bus;
mod error;
mod receiver;
mod subscription;

pub use bus::{Event, EventBus};
pub use error::{EventBusError, EventBusErrorExt};
pub use receiver::EventReceiverExt;
pub use subscription::Subscription;
