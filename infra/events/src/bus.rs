use crate::error::EventBusError;
use crate::subscription::Subscription;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

const DEFAULT_CAPACITY: usize = 256;

/// Marker trait for anything that can travel on the bus.
pub trait Event: Any + Send + Sync + 'static {}

impl<T: Any + Send + Sync + 'static> Event for T {}

struct Channel {
    capacity: usize,
    sender: Box<dyn Any + Send + Sync>,
}

/// A cloneable handle to the shared broadcast registry.
///
/// One channel exists per event type. Channels are created lazily on first use.
#[derive(Clone, Default)]
pub struct EventBus {
    channels: Arc<RwLock<FxHashMap<TypeId, Channel>>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").field("channels", &self.channels.read().len()).finish()
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events of type `T` with the default channel capacity.
    ///
    /// # Errors
    /// Returns [`EventBusError::TypeMismatch`] if the registry is corrupted.
    pub fn subscribe<T: Event>(&self) -> Result<broadcast::Receiver<Arc<T>>, EventBusError> {
        self.subscribe_with_capacity(DEFAULT_CAPACITY)
    }

    /// Subscribe with an explicit capacity.
    ///
    /// The capacity is only honoured when the channel does not exist yet.
    ///
    /// # Errors
    /// Returns [`EventBusError::InvalidCapacity`] for a zero capacity.
    pub fn subscribe_with_capacity<T: Event>(
        &self,
        capacity: usize,
    ) -> Result<broadcast::Receiver<Arc<T>>, EventBusError> {
        Ok(self.sender::<T>(capacity)?.subscribe())
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of receivers the event reached. Publishing with no
    /// subscribers is not an error.
    ///
    /// # Errors
    /// Returns [`EventBusError::TypeMismatch`] if the registry is corrupted.
    pub fn publish<T: Event>(&self, event: T) -> Result<usize, EventBusError> {
        self.publish_arc(Arc::new(event))
    }

    /// Publish an already shared event.
    ///
    /// # Errors
    /// Returns [`EventBusError::TypeMismatch`] if the registry is corrupted.
    pub fn publish_arc<T: Event>(&self, event: Arc<T>) -> Result<usize, EventBusError> {
        let Some(sender) = self.existing_sender::<T>()? else {
            trace!(event = std::any::type_name::<T>(), "No channel registered; event dropped");
            return Ok(0);
        };

        let reached = sender.send(event).unwrap_or(0);
        trace!(event = std::any::type_name::<T>(), reached, "Event published");
        Ok(reached)
    }

    /// Register a callback for every event of type `T`.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// Returns [`EventBusError::TypeMismatch`] if the registry is corrupted.
    pub fn listen<T, H>(&self, handler: H) -> Result<Subscription, EventBusError>
    where
        T: Event,
        H: FnMut(&T) + Send + 'static,
    {
        self.listen_where(|_: &T| true, handler)
    }

    /// Register a callback for events of type `T` accepted by `filter`.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// Returns [`EventBusError::TypeMismatch`] if the registry is corrupted.
    pub fn listen_where<T, F, H>(&self, filter: F, handler: H) -> Result<Subscription, EventBusError>
    where
        T: Event,
        F: Fn(&T) -> bool + Send + 'static,
        H: FnMut(&T) + Send + 'static,
    {
        let receiver = self.subscribe::<T>()?;
        Ok(Subscription::spawn(receiver, filter, handler))
    }

    fn existing_sender<T: Event>(&self) -> Result<Option<broadcast::Sender<Arc<T>>>, EventBusError> {
        let channels = self.channels.read();
        channels.get(&TypeId::of::<T>()).map(Self::downcast::<T>).transpose()
    }

    fn sender<T: Event>(&self, capacity: usize) -> Result<broadcast::Sender<Arc<T>>, EventBusError> {
        if capacity == 0 {
            return Err(EventBusError::InvalidCapacity {
                message: "capacity must be greater than zero".into(),
                context: Some(std::any::type_name::<T>().into()),
            });
        }

        if let Some(sender) = self.existing_sender::<T>()? {
            return Ok(sender);
        }

        let mut channels = self.channels.write();
        let channel = channels.entry(TypeId::of::<T>()).or_insert_with(|| {
            debug!(event = std::any::type_name::<T>(), capacity, "Creating event channel");
            let (sender, _) = broadcast::channel::<Arc<T>>(capacity);
            Channel { capacity, sender: Box::new(sender) }
        });
        trace!(capacity = channel.capacity, "Using event channel");
        Self::downcast::<T>(channel)
    }

    fn downcast<T: Event>(channel: &Channel) -> Result<broadcast::Sender<Arc<T>>, EventBusError> {
        channel.sender.downcast_ref::<broadcast::Sender<Arc<T>>>().cloned().ok_or_else(|| {
            EventBusError::TypeMismatch {
                message: "registered channel has a different event type".into(),
                context: Some(std::any::type_name::<T>().into()),
            }
        })
    }
}
