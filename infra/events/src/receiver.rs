use crate::bus::Event;
use std::any::type_name;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

/// Lag-tolerant receive for bus receivers.
pub trait EventReceiverExt<T> {
    /// Next event, or `None` once the channel is closed.
    ///
    /// A receiver that fell behind skips to the oldest retained event.
    fn recv_event(&mut self) -> impl Future<Output = Option<Arc<T>>> + Send;
}

impl<T: Event> EventReceiverExt<T> for Receiver<Arc<T>> {
    async fn recv_event(&mut self) -> Option<Arc<T>> {
        let mut skipped = 0u64;
        loop {
            match self.recv().await {
                Ok(event) if skipped == 0 => return Some(event),
                Ok(event) => {
                    warn!(event = type_name::<T>(), skipped, "Bus receiver lagged; resumed at the oldest retained event");
                    return Some(event);
                },
                Err(RecvError::Lagged(n)) => skipped = skipped.saturating_add(n),
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
