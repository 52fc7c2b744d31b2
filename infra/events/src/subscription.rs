use crate::bus::Event;
use crate::receiver::EventReceiverExt;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::trace;

/// Handle to a registered bus listener.
///
/// Once [`Subscription::unsubscribe`] returns (or the handle is dropped) the
/// handler is never invoked again, even for events that were already queued.
///
/// The handler runs while the delivery gate is held, so it must not unsubscribe
/// its own handle.
#[derive(Debug)]
pub struct Subscription {
    gate: Arc<Mutex<bool>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn spawn<T, F, H>(mut receiver: broadcast::Receiver<Arc<T>>, filter: F, mut handler: H) -> Self
    where
        T: Event,
        F: Fn(&T) -> bool + Send + 'static,
        H: FnMut(&T) + Send + 'static,
    {
        let gate = Arc::new(Mutex::new(true));
        let task_gate = Arc::clone(&gate);

        let task = tokio::spawn(async move {
            while let Some(event) = receiver.recv_event().await {
                let open = {
                    let open = task_gate.lock();
                    if *open && filter(&event) {
                        handler(&event);
                    }
                    *open
                };
                if !open {
                    break;
                }
            }
            trace!(event = std::any::type_name::<T>(), "Listener stopped");
        });

        Self { gate, task: Some(task) }
    }

    /// Stop delivery. No handler call starts after this returns.
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        *self.gate.lock() = false;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
