use log::{debug, info};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use crate::models::ip_event::IpEvent;

/// Fan-out of visit events to live dashboard subscribers.
///
/// Every subscriber owns an unbounded queue, so `publish` never waits on a
/// slow reader. Events are only delivered to subscribers registered at the
/// time of publishing.
#[derive(Default)]
pub struct BroadcastHub {
    subscribers: Mutex<HashMap<Uuid, UnboundedSender<IpEvent>>>,
}

impl BroadcastHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();

        let total = {
            let mut subscribers = self.lock();
            subscribers.insert(id, tx);
            subscribers.len()
        };
        info!("New client connected (ID: {}). Total clients: {}", id, total);

        Subscription {
            id,
            receiver: rx,
            hub: Arc::clone(self),
        }
    }

    pub fn unsubscribe(&self, id: Uuid) {
        let mut subscribers = self.lock();
        if subscribers.remove(&id).is_some() {
            info!(
                "Client disconnected (ID: {}). Remaining clients: {}",
                id,
                subscribers.len()
            );
        }
    }

    /// Queue `event` for every current subscriber. Returns how many got it.
    pub fn publish(&self, event: &IpEvent) -> usize {
        let mut subscribers = self.lock();
        // A closed queue means its stream already went away.
        subscribers.retain(|id, tx| {
            let delivered = tx.send(event.clone()).is_ok();
            if !delivered {
                debug!("Dropping closed subscriber {}", id);
            }
            delivered
        });
        subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, UnboundedSender<IpEvent>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A parked dashboard queue. Dropping it unregisters the queue from the hub.
pub struct Subscription {
    id: Uuid,
    receiver: UnboundedReceiver<IpEvent>,
    hub: Arc<BroadcastHub>,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Wait for the next published event.
    pub async fn recv(&mut self) -> Option<IpEvent> {
        self.receiver.recv().await
    }

    #[cfg(test)]
    pub fn try_recv(&mut self) -> Option<IpEvent> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.id);
    }
}
