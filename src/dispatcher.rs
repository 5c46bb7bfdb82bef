// Fan-out of persisted domain events to in-process subscribers. Dispatch
// order follows emission order within one aggregate; ordering across
// aggregates is unspecified.

use parking_lot::RwLock;
use tracing::debug;

use crate::domain::DomainEvent;

type Subscriber = Box<dyn Fn(&DomainEvent) + Send + Sync>;

#[derive(Default)]
pub struct EventDispatcher {
    subscribers: RwLock<Vec<Subscriber>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, subscriber: F)
    where
        F: Fn(&DomainEvent) + Send + Sync + 'static,
    {
        self.subscribers.write().push(Box::new(subscriber));
    }

    /// Deliver a drained event buffer to every subscriber, in order.
    pub fn dispatch_all(&self, events: &[DomainEvent]) {
        if events.is_empty() {
            return;
        }
        let subscribers = self.subscribers.read();
        for event in events {
            debug!(
                aggregate_id = %event.aggregate_id,
                event = event.event_name,
                "dispatching domain event"
            );
            for subscriber in subscribers.iter() {
                subscriber(event);
            }
        }
    }
}
