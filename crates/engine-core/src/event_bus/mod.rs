use model::events::Event;
use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};

type Subscribers = HashMap<TypeId, HashMap<u64, Box<dyn Any + Send + Sync>>>;

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone)]
pub struct Subscription {
    event_type_id: TypeId,
    subscriber_id: u64,
}

/// Typed broadcast of engine events such as full-sync completion.
///
/// Subscribers register a bounded sender per event type. Publishing never
/// waits: a full subscriber channel drops the event for that subscriber.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<RwLock<Subscribers>>,
    next_id: Arc<AtomicU64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe<E: Event>(&self, sender: mpsc::Sender<Arc<E>>) -> Subscription {
        let event_type_id = TypeId::of::<E>();
        let subscriber_id = self.next_id.fetch_add(1, Ordering::Relaxed);

        self.subscribers
            .write()
            .await
            .entry(event_type_id)
            .or_default()
            .insert(subscriber_id, Box::new(sender));

        debug!(
            event_type = std::any::type_name::<E>(),
            subscriber_id, "Subscribed to event"
        );
        Subscription {
            event_type_id,
            subscriber_id,
        }
    }

    /// Delivers `event` to every subscriber of `E`; returns how many accepted it.
    pub async fn publish<E: Event>(&self, event: E) -> usize {
        let event = Arc::new(event);
        let subscribers = self.subscribers.read().await;
        let Some(targets) = subscribers.get(&TypeId::of::<E>()) else {
            debug!(event_type = event.event_type(), "No subscribers for event");
            return 0;
        };

        let mut delivered = 0;
        for (subscriber_id, boxed) in targets {
            let Some(sender) = boxed.downcast_ref::<mpsc::Sender<Arc<E>>>() else {
                warn!(subscriber_id, "Subscriber registered with a mismatched sender");
                continue;
            };
            match sender.try_send(Arc::clone(&event)) {
                Ok(()) => delivered += 1,
                Err(e) => warn!(
                    event_type = event.event_type(),
                    subscriber_id,
                    error = %e,
                    "Dropped event for subscriber"
                ),
            }
        }
        delivered
    }

    pub async fn unsubscribe(&self, subscription: Subscription) {
        let mut subscribers = self.subscribers.write().await;
        if let Some(targets) = subscribers.get_mut(&subscription.event_type_id) {
            targets.remove(&subscription.subscriber_id);
            if targets.is_empty() {
                subscribers.remove(&subscription.event_type_id);
            }
        }
    }

    pub async fn subscriber_count<E: Event>(&self) -> usize {
        self.subscribers
            .read()
            .await
            .get(&TypeId::of::<E>())
            .map_or(0, HashMap::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use model::events::FullSyncCompleted;

    fn completed(job: &str) -> FullSyncCompleted {
        FullSyncCompleted {
            job_id: job.into(),
            meta_id: "m".into(),
            table_group_id: "g".into(),
            success: 1,
            failure: 0,
            end_time: Utc::now(),
        }
    }

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = EventBus::new();
        let (tx, mut rx) = mpsc::channel(4);
        let sub = bus.subscribe::<FullSyncCompleted>(tx).await;

        assert_eq!(bus.publish(completed("job-1")).await, 1);
        assert_eq!(rx.recv().await.unwrap().job_id, "job-1");

        bus.unsubscribe(sub).await;
        assert_eq!(bus.subscriber_count::<FullSyncCompleted>().await, 0);
        assert_eq!(bus.publish(completed("job-2")).await, 0);
    }

    #[tokio::test]
    async fn full_subscriber_does_not_block() {
        let bus = EventBus::new();
        let (tx, _rx) = mpsc::channel(1);
        bus.subscribe::<FullSyncCompleted>(tx).await;

        assert_eq!(bus.publish(completed("a")).await, 1);
        assert_eq!(bus.publish(completed("b")).await, 0);
    }
}
