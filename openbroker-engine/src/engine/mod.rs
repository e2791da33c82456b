mod message;
mod topic;

pub use message::WorkMessage;
pub use topic::WorkTopic;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;

use crate::events::{Event, EventSink};
use crate::subscriber::WorkSubscriber;

/// Default per-topic buffer. Large enough to absorb a burst, small enough
/// that a stuck subscriber surfaces as backpressure instead of unbounded
/// queue growth.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 20;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("a subscriber is already attached to topic {}", .0.as_str())]
    DuplicateTopic(WorkTopic),

    #[error("no subscriber attached to topic {}", .0.as_str())]
    UnknownTopic(WorkTopic),

    /// Bounded channel full; backpressure signal to the caller.
    #[error("work engine saturated on topic {}", .0.as_str())]
    Saturated(WorkTopic),

    #[error("dispatch loop for topic {} has shut down", .0.as_str())]
    Closed(WorkTopic),
}

/// Topic-based dispatch between "request accepted" and "request executed".
///
/// One bounded channel and one dispatch loop per topic: messages on the
/// same topic run strictly in submission order, distinct topics run in
/// parallel. The engine never touches persisted state; the subscriber it
/// dispatches to is the sole writer of post-job state.
pub struct WorkEngine {
    capacity: usize,
    events: Arc<dyn EventSink>,
    senders: RwLock<HashMap<WorkTopic, mpsc::Sender<WorkMessage>>>,
}

impl WorkEngine {
    pub fn new(capacity: usize, events: Arc<dyn EventSink>) -> Self {
        Self {
            capacity,
            events,
            senders: RwLock::new(HashMap::new()),
        }
    }

    /// Registers the single subscriber for a topic and starts its dispatch
    /// loop. Must be called during startup, before any submission.
    pub fn attach_subscriber(
        &self,
        subscriber: Arc<dyn WorkSubscriber>,
        topic: WorkTopic,
    ) -> Result<(), EngineError> {
        let mut senders = self.senders.write().expect("engine lock poisoned");
        if senders.contains_key(&topic) {
            return Err(EngineError::DuplicateTopic(topic));
        }

        let (tx, mut rx) = mpsc::channel::<WorkMessage>(self.capacity);
        senders.insert(topic, tx);

        let events = self.events.clone();
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                // Each handler runs in its own task so a panic is contained
                // in the JoinError instead of taking the loop down. Awaiting
                // the handle keeps same-topic messages strictly serialized.
                let sub = subscriber.clone();
                let handle = tokio::spawn(async move { sub.on_message(message).await });
                if let Err(e) = handle.await {
                    if e.is_panic() {
                        events
                            .emit(Event::SubscriberPanicked {
                                topic,
                                detail: e.to_string(),
                            })
                            .await;
                    }
                }
            }
        });

        Ok(())
    }

    /// Enqueues a message for asynchronous dispatch. Fails fast when the
    /// topic's buffer is full rather than blocking the accepting request.
    pub fn submit(&self, topic: WorkTopic, message: WorkMessage) -> Result<(), EngineError> {
        let senders = self.senders.read().expect("engine lock poisoned");
        let tx = senders.get(&topic).ok_or(EngineError::UnknownTopic(topic))?;

        match tx.try_send(message) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => Err(EngineError::Saturated(topic)),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(EngineError::Closed(topic)),
        }
    }

    pub fn active_topics(&self) -> Vec<WorkTopic> {
        let senders = self.senders.read().expect("engine lock poisoned");
        let mut topics: Vec<WorkTopic> = senders.keys().copied().collect();
        topics.sort_by_key(|t| t.as_str());
        topics
    }
}
