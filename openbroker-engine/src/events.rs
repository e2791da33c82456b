use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use openbroker_core::OperationKind;
use openbroker_store::{BrokerStore, NewBrokerEvent};

use crate::engine::WorkTopic;

#[derive(Debug, Clone)]
pub enum Event {
    OperationAccepted {
        resource_id: Uuid,
        kind: OperationKind,
        token: Uuid,
    },
    JobStarted {
        resource_id: Uuid,
        kind: OperationKind,
    },
    JobSucceeded {
        resource_id: Uuid,
        kind: OperationKind,
    },
    JobFailed {
        resource_id: Uuid,
        kind: OperationKind,
        cause: String,
    },
    ResourceDeleted {
        resource_id: Uuid,
        kind: OperationKind,
    },
    EngineSaturated {
        resource_id: Uuid,
        kind: OperationKind,
    },
    SubscriberPanicked {
        topic: WorkTopic,
        detail: String,
    },
    StoreWriteFailed {
        resource_id: Uuid,
        detail: String,
    },
    RecoveryStarted {
        stale: usize,
    },
    RecoveryResolved {
        resource_id: Uuid,
        kind: OperationKind,
        action: &'static str,
    },
}

impl Event {
    fn parts(&self) -> (Option<Uuid>, &'static str, serde_json::Value) {
        match self {
            Event::OperationAccepted {
                resource_id,
                kind,
                token,
            } => (
                Some(*resource_id),
                "operation.accepted",
                json!({ "kind": kind.as_str(), "token": token.to_string() }),
            ),
            Event::JobStarted { resource_id, kind } => (
                Some(*resource_id),
                "job.started",
                json!({ "kind": kind.as_str() }),
            ),
            Event::JobSucceeded { resource_id, kind } => (
                Some(*resource_id),
                "job.succeeded",
                json!({ "kind": kind.as_str() }),
            ),
            Event::JobFailed {
                resource_id,
                kind,
                cause,
            } => (
                Some(*resource_id),
                "job.failed",
                json!({ "kind": kind.as_str(), "cause": cause }),
            ),
            Event::ResourceDeleted { resource_id, kind } => (
                Some(*resource_id),
                "resource.deleted",
                json!({ "kind": kind.as_str() }),
            ),
            Event::EngineSaturated { resource_id, kind } => (
                Some(*resource_id),
                "engine.saturated",
                json!({ "kind": kind.as_str() }),
            ),
            Event::SubscriberPanicked { topic, detail } => (
                None,
                "subscriber.panicked",
                json!({ "topic": topic.as_str(), "detail": detail }),
            ),
            Event::StoreWriteFailed {
                resource_id,
                detail,
            } => (
                Some(*resource_id),
                "store.write_failed",
                json!({ "detail": detail }),
            ),
            Event::RecoveryStarted { stale } => {
                (None, "recovery.started", json!({ "stale": stale }))
            }
            Event::RecoveryResolved {
                resource_id,
                kind,
                action,
            } => (
                Some(*resource_id),
                "recovery.resolved",
                json!({ "kind": kind.as_str(), "action": action }),
            ),
        }
    }
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: Event);
}

pub struct CompositeEventSink {
    sinks: Vec<Box<dyn EventSink>>,
}

impl Default for CompositeEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositeEventSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }
}

#[async_trait]
impl EventSink for CompositeEventSink {
    async fn emit(&self, event: Event) {
        for sink in &self.sinks {
            sink.emit(event.clone()).await;
        }
    }
}

/// Persists events to the broker's audit table. Write failures are dropped
/// on the floor: the audit trail must never block or fail lifecycle work.
pub struct StoreEventSink {
    store: std::sync::Arc<dyn BrokerStore>,
}

impl StoreEventSink {
    pub fn new(store: std::sync::Arc<dyn BrokerStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EventSink for StoreEventSink {
    async fn emit(&self, event: Event) {
        let (resource_id, event_type, payload) = event.parts();
        let _ = self
            .store
            .append_event(NewBrokerEvent {
                resource_id,
                event_type: event_type.to_string(),
                payload,
            })
            .await;
    }
}

/// JSON lines on stdout.
pub struct StdoutEventSink;

#[async_trait]
impl EventSink for StdoutEventSink {
    async fn emit(&self, event: Event) {
        let (resource_id, event_type, mut payload) = event.parts();
        if let Some(obj) = payload.as_object_mut() {
            obj.insert("type".to_string(), json!(event_type));
            if let Some(id) = resource_id {
                obj.insert("resource_id".to_string(), json!(id.to_string()));
            }
        }
        println!("{}", serde_json::to_string(&payload).unwrap_or_default());
    }
}

pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: Event) {}
}
