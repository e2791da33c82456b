use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use openbroker_core::OperationKind;

/// Identity of a stored resource without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceRef {
    Instance(Uuid),
    Binding(Uuid),
}

impl ResourceRef {
    pub fn id(&self) -> Uuid {
        match self {
            ResourceRef::Instance(id) | ResourceRef::Binding(id) => *id,
        }
    }
}

/// An in-progress operation found in the store at startup.
#[derive(Debug, Clone)]
pub struct StaleOperation {
    pub resource: ResourceRef,
    pub kind: OperationKind,
    pub token: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewBrokerEvent {
    pub resource_id: Option<Uuid>,
    pub event_type: String,
    pub payload: JsonValue,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BrokerEvent {
    pub id: i64,
    pub resource_id: Option<Uuid>,
    pub ts: DateTime<Utc>,
    pub event_type: String,
    pub payload: JsonValue,
}
