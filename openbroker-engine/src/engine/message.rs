use serde_json::Value as JsonValue;
use uuid::Uuid;

use openbroker_core::{BindInstance, ServiceInstance};

use crate::engine::topic::WorkTopic;

/// One unit of queued work. Carries a snapshot of the resource as persisted
/// at acceptance time, so the subscriber can execute the job without the
/// originating request.
#[derive(Debug, Clone)]
pub enum WorkMessage {
    Provision {
        instance: ServiceInstance,
    },
    Deprovision {
        instance: ServiceInstance,
    },
    /// The instance snapshot still holds the pre-update plan/parameters;
    /// the requested changes ride alongside and are only persisted when the
    /// job succeeds.
    Update {
        instance: ServiceInstance,
        plan_id: Option<String>,
        parameters: Option<JsonValue>,
    },
    Bind {
        instance: ServiceInstance,
        binding: BindInstance,
    },
    Unbind {
        instance: ServiceInstance,
        binding: BindInstance,
    },
}

impl WorkMessage {
    pub fn topic(&self) -> WorkTopic {
        match self {
            WorkMessage::Provision { .. } => WorkTopic::Provision,
            WorkMessage::Deprovision { .. } => WorkTopic::Deprovision,
            WorkMessage::Update { .. } => WorkTopic::Update,
            WorkMessage::Bind { .. } => WorkTopic::Bind,
            WorkMessage::Unbind { .. } => WorkTopic::Unbind,
        }
    }

    /// Id of the resource this message operates on (the binding for
    /// bind/unbind, the instance otherwise).
    pub fn resource_id(&self) -> Uuid {
        match self {
            WorkMessage::Provision { instance }
            | WorkMessage::Deprovision { instance }
            | WorkMessage::Update { instance, .. } => instance.id,
            WorkMessage::Bind { binding, .. } | WorkMessage::Unbind { binding, .. } => binding.id,
        }
    }
}
