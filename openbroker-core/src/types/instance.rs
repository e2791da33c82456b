use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::types::operation::Operation;

/// Cluster context a resource lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    #[serde(default = "Context::default_platform")]
    pub platform: String,

    pub namespace: String,
}

impl Context {
    fn default_platform() -> String {
        "kubernetes".to_string()
    }
}

/// Originating identity forwarded by the platform, consumed by the
/// authorization hook when auto-escalation is disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    pub username: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
}

/// A provisioned (or provisioning) service. The last operation descriptor is
/// part of the instance so that resource and operation state persist in one
/// atomic write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub id: Uuid,

    pub spec_id: String,

    pub plan_id: String,

    pub context: Context,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<JsonValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_operation: Option<Operation>,
}

impl ServiceInstance {
    /// Whether a retry carries the attributes this instance was created with.
    /// Identical attributes make the retry idempotent; anything else is a
    /// conflicting duplicate.
    pub fn same_request(&self, plan_id: &str, parameters: Option<&JsonValue>) -> bool {
        self.plan_id == plan_id && self.parameters.as_ref() == parameters
    }

    pub fn operation_in_flight(&self) -> bool {
        self.last_operation
            .as_ref()
            .is_some_and(|op| !op.is_terminal())
    }
}

/// A binding against a service instance. Holds a back-reference to its
/// owning instance, never the instance itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindInstance {
    pub id: Uuid,

    pub instance_id: Uuid,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<JsonValue>,

    /// Output of a successful bind job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<JsonValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_operation: Option<Operation>,
}

impl BindInstance {
    pub fn same_request(&self, parameters: Option<&JsonValue>) -> bool {
        self.parameters.as_ref() == parameters
    }

    pub fn operation_in_flight(&self) -> bool {
        self.last_operation
            .as_ref()
            .is_some_and(|op| !op.is_terminal())
    }
}
