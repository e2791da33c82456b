use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Catalog entry describing one provisionable service. Serializes directly
/// as an OSB `/v2/catalog` service object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spec {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub bindable: bool,

    // OSB spells this "updateable" on the wire.
    #[serde(default, rename = "plan_updateable")]
    pub plan_updatable: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    pub plans: Vec<Plan>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonValue>,
}

impl Spec {
    pub fn plan(&self, plan_id: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.id == plan_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub free: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonValue>,

    /// Parameter schema advertised to platforms; opaque to the broker core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schemas: Option<JsonValue>,
}
