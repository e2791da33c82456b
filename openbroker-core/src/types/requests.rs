use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::types::instance::Context;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisionRequest {
    pub service_id: String,

    pub plan_id: String,

    pub context: Context,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_guid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_guid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<JsonValue>,
}

/// Plan and parameters the platform believes the instance currently has;
/// sent alongside an update so the broker can detect drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviousValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub service_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<JsonValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_values: Option<PreviousValues>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindRequest {
    pub service_id: String,

    pub plan_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_guid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<JsonValue>,
}

/// Query parameters of a last_operation poll. The operation token is
/// required; service and plan ids are advisory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastOperationRequest {
    pub operation: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
}
