use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::types::{BindRequest, ProvisionRequest, Spec, UpdateRequest};

#[derive(Debug, Error)]
#[error("request failed validation ({violations_len} violations)")]
pub struct ValidationError {
    pub violations: Vec<Violation>,
    violations_len: usize,
}

impl ValidationError {
    pub fn new(violations: Vec<Violation>) -> Self {
        let violations_len = violations.len();
        Self {
            violations,
            violations_len,
        }
    }

    pub fn describe(&self) -> String {
        self.violations
            .iter()
            .map(|v| format!("{}: {}", v.path, v.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

struct Validator {
    violations: Vec<Violation>,
}

impl Validator {
    fn new() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation::new(path, message));
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(self.violations))
        }
    }
}

fn validate_parameters(v: &mut Validator, path: &str, parameters: Option<&JsonValue>) {
    if let Some(params) = parameters {
        if !params.is_object() {
            v.push(path, "must be a JSON object");
        }
    }
}

pub fn validate_provision(req: &ProvisionRequest, spec: &Spec) -> Result<(), ValidationError> {
    let mut v = Validator::new();

    if req.service_id != spec.id {
        v.push("service_id", "does not match the requested spec");
    }
    if spec.plan(&req.plan_id).is_none() {
        v.push("plan_id", "names no plan of this service");
    }
    if req.context.namespace.is_empty() {
        v.push("context.namespace", "must not be empty");
    }
    validate_parameters(&mut v, "parameters", req.parameters.as_ref());

    v.finish()
}

pub fn validate_update(req: &UpdateRequest, spec: &Spec) -> Result<(), ValidationError> {
    let mut v = Validator::new();

    if req.service_id != spec.id {
        v.push("service_id", "does not match the provisioned spec");
    }
    if let Some(plan_id) = &req.plan_id {
        if spec.plan(plan_id).is_none() {
            v.push("plan_id", "names no plan of this service");
        }
        if !spec.plan_updatable {
            v.push("plan_id", "service does not allow plan changes");
        }
    }
    validate_parameters(&mut v, "parameters", req.parameters.as_ref());

    v.finish()
}

pub fn validate_bind(req: &BindRequest, spec: &Spec) -> Result<(), ValidationError> {
    let mut v = Validator::new();

    if req.service_id != spec.id {
        v.push("service_id", "does not match the instance's spec");
    }
    if !spec.bindable {
        v.push("service_id", "service is not bindable");
    }
    if spec.plan(&req.plan_id).is_none() {
        v.push("plan_id", "names no plan of this service");
    }
    validate_parameters(&mut v, "parameters", req.parameters.as_ref());

    v.finish()
}
