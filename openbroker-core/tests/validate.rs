use serde_json::json;

use openbroker_core::{
    validate_bind, validate_provision, validate_update, BindRequest, Context, Plan,
    ProvisionRequest, Spec, UpdateRequest,
};

fn make_spec(bindable: bool, plan_updatable: bool) -> Spec {
    Spec {
        id: "mediawiki".to_string(),
        name: "mediawiki".to_string(),
        description: "wiki".to_string(),
        bindable,
        plan_updatable,
        tags: vec![],
        plans: vec![
            Plan {
                id: "default".to_string(),
                name: "default".to_string(),
                description: "".to_string(),
                free: true,
                metadata: None,
                schemas: None,
            },
            Plan {
                id: "silver".to_string(),
                name: "silver".to_string(),
                description: "".to_string(),
                free: false,
                metadata: None,
                schemas: None,
            },
        ],
        metadata: None,
    }
}

fn provision_request(plan_id: &str, namespace: &str) -> ProvisionRequest {
    ProvisionRequest {
        service_id: "mediawiki".to_string(),
        plan_id: plan_id.to_string(),
        context: Context {
            platform: "kubernetes".to_string(),
            namespace: namespace.to_string(),
        },
        organization_guid: None,
        space_guid: None,
        parameters: None,
    }
}

#[test]
fn valid_provision_passes() {
    let spec = make_spec(true, false);
    assert!(validate_provision(&provision_request("default", "ns"), &spec).is_ok());
}

#[test]
fn provision_with_unknown_plan_fails() {
    let spec = make_spec(true, false);
    let err = validate_provision(&provision_request("gold", "ns"), &spec).unwrap_err();
    assert!(err.violations.iter().any(|v| v.path == "plan_id"));
}

#[test]
fn provision_with_empty_namespace_fails() {
    let spec = make_spec(true, false);
    let err = validate_provision(&provision_request("default", ""), &spec).unwrap_err();
    assert!(err.violations.iter().any(|v| v.path == "context.namespace"));
}

#[test]
fn provision_with_non_object_parameters_fails() {
    let spec = make_spec(true, false);
    let mut req = provision_request("default", "ns");
    req.parameters = Some(json!([1, 2, 3]));
    let err = validate_provision(&req, &spec).unwrap_err();
    assert!(err.violations.iter().any(|v| v.path == "parameters"));
}

#[test]
fn plan_change_requires_an_updatable_service() {
    let req = UpdateRequest {
        service_id: "mediawiki".to_string(),
        plan_id: Some("silver".to_string()),
        context: None,
        parameters: None,
        previous_values: None,
    };

    let frozen = make_spec(true, false);
    let err = validate_update(&req, &frozen).unwrap_err();
    assert!(err
        .violations
        .iter()
        .any(|v| v.message.contains("plan changes")));

    let updatable = make_spec(true, true);
    assert!(validate_update(&req, &updatable).is_ok());
}

#[test]
fn parameter_only_update_is_allowed_on_frozen_plans() {
    let req = UpdateRequest {
        service_id: "mediawiki".to_string(),
        plan_id: None,
        context: None,
        parameters: Some(json!({"size": "large"})),
        previous_values: None,
    };
    let spec = make_spec(true, false);
    assert!(validate_update(&req, &spec).is_ok());
}

#[test]
fn bind_against_unbindable_service_fails() {
    let req = BindRequest {
        service_id: "mediawiki".to_string(),
        plan_id: "default".to_string(),
        app_guid: None,
        parameters: None,
    };

    let unbindable = make_spec(false, false);
    let err = validate_bind(&req, &unbindable).unwrap_err();
    assert!(err.violations.iter().any(|v| v.message.contains("bindable")));

    let bindable = make_spec(true, false);
    assert!(validate_bind(&req, &bindable).is_ok());
}

#[test]
fn violations_are_joined_into_a_description() {
    let spec = make_spec(true, false);
    let mut req = provision_request("gold", "");
    req.parameters = Some(json!("nope"));
    let err = validate_provision(&req, &spec).unwrap_err();

    let description = err.describe();
    assert!(description.contains("plan_id"));
    assert!(description.contains("context.namespace"));
    assert!(description.contains("parameters"));
}
