mod common;

use std::time::Duration;

use serde_json::json;
use uuid::Uuid;

use common::{
    make_broker, provision_request, wait_binding_terminal, wait_instance_terminal, StubRuntime,
    TestBroker,
};
use openbroker_core::{BindRequest, BrokerError, OperationState, UpdateRequest};
use openbroker_engine::{BrokerConfig, OpenServiceBroker};

fn fast_config() -> BrokerConfig {
    BrokerConfig {
        job_timeout: Duration::from_secs(5),
        sync_poll_interval: Duration::from_millis(10),
        ..BrokerConfig::default()
    }
}

fn bind_request(parameters: Option<serde_json::Value>) -> BindRequest {
    BindRequest {
        service_id: "mediawiki".to_string(),
        plan_id: "default".to_string(),
        app_guid: None,
        parameters,
    }
}

async fn provisioned(t: &TestBroker) -> Uuid {
    let id = Uuid::new_v4();
    t.broker
        .provision(id, &provision_request("default", None), None, false)
        .await
        .unwrap();
    id
}

#[tokio::test]
async fn inline_bind_returns_credentials_synchronously() {
    let t = make_broker(fast_config(), StubRuntime::succeeding());
    let instance_id = provisioned(&t).await;
    let binding_id = Uuid::new_v4();

    let instance = t.broker.get_service_instance(instance_id).await.unwrap();
    let (resp, ran_async) = t
        .broker
        .bind(
            instance,
            binding_id,
            &bind_request(Some(json!({"user": "wiki"}))),
            None,
            true,
        )
        .await
        .unwrap();

    // launch_bundle_on_bind is off: the bind short-circuits inline.
    assert!(!ran_async);
    let credentials = resp.credentials.unwrap();
    assert_eq!(credentials["user"], "wiki");
    assert_eq!(credentials["instance_id"], instance_id.to_string());

    // No bundle job ran beyond the provision itself.
    assert_eq!(t.runtime.launch_count(), 1);
}

#[tokio::test]
async fn bind_retry_replays_credentials_and_conflicts_reject() {
    let t = make_broker(fast_config(), StubRuntime::succeeding());
    let instance_id = provisioned(&t).await;
    let binding_id = Uuid::new_v4();
    let req = bind_request(Some(json!({"user": "wiki"})));

    let instance = t.broker.get_service_instance(instance_id).await.unwrap();
    let (first, _) = t
        .broker
        .bind(instance.clone(), binding_id, &req, None, true)
        .await
        .unwrap();

    let (second, ran_async) = t
        .broker
        .bind(instance.clone(), binding_id, &req, None, true)
        .await
        .unwrap();
    assert!(!ran_async);
    assert_eq!(first.credentials, second.credentials);

    let err = t
        .broker
        .bind(
            instance,
            binding_id,
            &bind_request(Some(json!({"user": "other"}))),
            None,
            true,
        )
        .await
        .unwrap_err();
    assert_eq!(err, BrokerError::Duplicate);
}

#[tokio::test]
async fn bundle_backed_bind_stores_runtime_credentials() {
    let config = BrokerConfig {
        launch_bundle_on_bind: true,
        ..fast_config()
    };
    let t = make_broker(config, StubRuntime::succeeding());
    let instance_id = provisioned(&t).await;
    let binding_id = Uuid::new_v4();

    let instance = t.broker.get_service_instance(instance_id).await.unwrap();
    let (resp, ran_async) = t
        .broker
        .bind(instance, binding_id, &bind_request(None), None, false)
        .await
        .unwrap();

    assert!(ran_async);
    assert_eq!(resp.credentials.unwrap(), json!({"status": "done"}));

    let binding = t.store.bindings.lock().unwrap().get(&binding_id).cloned();
    assert_eq!(
        binding.unwrap().last_operation.unwrap().state,
        OperationState::Succeeded
    );
}

#[tokio::test]
async fn deprovision_is_blocked_until_bindings_are_gone() {
    let t = make_broker(fast_config(), StubRuntime::succeeding());
    let instance_id = provisioned(&t).await;
    let binding_id = Uuid::new_v4();

    let instance = t.broker.get_service_instance(instance_id).await.unwrap();
    t.broker
        .bind(instance.clone(), binding_id, &bind_request(None), None, true)
        .await
        .unwrap();

    let err = t
        .broker
        .deprovision(instance.clone(), "default", None, true)
        .await
        .unwrap_err();
    assert_eq!(err, BrokerError::BindingExists);

    let binding = t.broker.get_bind_instance(binding_id).await.unwrap();
    t.broker
        .unbind(instance, binding, "default", None, true)
        .await
        .unwrap();

    // Same deprovision now goes through and removes the instance.
    let instance = t.broker.get_service_instance(instance_id).await.unwrap();
    t.broker
        .deprovision(instance, "default", None, false)
        .await
        .unwrap();
    assert!(t.store.instances.lock().unwrap().is_empty());
}

#[tokio::test]
async fn update_applies_changes_only_on_success() {
    let t = make_broker(fast_config(), StubRuntime::succeeding());
    let instance_id = provisioned(&t).await;

    let req = UpdateRequest {
        service_id: "mediawiki".to_string(),
        plan_id: Some("silver".to_string()),
        context: None,
        parameters: Some(json!({"size": "large"})),
        previous_values: None,
    };
    t.broker
        .update(instance_id, &req, None, false)
        .await
        .unwrap();

    let instance = t
        .store
        .instances
        .lock()
        .unwrap()
        .get(&instance_id)
        .cloned()
        .unwrap();
    assert_eq!(instance.plan_id, "silver");
    assert_eq!(instance.parameters, Some(json!({"size": "large"})));
}

#[tokio::test]
async fn failed_update_keeps_the_previous_shape() {
    let t = make_broker(fast_config(), StubRuntime::succeeding());
    let instance_id = provisioned(&t).await;

    // Drive the failure through a second broker seeded with the same
    // instance but wired to a failing runtime.
    let failing = make_broker(fast_config(), StubRuntime::failing("no room"));
    let seeded = t
        .store
        .instances
        .lock()
        .unwrap()
        .get(&instance_id)
        .cloned()
        .unwrap();
    failing.store.put_instance(seeded);

    let req = UpdateRequest {
        service_id: "mediawiki".to_string(),
        plan_id: Some("silver".to_string()),
        context: None,
        parameters: None,
        previous_values: None,
    };
    let resp = failing
        .broker
        .update(instance_id, &req, None, true)
        .await
        .unwrap();
    assert!(resp.operation.is_some());

    let instance = wait_instance_terminal(&failing.store, instance_id)
        .await
        .unwrap();
    assert_eq!(
        instance.last_operation.as_ref().unwrap().state,
        OperationState::Failed
    );
    // The plan change never landed.
    assert_eq!(instance.plan_id, "default");
}

#[tokio::test]
async fn unbind_with_bundle_removes_the_binding() {
    let config = BrokerConfig {
        launch_bundle_on_bind: true,
        ..fast_config()
    };
    let t = make_broker(config, StubRuntime::succeeding());
    let instance_id = provisioned(&t).await;
    let binding_id = Uuid::new_v4();

    let instance = t.broker.get_service_instance(instance_id).await.unwrap();
    t.broker
        .bind(instance.clone(), binding_id, &bind_request(None), None, false)
        .await
        .unwrap();

    let binding = t.broker.get_bind_instance(binding_id).await.unwrap();
    t.broker
        .unbind(instance, binding, "default", None, true)
        .await
        .unwrap();

    assert!(wait_binding_terminal(&t.store, binding_id).await.is_none());
}
