mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use common::{make_broker, provision_request, wait_instance_terminal, StubRuntime};
use openbroker_core::{
    BrokerError, LastOperationRequest, OperationState, UserContext,
};
use openbroker_engine::{
    AuthError, Authorizer, BrokerConfig, Decision, OpenServiceBroker,
};

fn fast_config() -> BrokerConfig {
    BrokerConfig {
        job_timeout: Duration::from_secs(5),
        sync_poll_interval: Duration::from_millis(10),
        ..BrokerConfig::default()
    }
}

fn last_op_request(token: &str) -> LastOperationRequest {
    LastOperationRequest {
        operation: token.to_string(),
        service_id: None,
        plan_id: None,
    }
}

#[tokio::test]
async fn provision_lifecycle_reaches_succeeded_and_polls_are_stable() {
    let t = make_broker(fast_config(), StubRuntime::succeeding());
    let id = Uuid::new_v4();
    let req = provision_request("default", Some(json!({"size": "small"})));

    let resp = t.broker.provision(id, &req, None, true).await.unwrap();
    let token = resp.operation.expect("async accept returns a token");

    let instance = wait_instance_terminal(&t.store, id).await.unwrap();
    assert_eq!(
        instance.last_operation.as_ref().unwrap().state,
        OperationState::Succeeded
    );

    // Polling a finished operation is repeatable and never re-triggers work.
    for _ in 0..3 {
        let poll = t
            .broker
            .last_operation(id, None, &last_op_request(&token))
            .await
            .unwrap();
        assert_eq!(poll.state, "succeeded");
    }
    assert_eq!(t.runtime.launch_count(), 1);
}

#[tokio::test]
async fn identical_provision_retry_is_idempotent() {
    let t = make_broker(fast_config(), StubRuntime::succeeding());
    let id = Uuid::new_v4();
    let req = provision_request("default", Some(json!({"size": "small"})));

    t.broker.provision(id, &req, None, true).await.unwrap();
    wait_instance_terminal(&t.store, id).await.unwrap();

    let err = t.broker.provision(id, &req, None, true).await.unwrap_err();
    assert_eq!(err, BrokerError::AlreadyProvisioned);

    // Exactly one resource, exactly one job.
    assert_eq!(t.store.instances.lock().unwrap().len(), 1);
    assert_eq!(t.runtime.launch_count(), 1);
}

#[tokio::test]
async fn conflicting_provision_is_a_duplicate() {
    let t = make_broker(fast_config(), StubRuntime::succeeding());
    let id = Uuid::new_v4();

    t.broker
        .provision(id, &provision_request("default", None), None, true)
        .await
        .unwrap();
    wait_instance_terminal(&t.store, id).await.unwrap();

    let err = t
        .broker
        .provision(id, &provision_request("silver", None), None, true)
        .await
        .unwrap_err();
    assert_eq!(err, BrokerError::Duplicate);
}

#[tokio::test]
async fn second_operation_while_in_flight_is_rejected() {
    let t = make_broker(
        fast_config(),
        StubRuntime::slow(Duration::from_millis(500)),
    );
    let id = Uuid::new_v4();
    let req = provision_request("default", None);

    t.broker.provision(id, &req, None, true).await.unwrap();

    // Identical retry while the job runs: in progress, not duplicate.
    let err = t.broker.provision(id, &req, None, true).await.unwrap_err();
    assert_eq!(err, BrokerError::ProvisionInProgress);

    // A cross-verb race hits the same guard.
    let instance = t.broker.get_service_instance(id).await.unwrap();
    let err = t
        .broker
        .deprovision(instance, "default", None, true)
        .await
        .unwrap_err();
    assert_eq!(err, BrokerError::ProvisionInProgress);
}

#[tokio::test]
async fn synchronous_provision_returns_after_completion() {
    let t = make_broker(fast_config(), StubRuntime::succeeding());
    let id = Uuid::new_v4();

    let resp = t
        .broker
        .provision(id, &provision_request("default", None), None, false)
        .await
        .unwrap();
    assert!(resp.operation.is_none());

    let instance = t.store.instances.lock().unwrap().get(&id).cloned().unwrap();
    assert_eq!(
        instance.last_operation.unwrap().state,
        OperationState::Succeeded
    );
}

#[tokio::test]
async fn failed_job_surfaces_through_last_operation() {
    let t = make_broker(fast_config(), StubRuntime::failing("bundle exploded"));
    let id = Uuid::new_v4();

    let resp = t
        .broker
        .provision(id, &provision_request("default", None), None, true)
        .await
        .unwrap();
    let token = resp.operation.unwrap();

    let instance = wait_instance_terminal(&t.store, id).await.unwrap();
    assert_eq!(
        instance.last_operation.as_ref().unwrap().state,
        OperationState::Failed
    );

    let poll = t
        .broker
        .last_operation(id, None, &last_op_request(&token))
        .await
        .unwrap();
    assert_eq!(poll.state, "failed");
    assert_eq!(poll.description.as_deref(), Some("bundle exploded"));
}

#[tokio::test]
async fn failed_provision_can_be_retried_with_identical_attributes() {
    let t = make_broker(fast_config(), StubRuntime::failing("bundle exploded"));
    let id = Uuid::new_v4();
    let req = provision_request("default", None);

    t.broker.provision(id, &req, None, true).await.unwrap();
    wait_instance_terminal(&t.store, id).await.unwrap();

    // Same attributes, fresh operation: the retry is accepted.
    let resp = t.broker.provision(id, &req, None, true).await.unwrap();
    assert!(resp.operation.is_some());
    assert_eq!(t.runtime.launch_count(), 2);
}

#[tokio::test]
async fn unknown_plan_is_an_invalid_request() {
    let t = make_broker(fast_config(), StubRuntime::succeeding());
    let err = t
        .broker
        .provision(
            Uuid::new_v4(),
            &provision_request("gold", None),
            None,
            true,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::InvalidRequest(_)));
}

#[tokio::test]
async fn last_operation_rejects_unknown_tokens() {
    let t = make_broker(fast_config(), StubRuntime::succeeding());
    let id = Uuid::new_v4();

    t.broker
        .provision(id, &provision_request("default", None), None, true)
        .await
        .unwrap();
    wait_instance_terminal(&t.store, id).await.unwrap();

    let err = t
        .broker
        .last_operation(id, None, &last_op_request(&Uuid::new_v4().to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::InvalidRequest(_)));
}

#[tokio::test]
async fn saturated_engine_fails_the_operation_cleanly() {
    let config = BrokerConfig {
        channel_capacity: 1,
        ..fast_config()
    };
    let t = make_broker(config, StubRuntime::slow(Duration::from_secs(10)));

    // Push fresh provisions until backpressure hits. The rejected instance
    // must come out failed, not stuck in progress.
    let mut saturated_id = None;
    for _ in 0..10 {
        let id = Uuid::new_v4();
        match t
            .broker
            .provision(id, &provision_request("default", None), None, true)
            .await
        {
            Ok(_) => {}
            Err(BrokerError::EngineSaturated) => {
                saturated_id = Some(id);
                break;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    let id = saturated_id.expect("engine never saturated");
    let instance = t.store.instances.lock().unwrap().get(&id).cloned().unwrap();
    assert_eq!(
        instance.last_operation.unwrap().state,
        OperationState::Failed
    );
}

struct DenyAll;

#[async_trait]
impl Authorizer for DenyAll {
    async fn authorize(&self, user: &UserContext, _ns: &str) -> Result<Decision, AuthError> {
        Ok(Decision::Deny(format!("{} may not act here", user.username)))
    }
}

#[tokio::test]
async fn denied_user_is_rejected_before_any_state_is_written() {
    let t = make_broker(fast_config(), StubRuntime::succeeding());
    let store = t.store.clone();

    let broker = Arc::try_unwrap(t.broker)
        .unwrap_or_else(|_| panic!("broker should be uniquely held"))
        .with_authorizer(Arc::new(DenyAll));

    let user = UserContext {
        username: "mallory".to_string(),
        groups: vec![],
    };
    let err = broker
        .provision(
            Uuid::new_v4(),
            &provision_request("default", None),
            Some(&user),
            true,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, BrokerError::Unauthorized(_)));
    assert!(store.instances.lock().unwrap().is_empty());
    assert_eq!(t.runtime.launch_count(), 0);
}
