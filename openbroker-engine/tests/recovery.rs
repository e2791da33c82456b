mod common;

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use common::{make_broker, provision_request, wait_instance_terminal, StubRuntime};
use openbroker_core::{
    BindInstance, Context, Operation, OperationKind, OperationState, ServiceInstance,
};
use openbroker_engine::{
    BrokerConfig, NoOpEventSink, OpenServiceBroker, Recovery, RecoveryPolicy,
};

fn fast_config() -> BrokerConfig {
    BrokerConfig {
        job_timeout: Duration::from_secs(5),
        sync_poll_interval: Duration::from_millis(10),
        ..BrokerConfig::default()
    }
}

fn crashed_instance(id: Uuid) -> ServiceInstance {
    ServiceInstance {
        id,
        spec_id: "mediawiki".to_string(),
        plan_id: "default".to_string(),
        context: Context {
            platform: "kubernetes".to_string(),
            namespace: "default".to_string(),
        },
        parameters: None,
        last_operation: Some(Operation::begin(OperationKind::Provision)),
    }
}

#[tokio::test]
async fn fail_stale_resolves_interrupted_operations() {
    let t = make_broker(fast_config(), StubRuntime::succeeding());
    let id = Uuid::new_v4();
    t.store.put_instance(crashed_instance(id));

    let recovery = Recovery::new(
        t.store.clone(),
        t.engine.clone(),
        Arc::new(NoOpEventSink),
        RecoveryPolicy::FailStale,
    );
    let report = recovery.run().await.unwrap();

    assert_eq!(report.scanned, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.resubmitted, 0);

    let instance = t.store.instances.lock().unwrap().get(&id).cloned().unwrap();
    let op = instance.last_operation.unwrap();
    assert_eq!(op.state, OperationState::Failed);
    assert_eq!(
        op.description.as_deref(),
        Some("interrupted by broker restart")
    );

    // No job ran; the client decides whether to retry.
    assert_eq!(t.runtime.launch_count(), 0);
}

#[tokio::test]
async fn recovered_instance_accepts_a_fresh_retry() {
    let t = make_broker(fast_config(), StubRuntime::succeeding());
    let id = Uuid::new_v4();
    t.store.put_instance(crashed_instance(id));

    Recovery::new(
        t.store.clone(),
        t.engine.clone(),
        Arc::new(NoOpEventSink),
        RecoveryPolicy::FailStale,
    )
    .run()
    .await
    .unwrap();

    // The stale in-progress marker is terminal now, so the concurrency
    // guard admits a retry with identical attributes.
    let resp = t
        .broker
        .provision(id, &provision_request("default", None), None, true)
        .await
        .unwrap();
    assert!(resp.operation.is_some());

    let instance = wait_instance_terminal(&t.store, id).await.unwrap();
    assert_eq!(
        instance.last_operation.unwrap().state,
        OperationState::Succeeded
    );
}

#[tokio::test]
async fn resubmit_policy_reruns_the_interrupted_job() {
    let t = make_broker(fast_config(), StubRuntime::succeeding());
    let id = Uuid::new_v4();
    t.store.put_instance(crashed_instance(id));

    let report = Recovery::new(
        t.store.clone(),
        t.engine.clone(),
        Arc::new(NoOpEventSink),
        RecoveryPolicy::Resubmit,
    )
    .run()
    .await
    .unwrap();

    assert_eq!(report.scanned, 1);
    assert_eq!(report.resubmitted, 1);

    let instance = wait_instance_terminal(&t.store, id).await.unwrap();
    assert_eq!(
        instance.last_operation.unwrap().state,
        OperationState::Succeeded
    );
    assert_eq!(t.runtime.launch_count(), 1);
}

#[tokio::test]
async fn resubmit_fails_a_binding_whose_instance_is_gone() {
    let t = make_broker(fast_config(), StubRuntime::succeeding());
    let binding_id = Uuid::new_v4();
    t.store.put_binding(BindInstance {
        id: binding_id,
        instance_id: Uuid::new_v4(),
        parameters: None,
        credentials: None,
        last_operation: Some(Operation::begin(OperationKind::Bind)),
    });

    let report = Recovery::new(
        t.store.clone(),
        t.engine.clone(),
        Arc::new(NoOpEventSink),
        RecoveryPolicy::Resubmit,
    )
    .run()
    .await
    .unwrap();

    assert_eq!(report.scanned, 1);
    assert_eq!(report.resubmitted, 0);
    assert_eq!(report.failed, 1);

    let binding = t
        .store
        .bindings
        .lock()
        .unwrap()
        .get(&binding_id)
        .cloned()
        .unwrap();
    assert_eq!(
        binding.last_operation.unwrap().state,
        OperationState::Failed
    );
    assert_eq!(t.runtime.launch_count(), 0);
}
