#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use openbroker_core::{
    BindInstance, Context, Plan, ProvisionRequest, ServiceInstance, Spec,
};
use openbroker_engine::{
    attach_default_subscribers, Broker, BrokerConfig, BundleRuntime, JobHandle, JobOutcome,
    JobRequest, NoOpEventSink, RuntimeError, WorkEngine,
};
use openbroker_store::{
    BrokerEvent, BrokerStore, NewBrokerEvent, ResourceRef, StaleOperation, StoreError,
};

/// In-memory store backing the engine tests.
#[derive(Default)]
pub struct MemStore {
    pub instances: Mutex<HashMap<Uuid, ServiceInstance>>,
    pub bindings: Mutex<HashMap<Uuid, BindInstance>>,
    pub specs: Mutex<HashMap<String, Spec>>,
    pub events: Mutex<Vec<NewBrokerEvent>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_spec(spec: Spec) -> Self {
        let store = Self::default();
        store.specs.lock().unwrap().insert(spec.id.clone(), spec);
        store
    }

    pub fn put_instance(&self, instance: ServiceInstance) {
        self.instances.lock().unwrap().insert(instance.id, instance);
    }

    pub fn put_binding(&self, binding: BindInstance) {
        self.bindings.lock().unwrap().insert(binding.id, binding);
    }
}

#[async_trait]
impl BrokerStore for MemStore {
    async fn get_service_instance(&self, id: Uuid) -> Result<Option<ServiceInstance>, StoreError> {
        Ok(self.instances.lock().unwrap().get(&id).cloned())
    }

    async fn set_service_instance(&self, instance: &ServiceInstance) -> Result<(), StoreError> {
        self.instances
            .lock()
            .unwrap()
            .insert(instance.id, instance.clone());
        Ok(())
    }

    async fn delete_service_instance(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.instances.lock().unwrap().remove(&id).is_some())
    }

    async fn get_bind_instance(&self, id: Uuid) -> Result<Option<BindInstance>, StoreError> {
        Ok(self.bindings.lock().unwrap().get(&id).cloned())
    }

    async fn set_bind_instance(&self, binding: &BindInstance) -> Result<(), StoreError> {
        self.bindings
            .lock()
            .unwrap()
            .insert(binding.id, binding.clone());
        Ok(())
    }

    async fn delete_bind_instance(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.bindings.lock().unwrap().remove(&id).is_some())
    }

    async fn instance_bindings(&self, instance_id: Uuid) -> Result<Vec<BindInstance>, StoreError> {
        Ok(self
            .bindings
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.instance_id == instance_id)
            .cloned()
            .collect())
    }

    async fn get_spec(&self, id: &str) -> Result<Option<Spec>, StoreError> {
        Ok(self.specs.lock().unwrap().get(id).cloned())
    }

    async fn batch_get_specs(&self) -> Result<Vec<Spec>, StoreError> {
        let mut specs: Vec<Spec> = self.specs.lock().unwrap().values().cloned().collect();
        specs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(specs)
    }

    async fn set_spec(&self, spec: &Spec) -> Result<(), StoreError> {
        self.specs
            .lock()
            .unwrap()
            .insert(spec.id.clone(), spec.clone());
        Ok(())
    }

    async fn delete_spec(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.specs.lock().unwrap().remove(id).is_some())
    }

    async fn delete_specs(&self) -> Result<u64, StoreError> {
        let mut specs = self.specs.lock().unwrap();
        let count = specs.len() as u64;
        specs.clear();
        Ok(count)
    }

    async fn find_stale_in_progress(&self) -> Result<Vec<StaleOperation>, StoreError> {
        let mut stale = Vec::new();
        for instance in self.instances.lock().unwrap().values() {
            if let Some(op) = &instance.last_operation {
                if !op.is_terminal() {
                    stale.push(StaleOperation {
                        resource: ResourceRef::Instance(instance.id),
                        kind: op.kind,
                        token: op.token,
                    });
                }
            }
        }
        for binding in self.bindings.lock().unwrap().values() {
            if let Some(op) = &binding.last_operation {
                if !op.is_terminal() {
                    stale.push(StaleOperation {
                        resource: ResourceRef::Binding(binding.id),
                        kind: op.kind,
                        token: op.token,
                    });
                }
            }
        }
        Ok(stale)
    }

    async fn append_event(&self, event: NewBrokerEvent) -> Result<(), StoreError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }

    async fn get_events_after(
        &self,
        resource_id: Uuid,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<BrokerEvent>, StoreError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .enumerate()
            .filter(|(i, e)| (*i as i64) > after_id && e.resource_id == Some(resource_id))
            .take(limit as usize)
            .map(|(i, e)| BrokerEvent {
                id: i as i64,
                resource_id: e.resource_id,
                ts: Utc::now(),
                event_type: e.event_type.clone(),
                payload: e.payload.clone(),
            })
            .collect())
    }
}

/// Runtime stub with a fixed outcome, optional delay, and a launch log.
pub struct StubRuntime {
    outcome: JobOutcome,
    delay: Option<Duration>,
    launches: Mutex<Vec<JobRequest>>,
}

impl StubRuntime {
    pub fn succeeding() -> Self {
        Self {
            outcome: JobOutcome::Succeeded {
                output: Some(json!({"status": "done"})),
            },
            delay: None,
            launches: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(cause: &str) -> Self {
        Self {
            outcome: JobOutcome::Failed {
                cause: cause.to_string(),
            },
            delay: None,
            launches: Mutex::new(Vec::new()),
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::succeeding()
        }
    }

    pub fn launch_count(&self) -> usize {
        self.launches.lock().unwrap().len()
    }
}

#[async_trait]
impl BundleRuntime for StubRuntime {
    async fn launch(&self, job: JobRequest) -> Result<JobHandle, RuntimeError> {
        self.launches.lock().unwrap().push(job);
        let outcome = self.outcome.clone();
        match self.delay {
            Some(delay) => Ok(JobHandle::new(Box::pin(async move {
                tokio::time::sleep(delay).await;
                outcome
            }))),
            None => Ok(JobHandle::ready(outcome)),
        }
    }
}

pub fn make_spec() -> Spec {
    Spec {
        id: "mediawiki".to_string(),
        name: "mediawiki".to_string(),
        description: "Mediawiki automation bundle".to_string(),
        bindable: true,
        plan_updatable: true,
        tags: vec![],
        plans: vec![
            Plan {
                id: "default".to_string(),
                name: "default".to_string(),
                description: "Default plan".to_string(),
                free: true,
                metadata: None,
                schemas: None,
            },
            Plan {
                id: "silver".to_string(),
                name: "silver".to_string(),
                description: "Bigger plan".to_string(),
                free: false,
                metadata: None,
                schemas: None,
            },
        ],
        metadata: None,
    }
}

pub fn provision_request(plan_id: &str, parameters: Option<JsonValue>) -> ProvisionRequest {
    ProvisionRequest {
        service_id: "mediawiki".to_string(),
        plan_id: plan_id.to_string(),
        context: Context {
            platform: "kubernetes".to_string(),
            namespace: "default".to_string(),
        },
        organization_guid: None,
        space_guid: None,
        parameters,
    }
}

pub struct TestBroker {
    pub broker: Arc<Broker>,
    pub store: Arc<MemStore>,
    pub runtime: Arc<StubRuntime>,
    pub engine: Arc<WorkEngine>,
}

/// Fully wired broker against the in-memory store with all five
/// subscribers attached.
pub fn make_broker(config: BrokerConfig, runtime: StubRuntime) -> TestBroker {
    let store = Arc::new(MemStore::with_spec(make_spec()));
    let runtime = Arc::new(runtime);
    let events = Arc::new(NoOpEventSink);
    let engine = Arc::new(WorkEngine::new(config.channel_capacity, events.clone()));

    attach_default_subscribers(
        &engine,
        store.clone(),
        runtime.clone(),
        events.clone(),
        config.job_timeout,
    )
    .expect("fresh engine must accept subscribers");

    let broker = Arc::new(Broker::new(
        config,
        store.clone(),
        engine.clone(),
        events,
    ));

    TestBroker {
        broker,
        store,
        runtime,
        engine,
    }
}

/// Polls until the instance's operation is terminal (or the instance is
/// gone), failing the test after a bounded wait.
pub async fn wait_instance_terminal(store: &MemStore, id: Uuid) -> Option<ServiceInstance> {
    for _ in 0..200 {
        let instance = store.instances.lock().unwrap().get(&id).cloned();
        match instance {
            None => return None,
            Some(i) => {
                if i.last_operation.as_ref().is_some_and(|op| op.is_terminal()) {
                    return Some(i);
                }
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("instance {id} never reached a terminal state");
}

pub async fn wait_binding_terminal(store: &MemStore, id: Uuid) -> Option<BindInstance> {
    for _ in 0..200 {
        let binding = store.bindings.lock().unwrap().get(&id).cloned();
        match binding {
            None => return None,
            Some(b) => {
                if b.last_operation.as_ref().is_some_and(|op| op.is_terminal()) {
                    return Some(b);
                }
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("binding {id} never reached a terminal state");
}
