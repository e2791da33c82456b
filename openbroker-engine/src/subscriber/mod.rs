mod bind;
mod deprovision;
mod provision;
mod unbind;
mod update;

pub use bind::BindWorkSubscriber;
pub use deprovision::DeprovisionWorkSubscriber;
pub use provision::ProvisionWorkSubscriber;
pub use unbind::UnbindWorkSubscriber;
pub use update::UpdateWorkSubscriber;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use openbroker_core::{BindInstance, ServiceInstance};
use openbroker_store::BrokerStore;

use crate::engine::{EngineError, WorkEngine, WorkMessage, WorkTopic};
use crate::events::{Event, EventSink};
use crate::runtime::{BundleRuntime, JobOutcome, JobRequest};

/// Handler bound to one topic. Executes the job a message describes and is
/// the sole writer of the resource's post-job state. Failures are recorded
/// in the store, never returned; the dispatch loop has no notion of a
/// failed message.
#[async_trait]
pub trait WorkSubscriber: Send + Sync {
    async fn on_message(&self, message: WorkMessage);
}

/// Launches a job and awaits its outcome under the configured deadline.
/// A job still running past the deadline is a failure; nothing may stay
/// in progress forever.
pub(crate) async fn run_job(
    runtime: &dyn BundleRuntime,
    events: &dyn EventSink,
    job: JobRequest,
    timeout: Duration,
) -> Result<Option<JsonValue>, String> {
    let resource_id = job.resource_id;
    let kind = job.kind;
    events.emit(Event::JobStarted { resource_id, kind }).await;

    let handle = match runtime.launch(job).await {
        Ok(h) => h,
        Err(e) => return Err(e.to_string()),
    };

    match tokio::time::timeout(timeout, handle.outcome()).await {
        Ok(JobOutcome::Succeeded { output }) => Ok(output),
        Ok(JobOutcome::Failed { cause }) => Err(cause),
        Ok(JobOutcome::StillRunning) => Err("job reported still running at completion".to_string()),
        Err(_) => Err(format!(
            "job exceeded deadline of {}s",
            timeout.as_secs()
        )),
    }
}

pub(crate) async fn write_instance(
    store: &dyn BrokerStore,
    events: &dyn EventSink,
    instance: &ServiceInstance,
) {
    if let Err(e) = store.set_service_instance(instance).await {
        events
            .emit(Event::StoreWriteFailed {
                resource_id: instance.id,
                detail: e.to_string(),
            })
            .await;
    }
}

pub(crate) async fn write_binding(
    store: &dyn BrokerStore,
    events: &dyn EventSink,
    binding: &BindInstance,
) {
    if let Err(e) = store.set_bind_instance(binding).await {
        events
            .emit(Event::StoreWriteFailed {
                resource_id: binding.id,
                detail: e.to_string(),
            })
            .await;
    }
}

/// Wires one subscriber per topic, all sharing the same collaborators.
/// Startup-only; fails if any topic already has a handler.
pub fn attach_default_subscribers(
    engine: &WorkEngine,
    store: Arc<dyn BrokerStore>,
    runtime: Arc<dyn BundleRuntime>,
    events: Arc<dyn EventSink>,
    job_timeout: Duration,
) -> Result<(), EngineError> {
    engine.attach_subscriber(
        Arc::new(ProvisionWorkSubscriber::new(
            store.clone(),
            runtime.clone(),
            events.clone(),
            job_timeout,
        )),
        WorkTopic::Provision,
    )?;
    engine.attach_subscriber(
        Arc::new(DeprovisionWorkSubscriber::new(
            store.clone(),
            runtime.clone(),
            events.clone(),
            job_timeout,
        )),
        WorkTopic::Deprovision,
    )?;
    engine.attach_subscriber(
        Arc::new(UpdateWorkSubscriber::new(
            store.clone(),
            runtime.clone(),
            events.clone(),
            job_timeout,
        )),
        WorkTopic::Update,
    )?;
    engine.attach_subscriber(
        Arc::new(BindWorkSubscriber::new(
            store.clone(),
            runtime.clone(),
            events.clone(),
            job_timeout,
        )),
        WorkTopic::Bind,
    )?;
    engine.attach_subscriber(
        Arc::new(UnbindWorkSubscriber::new(
            store,
            runtime,
            events,
            job_timeout,
        )),
        WorkTopic::Unbind,
    )?;
    Ok(())
}
