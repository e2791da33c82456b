use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use openbroker_core::OperationKind;
use openbroker_store::BrokerStore;

use crate::engine::WorkMessage;
use crate::events::{Event, EventSink};
use crate::runtime::{BundleRuntime, JobRequest};
use crate::subscriber::{run_job, write_instance, WorkSubscriber};

pub struct ProvisionWorkSubscriber {
    store: Arc<dyn BrokerStore>,
    runtime: Arc<dyn BundleRuntime>,
    events: Arc<dyn EventSink>,
    job_timeout: Duration,
}

impl ProvisionWorkSubscriber {
    pub fn new(
        store: Arc<dyn BrokerStore>,
        runtime: Arc<dyn BundleRuntime>,
        events: Arc<dyn EventSink>,
        job_timeout: Duration,
    ) -> Self {
        Self {
            store,
            runtime,
            events,
            job_timeout,
        }
    }
}

#[async_trait]
impl WorkSubscriber for ProvisionWorkSubscriber {
    async fn on_message(&self, message: WorkMessage) {
        let WorkMessage::Provision { mut instance } = message else {
            return;
        };
        let Some(op) = instance.last_operation.take() else {
            return;
        };

        let job = JobRequest {
            kind: OperationKind::Provision,
            resource_id: instance.id,
            namespace: instance.context.namespace.clone(),
            spec_id: instance.spec_id.clone(),
            plan_id: instance.plan_id.clone(),
            payload: instance.parameters.clone().unwrap_or_else(|| json!({})),
        };

        match run_job(
            self.runtime.as_ref(),
            self.events.as_ref(),
            job,
            self.job_timeout,
        )
        .await
        {
            Ok(output) => {
                instance.last_operation = Some(op.succeeded(output.map(|o| o.to_string())));
                write_instance(self.store.as_ref(), self.events.as_ref(), &instance).await;
                self.events
                    .emit(Event::JobSucceeded {
                        resource_id: instance.id,
                        kind: OperationKind::Provision,
                    })
                    .await;
            }
            Err(cause) => {
                instance.last_operation = Some(op.failed(cause.clone()));
                write_instance(self.store.as_ref(), self.events.as_ref(), &instance).await;
                self.events
                    .emit(Event::JobFailed {
                        resource_id: instance.id,
                        kind: OperationKind::Provision,
                        cause,
                    })
                    .await;
            }
        }
    }
}
