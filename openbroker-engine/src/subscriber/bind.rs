use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use openbroker_core::OperationKind;
use openbroker_store::BrokerStore;

use crate::engine::WorkMessage;
use crate::events::{Event, EventSink};
use crate::runtime::{BundleRuntime, JobRequest};
use crate::subscriber::{run_job, write_binding, WorkSubscriber};

pub struct BindWorkSubscriber {
    store: Arc<dyn BrokerStore>,
    runtime: Arc<dyn BundleRuntime>,
    events: Arc<dyn EventSink>,
    job_timeout: Duration,
}

impl BindWorkSubscriber {
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
impl WorkSubscriber for BindWorkSubscriber {
    async fn on_message(&self, message: WorkMessage) {
        let WorkMessage::Bind {
            instance,
            mut binding,
        } = message
        else {
            return;
        };
        let Some(op) = binding.last_operation.take() else {
            return;
        };

        let job = JobRequest {
            kind: OperationKind::Bind,
            resource_id: binding.id,
            namespace: instance.context.namespace.clone(),
            spec_id: instance.spec_id.clone(),
            plan_id: instance.plan_id.clone(),
            payload: binding.parameters.clone().unwrap_or_else(|| json!({})),
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
                // Credentials and terminal state land in one row write.
                binding.credentials = Some(output.unwrap_or_else(|| json!({})));
                binding.last_operation = Some(op.succeeded(None));
                write_binding(self.store.as_ref(), self.events.as_ref(), &binding).await;
                self.events
                    .emit(Event::JobSucceeded {
                        resource_id: binding.id,
                        kind: OperationKind::Bind,
                    })
                    .await;
            }
            Err(cause) => {
                binding.last_operation = Some(op.failed(cause.clone()));
                write_binding(self.store.as_ref(), self.events.as_ref(), &binding).await;
                self.events
                    .emit(Event::JobFailed {
                        resource_id: binding.id,
                        kind: OperationKind::Bind,
                        cause,
                    })
                    .await;
            }
        }
    }
}
