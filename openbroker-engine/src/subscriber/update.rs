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

pub struct UpdateWorkSubscriber {
    store: Arc<dyn BrokerStore>,
    runtime: Arc<dyn BundleRuntime>,
    events: Arc<dyn EventSink>,
    job_timeout: Duration,
}

impl UpdateWorkSubscriber {
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
impl WorkSubscriber for UpdateWorkSubscriber {
    async fn on_message(&self, message: WorkMessage) {
        let WorkMessage::Update {
            mut instance,
            plan_id,
            parameters,
        } = message
        else {
            return;
        };
        let Some(op) = instance.last_operation.take() else {
            return;
        };

        let job = JobRequest {
            kind: OperationKind::Update,
            resource_id: instance.id,
            namespace: instance.context.namespace.clone(),
            spec_id: instance.spec_id.clone(),
            plan_id: plan_id.clone().unwrap_or_else(|| instance.plan_id.clone()),
            payload: parameters
                .clone()
                .or_else(|| instance.parameters.clone())
                .unwrap_or_else(|| json!({})),
        };

        match run_job(
            self.runtime.as_ref(),
            self.events.as_ref(),
            job,
            self.job_timeout,
        )
        .await
        {
            Ok(_) => {
                // The requested changes only land once the job is through;
                // until then the stored instance keeps its old shape.
                if let Some(plan_id) = plan_id {
                    instance.plan_id = plan_id;
                }
                if let Some(parameters) = parameters {
                    instance.parameters = Some(parameters);
                }
                instance.last_operation = Some(op.succeeded(None));
                write_instance(self.store.as_ref(), self.events.as_ref(), &instance).await;
                self.events
                    .emit(Event::JobSucceeded {
                        resource_id: instance.id,
                        kind: OperationKind::Update,
                    })
                    .await;
            }
            Err(cause) => {
                instance.last_operation = Some(op.failed(cause.clone()));
                write_instance(self.store.as_ref(), self.events.as_ref(), &instance).await;
                self.events
                    .emit(Event::JobFailed {
                        resource_id: instance.id,
                        kind: OperationKind::Update,
                        cause,
                    })
                    .await;
            }
        }
    }
}
