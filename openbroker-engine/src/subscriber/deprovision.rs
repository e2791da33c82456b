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

pub struct DeprovisionWorkSubscriber {
    store: Arc<dyn BrokerStore>,
    runtime: Arc<dyn BundleRuntime>,
    events: Arc<dyn EventSink>,
    job_timeout: Duration,
}

impl DeprovisionWorkSubscriber {
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
impl WorkSubscriber for DeprovisionWorkSubscriber {
    async fn on_message(&self, message: WorkMessage) {
        let WorkMessage::Deprovision { mut instance } = message else {
            return;
        };
        let Some(op) = instance.last_operation.take() else {
            return;
        };

        let job = JobRequest {
            kind: OperationKind::Deprovision,
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
            Ok(_) => {
                // Successful deprovision removes the row; a later poll sees
                // the instance gone, which the edge reports as 410/done.
                if let Err(e) = self.store.delete_service_instance(instance.id).await {
                    self.events
                        .emit(Event::StoreWriteFailed {
                            resource_id: instance.id,
                            detail: e.to_string(),
                        })
                        .await;
                    return;
                }
                self.events
                    .emit(Event::JobSucceeded {
                        resource_id: instance.id,
                        kind: OperationKind::Deprovision,
                    })
                    .await;
                self.events
                    .emit(Event::ResourceDeleted {
                        resource_id: instance.id,
                        kind: OperationKind::Deprovision,
                    })
                    .await;
            }
            Err(cause) => {
                instance.last_operation = Some(op.failed(cause.clone()));
                write_instance(self.store.as_ref(), self.events.as_ref(), &instance).await;
                self.events
                    .emit(Event::JobFailed {
                        resource_id: instance.id,
                        kind: OperationKind::Deprovision,
                        cause,
                    })
                    .await;
            }
        }
    }
}
