use std::sync::Arc;

use openbroker_core::{BrokerError, OperationKind};
use openbroker_store::{BrokerStore, ResourceRef, StaleOperation};

use crate::engine::{WorkEngine, WorkMessage, WorkTopic};
use crate::events::{Event, EventSink};

/// What to do with resources found mid-operation after a crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryPolicy {
    /// Mark stale operations failed and leave the retry to the client.
    /// The safe default: it assumes nothing about runtime idempotency.
    FailStale,
    /// Re-submit the interrupted job; only sound when the runtime action
    /// is safely retryable.
    Resubmit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    pub scanned: usize,
    pub failed: usize,
    pub resubmitted: usize,
}

/// Startup reconciliation. Must run to completion before the request
/// surface starts accepting work, so a fresh request cannot race recovery
/// on the same resource.
pub struct Recovery {
    store: Arc<dyn BrokerStore>,
    engine: Arc<WorkEngine>,
    events: Arc<dyn EventSink>,
    policy: RecoveryPolicy,
}

impl Recovery {
    pub fn new(
        store: Arc<dyn BrokerStore>,
        engine: Arc<WorkEngine>,
        events: Arc<dyn EventSink>,
        policy: RecoveryPolicy,
    ) -> Self {
        Self {
            store,
            engine,
            events,
            policy,
        }
    }

    pub async fn run(&self) -> Result<RecoveryReport, BrokerError> {
        let stale = self
            .store
            .find_stale_in_progress()
            .await
            .map_err(|e| BrokerError::Store(e.to_string()))?;

        self.events
            .emit(Event::RecoveryStarted { stale: stale.len() })
            .await;

        let mut report = RecoveryReport {
            scanned: stale.len(),
            ..Default::default()
        };

        for op in &stale {
            match self.policy {
                RecoveryPolicy::FailStale => {
                    self.fail_stale(op).await?;
                    report.failed += 1;
                }
                RecoveryPolicy::Resubmit => {
                    if self.resubmit(op).await? {
                        report.resubmitted += 1;
                    } else {
                        report.failed += 1;
                    }
                }
            }
        }

        Ok(report)
    }

    async fn fail_stale(&self, stale: &StaleOperation) -> Result<(), BrokerError> {
        let store_err = |e: openbroker_store::StoreError| BrokerError::Store(e.to_string());

        match stale.resource {
            ResourceRef::Instance(id) => {
                if let Some(mut instance) =
                    self.store.get_service_instance(id).await.map_err(store_err)?
                {
                    if let Some(op) = instance.last_operation.take() {
                        instance.last_operation =
                            Some(op.failed("interrupted by broker restart"));
                        self.store
                            .set_service_instance(&instance)
                            .await
                            .map_err(store_err)?;
                    }
                }
            }
            ResourceRef::Binding(id) => {
                if let Some(mut binding) =
                    self.store.get_bind_instance(id).await.map_err(store_err)?
                {
                    if let Some(op) = binding.last_operation.take() {
                        binding.last_operation =
                            Some(op.failed("interrupted by broker restart"));
                        self.store
                            .set_bind_instance(&binding)
                            .await
                            .map_err(store_err)?;
                    }
                }
            }
        }

        self.events
            .emit(Event::RecoveryResolved {
                resource_id: stale.resource.id(),
                kind: stale.kind,
                action: "failed",
            })
            .await;
        Ok(())
    }

    /// Rebuilds the work message from persisted state and re-submits it.
    /// Falls back to failing the operation when the message cannot be
    /// reconstructed or the engine refuses it.
    async fn resubmit(&self, stale: &StaleOperation) -> Result<bool, BrokerError> {
        let store_err = |e: openbroker_store::StoreError| BrokerError::Store(e.to_string());

        let message = match stale.resource {
            ResourceRef::Instance(id) => {
                let Some(instance) =
                    self.store.get_service_instance(id).await.map_err(store_err)?
                else {
                    return Ok(false);
                };
                match stale.kind {
                    OperationKind::Provision => Some(WorkMessage::Provision { instance }),
                    OperationKind::Deprovision => Some(WorkMessage::Deprovision { instance }),
                    OperationKind::Update => Some(WorkMessage::Update {
                        instance,
                        plan_id: None,
                        parameters: None,
                    }),
                    _ => None,
                }
            }
            ResourceRef::Binding(id) => {
                let Some(binding) = self.store.get_bind_instance(id).await.map_err(store_err)?
                else {
                    return Ok(false);
                };
                let Some(instance) = self
                    .store
                    .get_service_instance(binding.instance_id)
                    .await
                    .map_err(store_err)?
                else {
                    self.fail_stale(stale).await?;
                    return Ok(false);
                };
                match stale.kind {
                    OperationKind::Bind => Some(WorkMessage::Bind { instance, binding }),
                    OperationKind::Unbind => Some(WorkMessage::Unbind { instance, binding }),
                    _ => None,
                }
            }
        };

        let Some(message) = message else {
            self.fail_stale(stale).await?;
            return Ok(false);
        };

        let topic = WorkTopic::for_kind(stale.kind);
        if self.engine.submit(topic, message).is_err() {
            self.fail_stale(stale).await?;
            return Ok(false);
        }

        self.events
            .emit(Event::RecoveryResolved {
                resource_id: stale.resource.id(),
                kind: stale.kind,
                action: "resubmitted",
            })
            .await;
        Ok(true)
    }
}
