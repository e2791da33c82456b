mod bindings;
mod instances;
mod interface;

pub use interface::{DevelopmentBroker, OpenServiceBroker};

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use openbroker_core::{
    BindInstance, BindRequest, BindResponse, BrokerError, CatalogResponse, DeprovisionResponse,
    LastOperationRequest, LastOperationResponse, Operation, OperationKind, ProvisionRequest,
    ProvisionResponse, ServiceInstance, Spec, UnbindResponse, UpdateRequest, UpdateResponse,
    UserContext,
};
use openbroker_store::{BrokerStore, StoreError};

use crate::auth::{Authorizer, Decision};
use crate::config::BrokerConfig;
use crate::engine::{EngineError, WorkEngine, WorkMessage};
use crate::events::{Event, EventSink};

/// The OSB state machine. Validates preconditions, writes the in-progress
/// descriptor, hands the job to the work engine, and answers polls. All
/// collaborators are injected at construction; the broker owns no global
/// state.
pub struct Broker {
    config: BrokerConfig,
    store: Arc<dyn BrokerStore>,
    engine: Arc<WorkEngine>,
    events: Arc<dyn EventSink>,
    authorizer: Option<Arc<dyn Authorizer>>,
}

impl Broker {
    pub fn new(
        config: BrokerConfig,
        store: Arc<dyn BrokerStore>,
        engine: Arc<WorkEngine>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            config,
            store,
            engine,
            events,
            authorizer: None,
        }
    }

    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    pub(crate) fn config(&self) -> &BrokerConfig {
        &self.config
    }

    pub(crate) fn store(&self) -> &dyn BrokerStore {
        self.store.as_ref()
    }

    pub(crate) fn events(&self) -> &dyn EventSink {
        self.events.as_ref()
    }

    pub(crate) async fn authorize(
        &self,
        user: Option<&UserContext>,
        namespace: &str,
    ) -> Result<(), BrokerError> {
        if self.config.auto_escalate {
            return Ok(());
        }
        let (Some(authorizer), Some(user)) = (self.authorizer.as_ref(), user) else {
            return Ok(());
        };
        match authorizer.authorize(user, namespace).await {
            Ok(Decision::Allow) => Ok(()),
            Ok(Decision::Deny(reason)) => Err(BrokerError::Unauthorized(reason)),
            Err(e) => Err(BrokerError::Unauthorized(e.to_string())),
        }
    }

    /// Submits instance work, converting engine backpressure into a clean
    /// failure: the just-written in-progress descriptor is rewritten to
    /// failed so backpressure never strands a resource.
    pub(crate) async fn submit_instance_work(
        &self,
        message: WorkMessage,
        instance: &ServiceInstance,
    ) -> Result<(), BrokerError> {
        let topic = message.topic();
        let Err(e) = self.engine.submit(topic, message) else {
            return Ok(());
        };

        let kind = instance
            .last_operation
            .as_ref()
            .map(|op| op.kind)
            .unwrap_or(OperationKind::Provision);
        self.events
            .emit(Event::EngineSaturated {
                resource_id: instance.id,
                kind,
            })
            .await;

        let mut failed = instance.clone();
        if let Some(op) = failed.last_operation.take() {
            failed.last_operation = Some(op.failed(e.to_string()));
            let _ = self.store.set_service_instance(&failed).await;
        }

        Err(match e {
            EngineError::Saturated(_) => BrokerError::EngineSaturated,
            other => BrokerError::Store(other.to_string()),
        })
    }

    pub(crate) async fn submit_binding_work(
        &self,
        message: WorkMessage,
        binding: &BindInstance,
    ) -> Result<(), BrokerError> {
        let topic = message.topic();
        let Err(e) = self.engine.submit(topic, message) else {
            return Ok(());
        };

        let kind = binding
            .last_operation
            .as_ref()
            .map(|op| op.kind)
            .unwrap_or(OperationKind::Bind);
        self.events
            .emit(Event::EngineSaturated {
                resource_id: binding.id,
                kind,
            })
            .await;

        let mut failed = binding.clone();
        if let Some(op) = failed.last_operation.take() {
            failed.last_operation = Some(op.failed(e.to_string()));
            let _ = self.store.set_bind_instance(&failed).await;
        }

        Err(match e {
            EngineError::Saturated(_) => BrokerError::EngineSaturated,
            other => BrokerError::Store(other.to_string()),
        })
    }

    pub(crate) async fn wait_for_instance(
        &self,
        id: Uuid,
        token: Uuid,
    ) -> Result<WaitOutcome, BrokerError> {
        let deadline = tokio::time::Instant::now() + self.config.job_timeout;
        loop {
            match self
                .store
                .get_service_instance(id)
                .await
                .map_err(store_err)?
            {
                None => return Ok(WaitOutcome::Gone),
                Some(instance) => {
                    if let Some(op) = instance.last_operation {
                        if op.token == token && op.is_terminal() {
                            return Ok(WaitOutcome::Completed(op));
                        }
                    }
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(WaitOutcome::TimedOut);
            }
            tokio::time::sleep(self.config.sync_poll_interval).await;
        }
    }

    pub(crate) async fn wait_for_binding(
        &self,
        id: Uuid,
        token: Uuid,
    ) -> Result<WaitOutcome, BrokerError> {
        let deadline = tokio::time::Instant::now() + self.config.job_timeout;
        loop {
            match self.store.get_bind_instance(id).await.map_err(store_err)? {
                None => return Ok(WaitOutcome::Gone),
                Some(binding) => {
                    if let Some(op) = binding.last_operation {
                        if op.token == token && op.is_terminal() {
                            return Ok(WaitOutcome::Completed(op));
                        }
                    }
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(WaitOutcome::TimedOut);
            }
            tokio::time::sleep(self.config.sync_poll_interval).await;
        }
    }
}

/// Result of waiting inline for an operation to leave the in-progress state.
pub(crate) enum WaitOutcome {
    Completed(Operation),
    /// The resource disappeared while waiting (successful delete path).
    Gone,
    TimedOut,
}

pub(crate) fn store_err(e: StoreError) -> BrokerError {
    BrokerError::Store(e.to_string())
}

/// Concurrency-guard error matching the operation currently in flight.
pub(crate) fn in_progress_error(kind: OperationKind) -> BrokerError {
    match kind {
        OperationKind::Provision => BrokerError::ProvisionInProgress,
        OperationKind::Deprovision => BrokerError::DeprovisionInProgress,
        OperationKind::Update => BrokerError::UpdateInProgress,
        OperationKind::Bind => BrokerError::BindInProgress,
        OperationKind::Unbind => BrokerError::UnbindInProgress,
    }
}

#[async_trait]
impl OpenServiceBroker for Broker {
    async fn catalog(&self) -> Result<CatalogResponse, BrokerError> {
        let services = self.store.batch_get_specs().await.map_err(store_err)?;
        Ok(CatalogResponse { services })
    }

    async fn provision(
        &self,
        instance_id: Uuid,
        req: &ProvisionRequest,
        user: Option<&UserContext>,
        accepts_incomplete: bool,
    ) -> Result<ProvisionResponse, BrokerError> {
        self.do_provision(instance_id, req, user, accepts_incomplete)
            .await
    }

    async fn deprovision(
        &self,
        instance: ServiceInstance,
        plan_id: &str,
        user: Option<&UserContext>,
        accepts_incomplete: bool,
    ) -> Result<DeprovisionResponse, BrokerError> {
        self.do_deprovision(instance, plan_id, user, accepts_incomplete)
            .await
    }

    async fn bind(
        &self,
        instance: ServiceInstance,
        binding_id: Uuid,
        req: &BindRequest,
        user: Option<&UserContext>,
        accepts_incomplete: bool,
    ) -> Result<(BindResponse, bool), BrokerError> {
        self.do_bind(instance, binding_id, req, user, accepts_incomplete)
            .await
    }

    async fn unbind(
        &self,
        instance: ServiceInstance,
        binding: BindInstance,
        plan_id: &str,
        user: Option<&UserContext>,
        accepts_incomplete: bool,
    ) -> Result<UnbindResponse, BrokerError> {
        self.do_unbind(instance, binding, plan_id, user, accepts_incomplete)
            .await
    }

    async fn update(
        &self,
        instance_id: Uuid,
        req: &UpdateRequest,
        user: Option<&UserContext>,
        accepts_incomplete: bool,
    ) -> Result<UpdateResponse, BrokerError> {
        self.do_update(instance_id, req, user, accepts_incomplete)
            .await
    }

    async fn last_operation(
        &self,
        instance_id: Uuid,
        binding_id: Option<Uuid>,
        req: &LastOperationRequest,
    ) -> Result<LastOperationResponse, BrokerError> {
        let token = Uuid::parse_str(&req.operation)
            .map_err(|_| BrokerError::InvalidRequest("operation token is not a uuid".into()))?;

        let operation = match binding_id {
            Some(binding_id) => self
                .store
                .get_bind_instance(binding_id)
                .await
                .map_err(store_err)?
                .ok_or(BrokerError::NotFound)?
                .last_operation,
            None => self
                .store
                .get_service_instance(instance_id)
                .await
                .map_err(store_err)?
                .ok_or(BrokerError::NotFound)?
                .last_operation,
        };

        let operation = operation
            .ok_or_else(|| BrokerError::InvalidRequest("resource has no operation".into()))?;
        if operation.token != token {
            return Err(BrokerError::InvalidRequest("unknown operation token".into()));
        }

        Ok(LastOperationResponse {
            state: operation.state.osb_state().to_string(),
            description: operation.description,
        })
    }

    async fn get_service_instance(&self, id: Uuid) -> Result<ServiceInstance, BrokerError> {
        self.store
            .get_service_instance(id)
            .await
            .map_err(store_err)?
            .ok_or(BrokerError::NotFound)
    }

    async fn get_bind_instance(&self, id: Uuid) -> Result<BindInstance, BrokerError> {
        self.store
            .get_bind_instance(id)
            .await
            .map_err(store_err)?
            .ok_or(BrokerError::NotFound)
    }

    fn development(&self) -> Option<&dyn DevelopmentBroker> {
        if self.config.dev_broker {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl DevelopmentBroker for Broker {
    async fn add_spec(&self, spec: Spec) -> Result<(), BrokerError> {
        self.store.set_spec(&spec).await.map_err(store_err)
    }

    async fn remove_spec(&self, spec_id: &str) -> Result<(), BrokerError> {
        let removed = self.store.delete_spec(spec_id).await.map_err(store_err)?;
        if removed {
            Ok(())
        } else {
            Err(BrokerError::NotFound)
        }
    }

    async fn remove_specs(&self) -> Result<u64, BrokerError> {
        self.store.delete_specs().await.map_err(store_err)
    }
}
