use uuid::Uuid;

use openbroker_core::{
    validate_provision, validate_update, BrokerError, DeprovisionResponse, Operation,
    OperationKind, OperationState, ProvisionRequest, ProvisionResponse, ServiceInstance,
    UpdateRequest, UpdateResponse, UserContext,
};

use crate::broker::{in_progress_error, store_err, Broker, WaitOutcome};
use crate::engine::WorkMessage;
use crate::events::Event;

impl Broker {
    pub(crate) async fn do_provision(
        &self,
        instance_id: Uuid,
        req: &ProvisionRequest,
        user: Option<&UserContext>,
        accepts_incomplete: bool,
    ) -> Result<ProvisionResponse, BrokerError> {
        let spec = self
            .store()
            .get_spec(&req.service_id)
            .await
            .map_err(store_err)?
            .ok_or(BrokerError::NotFound)?;
        validate_provision(req, &spec).map_err(|e| BrokerError::InvalidRequest(e.describe()))?;
        self.authorize(user, &req.context.namespace).await?;

        if let Some(existing) = self
            .store()
            .get_service_instance(instance_id)
            .await
            .map_err(store_err)?
        {
            if !existing.same_request(&req.plan_id, req.parameters.as_ref()) {
                return Err(BrokerError::Duplicate);
            }
            match &existing.last_operation {
                Some(op) if !op.is_terminal() => return Err(in_progress_error(op.kind)),
                Some(op) if op.state == OperationState::Succeeded => {
                    return Err(BrokerError::AlreadyProvisioned)
                }
                // A failed earlier attempt with identical attributes may be
                // retried with a fresh operation.
                _ => {}
            }
        }

        let operation = Operation::begin(OperationKind::Provision);
        let token = operation.token;
        let instance = ServiceInstance {
            id: instance_id,
            spec_id: req.service_id.clone(),
            plan_id: req.plan_id.clone(),
            context: req.context.clone(),
            parameters: req.parameters.clone(),
            last_operation: Some(operation),
        };

        self.store()
            .set_service_instance(&instance)
            .await
            .map_err(store_err)?;
        self.events()
            .emit(Event::OperationAccepted {
                resource_id: instance_id,
                kind: OperationKind::Provision,
                token,
            })
            .await;
        self.submit_instance_work(
            WorkMessage::Provision {
                instance: instance.clone(),
            },
            &instance,
        )
        .await?;

        if accepts_incomplete {
            return Ok(ProvisionResponse {
                dashboard_url: None,
                operation: Some(token.to_string()),
            });
        }

        match self.wait_for_instance(instance_id, token).await? {
            WaitOutcome::Completed(op) if op.state == OperationState::Succeeded => {
                Ok(ProvisionResponse::default())
            }
            WaitOutcome::Completed(op) => Err(BrokerError::JobFailed(
                op.description.unwrap_or_else(|| "provision failed".into()),
            )),
            WaitOutcome::Gone => Err(BrokerError::NotFound),
            WaitOutcome::TimedOut => Err(BrokerError::ProvisionInProgress),
        }
    }

    pub(crate) async fn do_deprovision(
        &self,
        instance: ServiceInstance,
        plan_id: &str,
        user: Option<&UserContext>,
        accepts_incomplete: bool,
    ) -> Result<DeprovisionResponse, BrokerError> {
        if plan_id != instance.plan_id {
            return Err(BrokerError::InvalidRequest(
                "plan_id does not match the provisioned plan".into(),
            ));
        }
        self.authorize(user, &instance.context.namespace).await?;

        let bindings = self
            .store()
            .instance_bindings(instance.id)
            .await
            .map_err(store_err)?;
        if !bindings.is_empty() {
            return Err(BrokerError::BindingExists);
        }

        if let Some(op) = &instance.last_operation {
            if !op.is_terminal() {
                return Err(in_progress_error(op.kind));
            }
        }

        let mut instance = instance;
        let operation = Operation::begin(OperationKind::Deprovision);
        let token = operation.token;
        instance.last_operation = Some(operation);

        self.store()
            .set_service_instance(&instance)
            .await
            .map_err(store_err)?;
        self.events()
            .emit(Event::OperationAccepted {
                resource_id: instance.id,
                kind: OperationKind::Deprovision,
                token,
            })
            .await;
        self.submit_instance_work(
            WorkMessage::Deprovision {
                instance: instance.clone(),
            },
            &instance,
        )
        .await?;

        if accepts_incomplete {
            return Ok(DeprovisionResponse {
                operation: Some(token.to_string()),
            });
        }

        match self.wait_for_instance(instance.id, token).await? {
            // The row disappearing is the success signal for deletion.
            WaitOutcome::Gone => Ok(DeprovisionResponse::default()),
            WaitOutcome::Completed(op) if op.state == OperationState::Succeeded => {
                Ok(DeprovisionResponse::default())
            }
            WaitOutcome::Completed(op) => Err(BrokerError::JobFailed(
                op.description.unwrap_or_else(|| "deprovision failed".into()),
            )),
            WaitOutcome::TimedOut => Err(BrokerError::DeprovisionInProgress),
        }
    }

    pub(crate) async fn do_update(
        &self,
        instance_id: Uuid,
        req: &UpdateRequest,
        user: Option<&UserContext>,
        accepts_incomplete: bool,
    ) -> Result<UpdateResponse, BrokerError> {
        let instance = self
            .store()
            .get_service_instance(instance_id)
            .await
            .map_err(store_err)?
            .ok_or(BrokerError::NotFound)?;
        if req.service_id != instance.spec_id {
            return Err(BrokerError::InvalidRequest(
                "service_id does not match the provisioned spec".into(),
            ));
        }

        let spec = self
            .store()
            .get_spec(&req.service_id)
            .await
            .map_err(store_err)?
            .ok_or(BrokerError::NotFound)?;
        validate_update(req, &spec).map_err(|e| BrokerError::InvalidRequest(e.describe()))?;
        self.authorize(user, &instance.context.namespace).await?;

        if let Some(op) = &instance.last_operation {
            if !op.is_terminal() {
                return Err(in_progress_error(op.kind));
            }
        }

        // The stored instance keeps its pre-update shape; the requested
        // changes travel in the message and land only on job success.
        let mut persisted = instance;
        let operation = Operation::begin(OperationKind::Update);
        let token = operation.token;
        persisted.last_operation = Some(operation);

        self.store()
            .set_service_instance(&persisted)
            .await
            .map_err(store_err)?;
        self.events()
            .emit(Event::OperationAccepted {
                resource_id: instance_id,
                kind: OperationKind::Update,
                token,
            })
            .await;
        self.submit_instance_work(
            WorkMessage::Update {
                instance: persisted.clone(),
                plan_id: req.plan_id.clone(),
                parameters: req.parameters.clone(),
            },
            &persisted,
        )
        .await?;

        if accepts_incomplete {
            return Ok(UpdateResponse {
                operation: Some(token.to_string()),
            });
        }

        match self.wait_for_instance(instance_id, token).await? {
            WaitOutcome::Completed(op) if op.state == OperationState::Succeeded => {
                Ok(UpdateResponse::default())
            }
            WaitOutcome::Completed(op) => Err(BrokerError::JobFailed(
                op.description.unwrap_or_else(|| "update failed".into()),
            )),
            WaitOutcome::Gone => Err(BrokerError::NotFound),
            WaitOutcome::TimedOut => Err(BrokerError::UpdateInProgress),
        }
    }
}
