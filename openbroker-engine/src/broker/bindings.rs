use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use openbroker_core::{
    validate_bind, BindInstance, BindRequest, BindResponse, BrokerError, Operation, OperationKind,
    OperationState, ServiceInstance, UnbindResponse, UserContext,
};

use crate::broker::{in_progress_error, store_err, Broker, WaitOutcome};
use crate::engine::WorkMessage;
use crate::events::Event;

/// Credentials for the inline (no bundle execution) bind path: coordinates
/// of the instance plus the merged parameters.
fn derive_credentials(instance: &ServiceInstance, parameters: Option<&JsonValue>) -> JsonValue {
    let mut credentials = json!({
        "instance_id": instance.id.to_string(),
        "service_id": instance.spec_id,
        "plan_id": instance.plan_id,
        "namespace": instance.context.namespace,
    });
    if let Some(obj) = credentials.as_object_mut() {
        if let Some(JsonValue::Object(params)) = &instance.parameters {
            for (k, v) in params {
                obj.insert(k.clone(), v.clone());
            }
        }
        if let Some(JsonValue::Object(params)) = parameters {
            for (k, v) in params {
                obj.insert(k.clone(), v.clone());
            }
        }
    }
    credentials
}

impl Broker {
    pub(crate) async fn do_bind(
        &self,
        instance: ServiceInstance,
        binding_id: Uuid,
        req: &BindRequest,
        user: Option<&UserContext>,
        accepts_incomplete: bool,
    ) -> Result<(BindResponse, bool), BrokerError> {
        let spec = self
            .store()
            .get_spec(&req.service_id)
            .await
            .map_err(store_err)?
            .ok_or(BrokerError::NotFound)?;
        validate_bind(req, &spec).map_err(|e| BrokerError::InvalidRequest(e.describe()))?;
        if req.service_id != instance.spec_id {
            return Err(BrokerError::InvalidRequest(
                "service_id does not match the instance's spec".into(),
            ));
        }
        self.authorize(user, &instance.context.namespace).await?;

        if let Some(existing) = self
            .store()
            .get_bind_instance(binding_id)
            .await
            .map_err(store_err)?
        {
            if existing.instance_id != instance.id
                || !existing.same_request(req.parameters.as_ref())
            {
                return Err(BrokerError::Duplicate);
            }
            match &existing.last_operation {
                Some(op) if !op.is_terminal() => return Err(in_progress_error(op.kind)),
                Some(op) if op.state == OperationState::Succeeded => {
                    // Idempotent retry: replay the stored credentials.
                    return Ok((
                        BindResponse {
                            credentials: existing.credentials,
                            operation: None,
                        },
                        false,
                    ));
                }
                _ => {}
            }
        }

        if !self.config().launch_bundle_on_bind {
            // Fast path: no bundle to run, credentials are derived inline
            // and the binding is born in a terminal state.
            let credentials = derive_credentials(&instance, req.parameters.as_ref());
            let binding = BindInstance {
                id: binding_id,
                instance_id: instance.id,
                parameters: req.parameters.clone(),
                credentials: Some(credentials.clone()),
                last_operation: Some(Operation::begin(OperationKind::Bind).succeeded(None)),
            };
            self.store()
                .set_bind_instance(&binding)
                .await
                .map_err(store_err)?;
            self.events()
                .emit(Event::JobSucceeded {
                    resource_id: binding_id,
                    kind: OperationKind::Bind,
                })
                .await;
            return Ok((
                BindResponse {
                    credentials: Some(credentials),
                    operation: None,
                },
                false,
            ));
        }

        let operation = Operation::begin(OperationKind::Bind);
        let token = operation.token;
        let binding = BindInstance {
            id: binding_id,
            instance_id: instance.id,
            parameters: req.parameters.clone(),
            credentials: None,
            last_operation: Some(operation),
        };

        self.store()
            .set_bind_instance(&binding)
            .await
            .map_err(store_err)?;
        self.events()
            .emit(Event::OperationAccepted {
                resource_id: binding_id,
                kind: OperationKind::Bind,
                token,
            })
            .await;
        self.submit_binding_work(
            WorkMessage::Bind {
                instance: instance.clone(),
                binding: binding.clone(),
            },
            &binding,
        )
        .await?;

        if accepts_incomplete {
            return Ok((
                BindResponse {
                    credentials: None,
                    operation: Some(token.to_string()),
                },
                true,
            ));
        }

        match self.wait_for_binding(binding_id, token).await? {
            WaitOutcome::Completed(op) if op.state == OperationState::Succeeded => {
                let refreshed = self
                    .store()
                    .get_bind_instance(binding_id)
                    .await
                    .map_err(store_err)?
                    .ok_or(BrokerError::NotFound)?;
                Ok((
                    BindResponse {
                        credentials: refreshed.credentials,
                        operation: None,
                    },
                    true,
                ))
            }
            WaitOutcome::Completed(op) => Err(BrokerError::JobFailed(
                op.description.unwrap_or_else(|| "bind failed".into()),
            )),
            WaitOutcome::Gone => Err(BrokerError::NotFound),
            WaitOutcome::TimedOut => Err(BrokerError::BindInProgress),
        }
    }

    pub(crate) async fn do_unbind(
        &self,
        instance: ServiceInstance,
        binding: BindInstance,
        plan_id: &str,
        user: Option<&UserContext>,
        accepts_incomplete: bool,
    ) -> Result<UnbindResponse, BrokerError> {
        if binding.instance_id != instance.id {
            return Err(BrokerError::InvalidRequest(
                "binding does not belong to this instance".into(),
            ));
        }
        if plan_id != instance.plan_id {
            return Err(BrokerError::InvalidRequest(
                "plan_id does not match the provisioned plan".into(),
            ));
        }
        self.authorize(user, &instance.context.namespace).await?;

        if let Some(op) = &binding.last_operation {
            if !op.is_terminal() {
                return Err(in_progress_error(op.kind));
            }
        }

        if !self.config().launch_bundle_on_bind {
            self.store()
                .delete_bind_instance(binding.id)
                .await
                .map_err(store_err)?;
            self.events()
                .emit(Event::ResourceDeleted {
                    resource_id: binding.id,
                    kind: OperationKind::Unbind,
                })
                .await;
            return Ok(UnbindResponse::default());
        }

        let mut binding = binding;
        let operation = Operation::begin(OperationKind::Unbind);
        let token = operation.token;
        binding.last_operation = Some(operation);

        self.store()
            .set_bind_instance(&binding)
            .await
            .map_err(store_err)?;
        self.events()
            .emit(Event::OperationAccepted {
                resource_id: binding.id,
                kind: OperationKind::Unbind,
                token,
            })
            .await;
        self.submit_binding_work(
            WorkMessage::Unbind {
                instance: instance.clone(),
                binding: binding.clone(),
            },
            &binding,
        )
        .await?;

        if accepts_incomplete {
            return Ok(UnbindResponse {
                operation: Some(token.to_string()),
            });
        }

        match self.wait_for_binding(binding.id, token).await? {
            WaitOutcome::Gone => Ok(UnbindResponse::default()),
            WaitOutcome::Completed(op) if op.state == OperationState::Succeeded => {
                Ok(UnbindResponse::default())
            }
            WaitOutcome::Completed(op) => Err(BrokerError::JobFailed(
                op.description.unwrap_or_else(|| "unbind failed".into()),
            )),
            WaitOutcome::TimedOut => Err(BrokerError::UnbindInProgress),
        }
    }
}
