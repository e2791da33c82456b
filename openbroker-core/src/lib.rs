#![forbid(unsafe_code)]

pub mod error;
pub mod types;
pub mod validate;

pub use crate::error::{BrokerError, Verb};
pub use crate::types::{
    BindInstance, BindRequest, BindResponse, CatalogResponse, Context, DeprovisionResponse,
    ErrorResponse, LastOperationRequest, LastOperationResponse, Operation, OperationKind,
    OperationState, Plan, PreviousValues, ProvisionRequest, ProvisionResponse, ServiceInstance,
    ServiceInstanceResponse, Spec, UnbindResponse, UpdateRequest, UpdateResponse, UserContext,
};
pub use crate::validate::{
    validate_bind, validate_provision, validate_update, ValidationError, Violation,
};
