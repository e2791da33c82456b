mod catalog;
mod instance;
mod operation;
mod requests;
mod responses;

pub use catalog::{Plan, Spec};
pub use instance::{BindInstance, Context, ServiceInstance, UserContext};
pub use operation::{Operation, OperationKind, OperationState};
pub use requests::{
    BindRequest, LastOperationRequest, PreviousValues, ProvisionRequest, UpdateRequest,
};
pub use responses::{
    BindResponse, CatalogResponse, DeprovisionResponse, ErrorResponse, LastOperationResponse,
    ProvisionResponse, ServiceInstanceResponse, UnbindResponse, UpdateResponse,
};
