use async_trait::async_trait;
use uuid::Uuid;

use openbroker_core::{
    BindInstance, BindRequest, BindResponse, BrokerError, CatalogResponse, DeprovisionResponse,
    LastOperationRequest, LastOperationResponse, ProvisionRequest, ProvisionResponse,
    ServiceInstance, Spec, UnbindResponse, UpdateRequest, UpdateResponse, UserContext,
};

/// The OSB-facing capability interface. The HTTP edge and the CLI depend on
/// this, never on a concrete broker.
#[async_trait]
pub trait OpenServiceBroker: Send + Sync {
    async fn catalog(&self) -> Result<CatalogResponse, BrokerError>;

    async fn provision(
        &self,
        instance_id: Uuid,
        req: &ProvisionRequest,
        user: Option<&UserContext>,
        accepts_incomplete: bool,
    ) -> Result<ProvisionResponse, BrokerError>;

    async fn deprovision(
        &self,
        instance: ServiceInstance,
        plan_id: &str,
        user: Option<&UserContext>,
        accepts_incomplete: bool,
    ) -> Result<DeprovisionResponse, BrokerError>;

    /// The boolean in the result reports whether the bundle path actually
    /// ran asynchronously (bind may short-circuit inline).
    async fn bind(
        &self,
        instance: ServiceInstance,
        binding_id: Uuid,
        req: &BindRequest,
        user: Option<&UserContext>,
        accepts_incomplete: bool,
    ) -> Result<(BindResponse, bool), BrokerError>;

    async fn unbind(
        &self,
        instance: ServiceInstance,
        binding: BindInstance,
        plan_id: &str,
        user: Option<&UserContext>,
        accepts_incomplete: bool,
    ) -> Result<UnbindResponse, BrokerError>;

    async fn update(
        &self,
        instance_id: Uuid,
        req: &UpdateRequest,
        user: Option<&UserContext>,
        accepts_incomplete: bool,
    ) -> Result<UpdateResponse, BrokerError>;

    /// Polls the operation a token refers to. Binding operations are polled
    /// with `binding_id` set. Terminal states are stable: polling never
    /// re-triggers work.
    async fn last_operation(
        &self,
        instance_id: Uuid,
        binding_id: Option<Uuid>,
        req: &LastOperationRequest,
    ) -> Result<LastOperationResponse, BrokerError>;

    async fn get_service_instance(&self, id: Uuid) -> Result<ServiceInstance, BrokerError>;

    async fn get_bind_instance(&self, id: Uuid) -> Result<BindInstance, BrokerError>;

    /// Secondary capability query; implementations that support development
    /// routes opt in by returning themselves.
    fn development(&self) -> Option<&dyn DevelopmentBroker> {
        None
    }
}

/// Development-only catalog manipulation (push a spec straight into the
/// store, remove one, wipe them all).
#[async_trait]
pub trait DevelopmentBroker: Send + Sync {
    async fn add_spec(&self, spec: Spec) -> Result<(), BrokerError>;

    async fn remove_spec(&self, spec_id: &str) -> Result<(), BrokerError>;

    async fn remove_specs(&self) -> Result<u64, BrokerError>;
}
