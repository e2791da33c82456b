use async_trait::async_trait;
use uuid::Uuid;

use openbroker_core::{BindInstance, ServiceInstance, Spec};

use crate::store::types::*;

/// Resource Store contract consumed by the orchestrator and the work
/// subscribers. Absence is `Ok(None)`; only infrastructure failures are
/// errors. Each `set_*` persists the resource together with its operation
/// descriptor in a single atomic write.
#[async_trait]
pub trait BrokerStore: Send + Sync {
    async fn get_service_instance(&self, id: Uuid) -> Result<Option<ServiceInstance>, StoreError>;

    async fn set_service_instance(&self, instance: &ServiceInstance) -> Result<(), StoreError>;

    /// Returns whether a row was actually removed.
    async fn delete_service_instance(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn get_bind_instance(&self, id: Uuid) -> Result<Option<BindInstance>, StoreError>;

    async fn set_bind_instance(&self, binding: &BindInstance) -> Result<(), StoreError>;

    async fn delete_bind_instance(&self, id: Uuid) -> Result<bool, StoreError>;

    /// All bindings that back-reference the given instance (live-binding
    /// check before deprovision).
    async fn instance_bindings(&self, instance_id: Uuid) -> Result<Vec<BindInstance>, StoreError>;

    async fn get_spec(&self, id: &str) -> Result<Option<Spec>, StoreError>;

    async fn batch_get_specs(&self) -> Result<Vec<Spec>, StoreError>;

    async fn set_spec(&self, spec: &Spec) -> Result<(), StoreError>;

    async fn delete_spec(&self, id: &str) -> Result<bool, StoreError>;

    async fn delete_specs(&self) -> Result<u64, StoreError>;

    /// Resources left mid-operation by a prior crash (used by recovery).
    async fn find_stale_in_progress(&self) -> Result<Vec<StaleOperation>, StoreError>;

    async fn append_event(&self, event: NewBrokerEvent) -> Result<(), StoreError>;

    async fn get_events_after(
        &self,
        resource_id: Uuid,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<BrokerEvent>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store error: {0}")]
    Other(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Other(e.to_string())
    }
}
