use sqlx::PgPool;
use uuid::Uuid;

use openbroker_core::{BindInstance, OperationKind, ServiceInstance, Spec};

use crate::store::{
    BrokerEvent, BrokerStore, NewBrokerEvent, ResourceRef, StaleOperation, StoreError,
};

use super::bindings;
use super::events;
use super::instances;
use super::specs;

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct StaleRow {
    id: Uuid,
    op_kind: String,
    op_token: Uuid,
}

async fn find_stale(
    pool: &PgPool,
    table: &str,
    make_ref: fn(Uuid) -> ResourceRef,
) -> Result<Vec<StaleOperation>, StoreError> {
    let rows = sqlx::query_as::<_, StaleRow>(&format!(
        "SELECT id, op_kind, op_token FROM {table} WHERE op_state = 'in_progress'"
    ))
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            let kind: OperationKind = row.op_kind.parse().map_err(StoreError::Other)?;
            Ok(StaleOperation {
                resource: make_ref(row.id),
                kind,
                token: row.op_token,
            })
        })
        .collect()
}

#[async_trait::async_trait]
impl BrokerStore for PostgresStore {
    async fn get_service_instance(&self, id: Uuid) -> Result<Option<ServiceInstance>, StoreError> {
        instances::get_service_instance(&self.pool, id).await
    }

    async fn set_service_instance(&self, instance: &ServiceInstance) -> Result<(), StoreError> {
        instances::set_service_instance(&self.pool, instance).await
    }

    async fn delete_service_instance(&self, id: Uuid) -> Result<bool, StoreError> {
        instances::delete_service_instance(&self.pool, id).await
    }

    async fn get_bind_instance(&self, id: Uuid) -> Result<Option<BindInstance>, StoreError> {
        bindings::get_bind_instance(&self.pool, id).await
    }

    async fn set_bind_instance(&self, binding: &BindInstance) -> Result<(), StoreError> {
        bindings::set_bind_instance(&self.pool, binding).await
    }

    async fn delete_bind_instance(&self, id: Uuid) -> Result<bool, StoreError> {
        bindings::delete_bind_instance(&self.pool, id).await
    }

    async fn instance_bindings(&self, instance_id: Uuid) -> Result<Vec<BindInstance>, StoreError> {
        bindings::instance_bindings(&self.pool, instance_id).await
    }

    async fn get_spec(&self, id: &str) -> Result<Option<Spec>, StoreError> {
        specs::get_spec(&self.pool, id).await
    }

    async fn batch_get_specs(&self) -> Result<Vec<Spec>, StoreError> {
        specs::batch_get_specs(&self.pool).await
    }

    async fn set_spec(&self, spec: &Spec) -> Result<(), StoreError> {
        specs::set_spec(&self.pool, spec).await
    }

    async fn delete_spec(&self, id: &str) -> Result<bool, StoreError> {
        specs::delete_spec(&self.pool, id).await
    }

    async fn delete_specs(&self) -> Result<u64, StoreError> {
        specs::delete_specs(&self.pool).await
    }

    async fn find_stale_in_progress(&self) -> Result<Vec<StaleOperation>, StoreError> {
        let mut stale =
            find_stale(&self.pool, "service_instances", ResourceRef::Instance).await?;
        stale.extend(find_stale(&self.pool, "bind_instances", ResourceRef::Binding).await?);
        Ok(stale)
    }

    async fn append_event(&self, event: NewBrokerEvent) -> Result<(), StoreError> {
        events::append_event(&self.pool, event).await
    }

    async fn get_events_after(
        &self,
        resource_id: Uuid,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<BrokerEvent>, StoreError> {
        events::get_events_after(&self.pool, resource_id, after_id, limit).await
    }
}
