use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use openbroker_core::ServiceInstance;

use crate::postgres::rows::{decode_operation, operation_columns};
use crate::store::StoreError;

#[derive(sqlx::FromRow)]
struct InstanceRow {
    id: Uuid,
    spec_id: String,
    plan_id: String,
    context: JsonValue,
    parameters: Option<JsonValue>,
    op_token: Option<Uuid>,
    op_kind: Option<String>,
    op_state: Option<String>,
    op_description: Option<String>,
}

fn row_to_instance(row: InstanceRow) -> Result<ServiceInstance, StoreError> {
    let context = serde_json::from_value(row.context)
        .map_err(|e| StoreError::Other(format!("corrupt instance context: {e}")))?;
    let last_operation =
        decode_operation(row.op_token, row.op_kind, row.op_state, row.op_description)?;

    Ok(ServiceInstance {
        id: row.id,
        spec_id: row.spec_id,
        plan_id: row.plan_id,
        context,
        parameters: row.parameters,
        last_operation,
    })
}

pub async fn get_service_instance(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<ServiceInstance>, StoreError> {
    let row = sqlx::query_as::<_, InstanceRow>(
        r#"
SELECT id, spec_id, plan_id, context, parameters, op_token, op_kind, op_state, op_description
FROM service_instances WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(row_to_instance).transpose()
}

pub async fn set_service_instance(
    pool: &PgPool,
    instance: &ServiceInstance,
) -> Result<(), StoreError> {
    let context = serde_json::to_value(&instance.context)
        .map_err(|e| StoreError::Other(e.to_string()))?;
    let (op_token, op_kind, op_state, op_description) =
        operation_columns(instance.last_operation.as_ref());

    sqlx::query(
        r#"
INSERT INTO service_instances
  (id, spec_id, plan_id, context, parameters, op_token, op_kind, op_state, op_description)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
ON CONFLICT (id) DO UPDATE SET
  spec_id = EXCLUDED.spec_id,
  plan_id = EXCLUDED.plan_id,
  context = EXCLUDED.context,
  parameters = EXCLUDED.parameters,
  op_token = EXCLUDED.op_token,
  op_kind = EXCLUDED.op_kind,
  op_state = EXCLUDED.op_state,
  op_description = EXCLUDED.op_description,
  updated_at = now()
        "#,
    )
    .bind(instance.id)
    .bind(&instance.spec_id)
    .bind(&instance.plan_id)
    .bind(context)
    .bind(&instance.parameters)
    .bind(op_token)
    .bind(op_kind)
    .bind(op_state)
    .bind(op_description)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_service_instance(pool: &PgPool, id: Uuid) -> Result<bool, StoreError> {
    let result = sqlx::query(r#"DELETE FROM service_instances WHERE id = $1"#)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
