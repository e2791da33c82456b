use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use openbroker_core::BindInstance;

use crate::postgres::rows::{decode_operation, operation_columns};
use crate::store::StoreError;

#[derive(sqlx::FromRow)]
struct BindingRow {
    id: Uuid,
    instance_id: Uuid,
    parameters: Option<JsonValue>,
    credentials: Option<JsonValue>,
    op_token: Option<Uuid>,
    op_kind: Option<String>,
    op_state: Option<String>,
    op_description: Option<String>,
}

fn row_to_binding(row: BindingRow) -> Result<BindInstance, StoreError> {
    let last_operation =
        decode_operation(row.op_token, row.op_kind, row.op_state, row.op_description)?;

    Ok(BindInstance {
        id: row.id,
        instance_id: row.instance_id,
        parameters: row.parameters,
        credentials: row.credentials,
        last_operation,
    })
}

const SELECT_COLUMNS: &str = r#"
SELECT id, instance_id, parameters, credentials, op_token, op_kind, op_state, op_description
FROM bind_instances
"#;

pub async fn get_bind_instance(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<BindInstance>, StoreError> {
    let row = sqlx::query_as::<_, BindingRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(row_to_binding).transpose()
}

pub async fn set_bind_instance(pool: &PgPool, binding: &BindInstance) -> Result<(), StoreError> {
    let (op_token, op_kind, op_state, op_description) =
        operation_columns(binding.last_operation.as_ref());

    sqlx::query(
        r#"
INSERT INTO bind_instances
  (id, instance_id, parameters, credentials, op_token, op_kind, op_state, op_description)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
ON CONFLICT (id) DO UPDATE SET
  instance_id = EXCLUDED.instance_id,
  parameters = EXCLUDED.parameters,
  credentials = EXCLUDED.credentials,
  op_token = EXCLUDED.op_token,
  op_kind = EXCLUDED.op_kind,
  op_state = EXCLUDED.op_state,
  op_description = EXCLUDED.op_description,
  updated_at = now()
        "#,
    )
    .bind(binding.id)
    .bind(binding.instance_id)
    .bind(&binding.parameters)
    .bind(&binding.credentials)
    .bind(op_token)
    .bind(op_kind)
    .bind(op_state)
    .bind(op_description)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_bind_instance(pool: &PgPool, id: Uuid) -> Result<bool, StoreError> {
    let result = sqlx::query(r#"DELETE FROM bind_instances WHERE id = $1"#)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn instance_bindings(
    pool: &PgPool,
    instance_id: Uuid,
) -> Result<Vec<BindInstance>, StoreError> {
    let rows =
        sqlx::query_as::<_, BindingRow>(&format!("{SELECT_COLUMNS} WHERE instance_id = $1"))
            .bind(instance_id)
            .fetch_all(pool)
            .await?;

    rows.into_iter().map(row_to_binding).collect()
}
