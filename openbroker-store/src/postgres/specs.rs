use serde_json::Value as JsonValue;
use sqlx::PgPool;

use openbroker_core::Spec;

use crate::store::StoreError;

fn doc_to_spec(doc: JsonValue) -> Result<Spec, StoreError> {
    serde_json::from_value(doc).map_err(|e| StoreError::Other(format!("corrupt spec: {e}")))
}

pub async fn get_spec(pool: &PgPool, id: &str) -> Result<Option<Spec>, StoreError> {
    let rec: Option<(JsonValue,)> = sqlx::query_as(r#"SELECT doc FROM specs WHERE id = $1"#)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    rec.map(|(doc,)| doc_to_spec(doc)).transpose()
}

pub async fn batch_get_specs(pool: &PgPool) -> Result<Vec<Spec>, StoreError> {
    let recs: Vec<(JsonValue,)> = sqlx::query_as(r#"SELECT doc FROM specs ORDER BY id"#)
        .fetch_all(pool)
        .await?;

    recs.into_iter().map(|(doc,)| doc_to_spec(doc)).collect()
}

pub async fn set_spec(pool: &PgPool, spec: &Spec) -> Result<(), StoreError> {
    let doc = serde_json::to_value(spec).map_err(|e| StoreError::Other(e.to_string()))?;

    sqlx::query(
        r#"
INSERT INTO specs (id, doc) VALUES ($1, $2)
ON CONFLICT (id) DO UPDATE SET doc = EXCLUDED.doc
        "#,
    )
    .bind(&spec.id)
    .bind(doc)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_spec(pool: &PgPool, id: &str) -> Result<bool, StoreError> {
    let result = sqlx::query(r#"DELETE FROM specs WHERE id = $1"#)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_specs(pool: &PgPool) -> Result<u64, StoreError> {
    let result = sqlx::query(r#"DELETE FROM specs"#).execute(pool).await?;
    Ok(result.rows_affected())
}
