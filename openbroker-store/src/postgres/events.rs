use sqlx::PgPool;
use uuid::Uuid;

use crate::store::{BrokerEvent, NewBrokerEvent, StoreError};

pub async fn append_event(pool: &PgPool, event: NewBrokerEvent) -> Result<(), StoreError> {
    sqlx::query(
        r#"
INSERT INTO broker_events (resource_id, event_type, payload)
VALUES ($1, $2, $3)
        "#,
    )
    .bind(event.resource_id)
    .bind(&event.event_type)
    .bind(&event.payload)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_events_after(
    pool: &PgPool,
    resource_id: Uuid,
    after_id: i64,
    limit: i64,
) -> Result<Vec<BrokerEvent>, StoreError> {
    let rows = sqlx::query_as::<_, BrokerEvent>(
        r#"
SELECT id, resource_id, ts, event_type, payload
FROM broker_events
WHERE resource_id = $1 AND id > $2
ORDER BY id
LIMIT $3
        "#,
    )
    .bind(resource_id)
    .bind(after_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
