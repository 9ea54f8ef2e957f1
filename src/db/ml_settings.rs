use sqlx::PgPool;
use uuid::Uuid;

/// Risk-model configuration is a single row (id = 1), seeded by migration.
pub async fn get(pool: &PgPool) -> Result<serde_json::Value, sqlx::Error> {
    let row: (serde_json::Value,) = sqlx::query_as("SELECT settings FROM ml_settings WHERE id = 1")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

pub async fn update(
    pool: &PgPool,
    settings: &serde_json::Value,
    updated_by: Uuid,
) -> Result<serde_json::Value, sqlx::Error> {
    let row: (serde_json::Value,) = sqlx::query_as(
        "UPDATE ml_settings SET settings = $1, updated_by = $2, updated_at = now()
         WHERE id = 1 RETURNING settings",
    )
    .bind(settings)
    .bind(updated_by)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}
