use sqlx::PgPool;
use uuid::Uuid;

use crate::models::HealthMetric;

pub struct MetricInput {
    pub glucose_mg_dl: Option<f64>,
    pub systolic: Option<i32>,
    pub diastolic: Option<i32>,
    pub weight_kg: Option<f64>,
    pub notes: Option<String>,
}

pub async fn create(
    pool: &PgPool,
    patient_id: Uuid,
    submitted_by: Uuid,
    input: &MetricInput,
) -> Result<HealthMetric, sqlx::Error> {
    sqlx::query_as::<_, HealthMetric>(
        "INSERT INTO health_metrics (patient_id, glucose_mg_dl, systolic, diastolic, weight_kg, notes, submitted_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(patient_id)
    .bind(input.glucose_mg_dl)
    .bind(input.systolic)
    .bind(input.diastolic)
    .bind(input.weight_kg)
    .bind(input.notes.as_deref())
    .bind(submitted_by)
    .fetch_one(pool)
    .await
}

pub async fn list_by_patient(
    pool: &PgPool,
    patient_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<HealthMetric>, sqlx::Error> {
    sqlx::query_as::<_, HealthMetric>(
        "SELECT * FROM health_metrics WHERE patient_id = $1
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(patient_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}
