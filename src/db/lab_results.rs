use sqlx::PgPool;
use uuid::Uuid;

use crate::models::LabResult;

pub async fn create(
    pool: &PgPool,
    patient_id: Uuid,
    test_name: &str,
    result_data: Option<&serde_json::Value>,
    notes: Option<&str>,
    uploaded_by: Uuid,
) -> Result<LabResult, sqlx::Error> {
    sqlx::query_as::<_, LabResult>(
        "INSERT INTO lab_results (patient_id, test_name, result_data, notes, uploaded_by)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(patient_id)
    .bind(test_name)
    .bind(result_data)
    .bind(notes)
    .bind(uploaded_by)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<LabResult>, sqlx::Error> {
    sqlx::query_as::<_, LabResult>("SELECT * FROM lab_results WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_by_patient(pool: &PgPool, patient_id: Uuid) -> Result<Vec<LabResult>, sqlx::Error> {
    sqlx::query_as::<_, LabResult>(
        "SELECT * FROM lab_results WHERE patient_id = $1 ORDER BY created_at DESC",
    )
    .bind(patient_id)
    .fetch_all(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    test_name: &str,
    result_data: Option<&serde_json::Value>,
    notes: Option<&str>,
) -> Result<LabResult, sqlx::Error> {
    sqlx::query_as::<_, LabResult>(
        "UPDATE lab_results SET test_name = $2, result_data = $3, notes = $4, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(test_name)
    .bind(result_data)
    .bind(notes)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM lab_results WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
