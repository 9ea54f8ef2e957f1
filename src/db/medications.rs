use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Medication;

pub async fn create(
    pool: &PgPool,
    patient_id: Uuid,
    name: &str,
    dosage: &str,
    frequency: Option<&str>,
    prescribed_by: Uuid,
) -> Result<Medication, sqlx::Error> {
    sqlx::query_as::<_, Medication>(
        "INSERT INTO medications (patient_id, name, dosage, frequency, prescribed_by)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(patient_id)
    .bind(name)
    .bind(dosage)
    .bind(frequency)
    .bind(prescribed_by)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Medication>, sqlx::Error> {
    sqlx::query_as::<_, Medication>("SELECT * FROM medications WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_by_patient(pool: &PgPool, patient_id: Uuid) -> Result<Vec<Medication>, sqlx::Error> {
    sqlx::query_as::<_, Medication>(
        "SELECT * FROM medications WHERE patient_id = $1 ORDER BY created_at DESC",
    )
    .bind(patient_id)
    .fetch_all(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    dosage: &str,
    frequency: Option<&str>,
) -> Result<Medication, sqlx::Error> {
    sqlx::query_as::<_, Medication>(
        "UPDATE medications SET name = $2, dosage = $3, frequency = $4, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(dosage)
    .bind(frequency)
    .fetch_one(pool)
    .await
}

pub async fn discontinue(pool: &PgPool, id: Uuid) -> Result<Medication, sqlx::Error> {
    sqlx::query_as::<_, Medication>(
        "UPDATE medications SET active = FALSE, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_one(pool)
    .await
}
