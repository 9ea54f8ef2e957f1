use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentStatus};

pub async fn create(
    pool: &PgPool,
    patient_id: Uuid,
    doctor_id: Option<Uuid>,
    scheduled_at: DateTime<Utc>,
    reason: Option<&str>,
) -> Result<Appointment, sqlx::Error> {
    sqlx::query_as::<_, Appointment>(
        "INSERT INTO appointments (patient_id, doctor_id, scheduled_at, reason)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(patient_id)
    .bind(doctor_id)
    .bind(scheduled_at)
    .bind(reason)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Appointment>, sqlx::Error> {
    sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_by_patient(
    pool: &PgPool,
    patient_id: Uuid,
) -> Result<Vec<Appointment>, sqlx::Error> {
    sqlx::query_as::<_, Appointment>(
        "SELECT * FROM appointments WHERE patient_id = $1 ORDER BY scheduled_at",
    )
    .bind(patient_id)
    .fetch_all(pool)
    .await
}

pub async fn list_by_doctor(pool: &PgPool, doctor_id: Uuid) -> Result<Vec<Appointment>, sqlx::Error> {
    sqlx::query_as::<_, Appointment>(
        "SELECT * FROM appointments WHERE doctor_id = $1 ORDER BY scheduled_at",
    )
    .bind(doctor_id)
    .fetch_all(pool)
    .await
}

pub async fn reschedule(
    pool: &PgPool,
    id: Uuid,
    scheduled_at: DateTime<Utc>,
) -> Result<Appointment, sqlx::Error> {
    sqlx::query_as::<_, Appointment>(
        "UPDATE appointments SET scheduled_at = $2, status = 'scheduled', updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(scheduled_at)
    .fetch_one(pool)
    .await
}

pub async fn set_status(
    pool: &PgPool,
    id: Uuid,
    status: AppointmentStatus,
) -> Result<Appointment, sqlx::Error> {
    sqlx::query_as::<_, Appointment>(
        "UPDATE appointments SET status = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status)
    .fetch_one(pool)
    .await
}
