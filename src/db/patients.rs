use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Patient;

pub struct PatientInput<'a> {
    pub name: &'a str,
    pub date_of_birth: Option<NaiveDate>,
    pub phone: Option<&'a str>,
    pub email: Option<&'a str>,
    pub address: Option<&'a str>,
    pub assigned_doctor_id: Option<Uuid>,
}

pub async fn list(pool: &PgPool) -> Result<Vec<Patient>, sqlx::Error> {
    sqlx::query_as::<_, Patient>("SELECT * FROM patients ORDER BY name")
        .fetch_all(pool)
        .await
}

pub async fn list_by_doctor(pool: &PgPool, doctor_id: Uuid) -> Result<Vec<Patient>, sqlx::Error> {
    sqlx::query_as::<_, Patient>(
        "SELECT * FROM patients WHERE assigned_doctor_id = $1 ORDER BY name",
    )
    .bind(doctor_id)
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Patient>, sqlx::Error> {
    sqlx::query_as::<_, Patient>("SELECT * FROM patients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_user_id(pool: &PgPool, user_id: Uuid) -> Result<Option<Patient>, sqlx::Error> {
    sqlx::query_as::<_, Patient>("SELECT * FROM patients WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    user_id: Option<Uuid>,
    input: &PatientInput<'_>,
) -> Result<Patient, sqlx::Error> {
    sqlx::query_as::<_, Patient>(
        "INSERT INTO patients (user_id, name, date_of_birth, phone, email, address, assigned_doctor_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(user_id)
    .bind(input.name)
    .bind(input.date_of_birth)
    .bind(input.phone)
    .bind(input.email)
    .bind(input.address)
    .bind(input.assigned_doctor_id)
    .fetch_one(executor)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    input: &PatientInput<'_>,
) -> Result<Patient, sqlx::Error> {
    sqlx::query_as::<_, Patient>(
        "UPDATE patients SET name = $2, date_of_birth = $3, phone = $4, email = $5,
         address = $6, assigned_doctor_id = $7, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(input.name)
    .bind(input.date_of_birth)
    .bind(input.phone)
    .bind(input.email)
    .bind(input.address)
    .bind(input.assigned_doctor_id)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM patients WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
