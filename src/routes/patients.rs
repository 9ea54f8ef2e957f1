use axum::Json;
use axum::extract::{Path, State};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::audit::{AuditModule, RequestMeta};
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::patients::PatientInput;
use crate::error::AppError;
use crate::models::{Patient, Role};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct PatientRequest {
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub assigned_doctor_id: Option<Uuid>,
}

impl PatientRequest {
    fn as_input(&self) -> PatientInput<'_> {
        PatientInput {
            name: &self.name,
            date_of_birth: self.date_of_birth,
            phone: self.phone.as_deref(),
            email: self.email.as_deref(),
            address: self.address.as_deref(),
            assigned_doctor_id: self.assigned_doctor_id,
        }
    }
}

fn snapshot(patient: &Patient) -> String {
    serde_json::to_string(patient).unwrap_or_default()
}

/// Resolve a patient and check the caller may see it: staff always, a
/// patient only when the record is their own.
pub async fn load_for_read(
    state: &SharedState,
    auth: &AuthUser,
    id: Uuid,
) -> Result<Patient, AppError> {
    let patient = db::patients::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Patient not found".to_string()))?;

    if auth.role == Role::Patient && patient.user_id != Some(auth.user_id) {
        return Err(AppError::Forbidden(
            "Patients may only access their own record".to_string(),
        ));
    }

    Ok(patient)
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Patient>>, AppError> {
    auth.require_staff()?;
    let patients = match auth.role {
        Role::Doctor => db::patients::list_by_doctor(&state.pool, auth.user_id).await?,
        _ => db::patients::list(&state.pool).await?,
    };
    Ok(Json(patients))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Patient>, AppError> {
    let patient = load_for_read(&state, &auth, id).await?;
    Ok(Json(patient))
}

/// The calling patient's own record.
pub async fn me(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Patient>, AppError> {
    let patient = db::patients::find_by_user_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No patient record for this account".to_string()))?;
    Ok(Json(patient))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    meta: RequestMeta,
    Json(req): Json<PatientRequest>,
) -> Result<Json<Patient>, AppError> {
    auth.require_staff()?;

    if req.name.is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }

    let patient = db::patients::create(&state.pool, None, &req.as_input()).await?;

    let meta = meta.with_session(auth.session_id.to_string());
    state
        .audit
        .patient_data_change(
            auth.actor_type(),
            &auth.actor_id(),
            &auth.name,
            AuditModule::Patients,
            &patient.id.to_string(),
            "create",
            None,
            Some(&snapshot(&patient)),
            &meta,
        )
        .await;

    Ok(Json(patient))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    meta: RequestMeta,
    Json(req): Json<PatientRequest>,
) -> Result<Json<Patient>, AppError> {
    auth.require_staff()?;

    let before = db::patients::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Patient not found".to_string()))?;

    let patient = db::patients::update(&state.pool, id, &req.as_input()).await?;

    let meta = meta.with_session(auth.session_id.to_string());
    state
        .audit
        .patient_data_change(
            auth.actor_type(),
            &auth.actor_id(),
            &auth.name,
            AuditModule::Patients,
            &patient.id.to_string(),
            "edit",
            Some(&snapshot(&before)),
            Some(&snapshot(&patient)),
            &meta,
        )
        .await;

    Ok(Json(patient))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    meta: RequestMeta,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_staff()?;

    let before = db::patients::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Patient not found".to_string()))?;

    db::patients::delete(&state.pool, id).await?;

    let meta = meta.with_session(auth.session_id.to_string());
    state
        .audit
        .patient_data_change(
            auth.actor_type(),
            &auth.actor_id(),
            &auth.name,
            AuditModule::Patients,
            &id.to_string(),
            "delete",
            Some(&snapshot(&before)),
            None,
            &meta,
        )
        .await;

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
