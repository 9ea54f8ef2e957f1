use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::audit::RequestMeta;
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::Medication;
use crate::routes::patients::load_for_read;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct PrescribeRequest {
    pub name: String,
    pub dosage: String,
    pub frequency: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateMedication {
    pub name: String,
    pub dosage: String,
    pub frequency: Option<String>,
}

pub async fn prescribe(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(patient_id): Path<Uuid>,
    meta: RequestMeta,
    Json(req): Json<PrescribeRequest>,
) -> Result<Json<Medication>, AppError> {
    auth.require_doctor()?;

    if req.name.is_empty() || req.dosage.is_empty() {
        return Err(AppError::Validation(
            "Name and dosage are required".to_string(),
        ));
    }

    let patient = db::patients::find_by_id(&state.pool, patient_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Patient not found".to_string()))?;

    let medication = db::medications::create(
        &state.pool,
        patient.id,
        &req.name,
        &req.dosage,
        req.frequency.as_deref(),
        auth.user_id,
    )
    .await?;

    let meta = meta.with_session(auth.session_id.to_string());
    state
        .audit
        .medication_change(
            auth.actor_type(),
            &auth.actor_id(),
            &auth.name,
            &patient.id.to_string(),
            "create",
            None,
            Some(&medication.describe()),
            &meta,
        )
        .await;

    Ok(Json(medication))
}

pub async fn list_for_patient(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Vec<Medication>>, AppError> {
    let patient = load_for_read(&state, &auth, patient_id).await?;
    let medications = db::medications::list_by_patient(&state.pool, patient.id).await?;
    Ok(Json(medications))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    meta: RequestMeta,
    Json(req): Json<UpdateMedication>,
) -> Result<Json<Medication>, AppError> {
    auth.require_doctor()?;

    let before = db::medications::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Medication not found".to_string()))?;

    let medication = db::medications::update(
        &state.pool,
        id,
        &req.name,
        &req.dosage,
        req.frequency.as_deref(),
    )
    .await?;

    let meta = meta.with_session(auth.session_id.to_string());
    state
        .audit
        .medication_change(
            auth.actor_type(),
            &auth.actor_id(),
            &auth.name,
            &medication.patient_id.to_string(),
            "edit",
            Some(&before.describe()),
            Some(&medication.describe()),
            &meta,
        )
        .await;

    Ok(Json(medication))
}

pub async fn discontinue(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    meta: RequestMeta,
) -> Result<Json<Medication>, AppError> {
    auth.require_doctor()?;

    let before = db::medications::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Medication not found".to_string()))?;

    if !before.active {
        return Err(AppError::Conflict(
            "Medication is already discontinued".to_string(),
        ));
    }

    let medication = db::medications::discontinue(&state.pool, id).await?;

    let meta = meta.with_session(auth.session_id.to_string());
    state
        .audit
        .medication_change(
            auth.actor_type(),
            &auth.actor_id(),
            &auth.name,
            &medication.patient_id.to_string(),
            "delete",
            Some(&before.describe()),
            Some(&format!("{} (discontinued)", medication.describe())),
            &meta,
        )
        .await;

    Ok(Json(medication))
}
