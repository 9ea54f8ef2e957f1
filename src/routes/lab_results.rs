use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::audit::RequestMeta;
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::LabResult;
use crate::routes::patients::load_for_read;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct UploadLabResult {
    pub test_name: String,
    pub result_data: Option<serde_json::Value>,
    pub notes: Option<String>,
}

fn audit_payload(result: &LabResult) -> serde_json::Value {
    json!({
        "test_name": result.test_name,
        "result_data": result.result_data,
        "notes": result.notes,
    })
}

pub async fn upload(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(patient_id): Path<Uuid>,
    meta: RequestMeta,
    Json(req): Json<UploadLabResult>,
) -> Result<Json<LabResult>, AppError> {
    auth.require_staff()?;

    if req.test_name.is_empty() {
        return Err(AppError::Validation("Test name is required".to_string()));
    }

    let patient = db::patients::find_by_id(&state.pool, patient_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Patient not found".to_string()))?;

    let result = db::lab_results::create(
        &state.pool,
        patient.id,
        &req.test_name,
        req.result_data.as_ref(),
        req.notes.as_deref(),
        auth.user_id,
    )
    .await?;

    let meta = meta.with_session(auth.session_id.to_string());
    state
        .audit
        .lab_result_event(
            auth.actor_type(),
            &auth.actor_id(),
            &auth.name,
            &patient.id.to_string(),
            "upload",
            &audit_payload(&result),
            &meta,
        )
        .await;

    Ok(Json(result))
}

pub async fn list_for_patient(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Vec<LabResult>>, AppError> {
    let patient = load_for_read(&state, &auth, patient_id).await?;
    let results = db::lab_results::list_by_patient(&state.pool, patient.id).await?;
    Ok(Json(results))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    meta: RequestMeta,
    Json(req): Json<UploadLabResult>,
) -> Result<Json<LabResult>, AppError> {
    auth.require_staff()?;

    db::lab_results::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Lab result not found".to_string()))?;

    let result = db::lab_results::update(
        &state.pool,
        id,
        &req.test_name,
        req.result_data.as_ref(),
        req.notes.as_deref(),
    )
    .await?;

    let meta = meta.with_session(auth.session_id.to_string());
    state
        .audit
        .lab_result_event(
            auth.actor_type(),
            &auth.actor_id(),
            &auth.name,
            &result.patient_id.to_string(),
            "update",
            &audit_payload(&result),
            &meta,
        )
        .await;

    Ok(Json(result))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    meta: RequestMeta,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_staff()?;

    let before = db::lab_results::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Lab result not found".to_string()))?;

    db::lab_results::delete(&state.pool, id).await?;

    let meta = meta.with_session(auth.session_id.to_string());
    state
        .audit
        .lab_result_event(
            auth.actor_type(),
            &auth.actor_id(),
            &auth.name,
            &before.patient_id.to_string(),
            "delete",
            &audit_payload(&before),
            &meta,
        )
        .await;

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
