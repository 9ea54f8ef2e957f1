use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::audit::RequestMeta;
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::metrics::MetricInput;
use crate::error::AppError;
use crate::models::HealthMetric;
use crate::routes::patients::load_for_read;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct SubmitMetric {
    pub glucose_mg_dl: Option<f64>,
    pub systolic: Option<i32>,
    pub diastolic: Option<i32>,
    pub weight_kg: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn submit(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(patient_id): Path<Uuid>,
    meta: RequestMeta,
    Json(req): Json<SubmitMetric>,
) -> Result<Json<HealthMetric>, AppError> {
    // Patients may only submit readings for themselves
    let patient = load_for_read(&state, &auth, patient_id).await?;

    if req.glucose_mg_dl.is_none()
        && req.systolic.is_none()
        && req.diastolic.is_none()
        && req.weight_kg.is_none()
    {
        return Err(AppError::Validation(
            "At least one reading is required".to_string(),
        ));
    }

    let input = MetricInput {
        glucose_mg_dl: req.glucose_mg_dl,
        systolic: req.systolic,
        diastolic: req.diastolic,
        weight_kg: req.weight_kg,
        notes: req.notes.clone(),
    };

    let metric = db::metrics::create(&state.pool, patient.id, auth.user_id, &input).await?;

    // The submitted payload, not the stored row, is what gets audited
    let payload = json!({
        "glucose_mg_dl": req.glucose_mg_dl,
        "systolic": req.systolic,
        "diastolic": req.diastolic,
        "weight_kg": req.weight_kg,
        "notes": req.notes,
    });

    let meta = meta.with_session(auth.session_id.to_string());
    state
        .audit
        .metrics_submission(
            auth.actor_type(),
            &auth.actor_id(),
            &auth.name,
            &patient.id.to_string(),
            "create",
            &payload,
            &meta,
        )
        .await;

    Ok(Json(metric))
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(patient_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<HealthMetric>>, AppError> {
    let patient = load_for_read(&state, &auth, patient_id).await?;

    let limit = query.limit.unwrap_or(100).clamp(1, 500);
    let offset = query.offset.unwrap_or(0).max(0);

    let metrics = db::metrics::list_by_patient(&state.pool, patient.id, limit, offset).await?;
    Ok(Json(metrics))
}
