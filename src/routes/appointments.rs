use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::audit::RequestMeta;
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::{Appointment, AppointmentStatus, Role};
use crate::routes::patients::load_for_read;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ScheduleRequest {
    pub doctor_id: Option<Uuid>,
    pub scheduled_at: DateTime<Utc>,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct RescheduleRequest {
    pub scheduled_at: DateTime<Utc>,
}

fn detail(appointment: &Appointment) -> String {
    format!(
        "Appointment at {} ({})",
        appointment.scheduled_at.to_rfc3339(),
        appointment.reason.as_deref().unwrap_or("no reason given")
    )
}

pub async fn schedule(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(patient_id): Path<Uuid>,
    meta: RequestMeta,
    Json(req): Json<ScheduleRequest>,
) -> Result<Json<Appointment>, AppError> {
    // Patients may book for themselves, staff for anyone
    let patient = load_for_read(&state, &auth, patient_id).await?;

    if req.scheduled_at < Utc::now() {
        return Err(AppError::Validation(
            "Appointment time must be in the future".to_string(),
        ));
    }

    let appointment = db::appointments::create(
        &state.pool,
        patient.id,
        req.doctor_id,
        req.scheduled_at,
        req.reason.as_deref(),
    )
    .await?;

    let meta = meta.with_session(auth.session_id.to_string());
    state
        .audit
        .appointment_event(
            auth.actor_type(),
            &auth.actor_id(),
            &auth.name,
            &patient.id.to_string(),
            "schedule",
            &detail(&appointment),
            &meta,
        )
        .await;

    Ok(Json(appointment))
}

pub async fn list_for_patient(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let patient = load_for_read(&state, &auth, patient_id).await?;
    let appointments = db::appointments::list_by_patient(&state.pool, patient.id).await?;
    Ok(Json(appointments))
}

/// A doctor's own schedule.
pub async fn my_schedule(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    auth.require_doctor()?;
    let appointments = db::appointments::list_by_doctor(&state.pool, auth.user_id).await?;
    Ok(Json(appointments))
}

async fn load_appointment(
    state: &SharedState,
    auth: &AuthUser,
    id: Uuid,
) -> Result<Appointment, AppError> {
    let appointment = db::appointments::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;

    // Reuse the patient visibility rule for appointment access
    if auth.role == Role::Patient {
        load_for_read(state, auth, appointment.patient_id).await?;
    }

    Ok(appointment)
}

pub async fn reschedule(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    meta: RequestMeta,
    Json(req): Json<RescheduleRequest>,
) -> Result<Json<Appointment>, AppError> {
    let existing = load_appointment(&state, &auth, id).await?;

    if req.scheduled_at < Utc::now() {
        return Err(AppError::Validation(
            "Appointment time must be in the future".to_string(),
        ));
    }

    let appointment = db::appointments::reschedule(&state.pool, existing.id, req.scheduled_at).await?;

    let meta = meta.with_session(auth.session_id.to_string());
    state
        .audit
        .appointment_event(
            auth.actor_type(),
            &auth.actor_id(),
            &auth.name,
            &appointment.patient_id.to_string(),
            "reschedule",
            &format!(
                "Moved from {} to {}",
                existing.scheduled_at.to_rfc3339(),
                appointment.scheduled_at.to_rfc3339()
            ),
            &meta,
        )
        .await;

    Ok(Json(appointment))
}

pub async fn cancel(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    meta: RequestMeta,
) -> Result<Json<Appointment>, AppError> {
    let existing = load_appointment(&state, &auth, id).await?;

    if existing.status == AppointmentStatus::Cancelled {
        return Err(AppError::Conflict(
            "Appointment is already cancelled".to_string(),
        ));
    }

    let appointment =
        db::appointments::set_status(&state.pool, existing.id, AppointmentStatus::Cancelled).await?;

    let meta = meta.with_session(auth.session_id.to_string());
    state
        .audit
        .appointment_event(
            auth.actor_type(),
            &auth.actor_id(),
            &auth.name,
            &appointment.patient_id.to_string(),
            "cancel",
            &detail(&appointment),
            &meta,
        )
        .await;

    Ok(Json(appointment))
}
