use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::audit::{AuditModule, Outcome, RequestMeta};
use crate::auth::extractor::AuthUser;
use crate::auth::password;
use crate::db;
use crate::error::AppError;
use crate::models::{AuditRecord, Role, User};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
}

#[derive(Deserialize)]
pub struct ResetPassword {
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct UserQuery {
    pub role: Option<Role>,
}

#[derive(Deserialize)]
pub struct AuditQuery {
    pub module: Option<String>,
    pub actor_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list_users(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<User>>, AppError> {
    auth.require_admin()?;
    let users = match query.role {
        Some(role) => db::users::list_by_role(&state.pool, role).await?,
        None => db::users::list_all(&state.pool).await?,
    };
    Ok(Json(users))
}

pub async fn create_user(
    auth: AuthUser,
    State(state): State<SharedState>,
    meta: RequestMeta,
    Json(req): Json<CreateUser>,
) -> Result<Json<User>, AppError> {
    auth.require_admin()?;

    if req.password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    let user = db::users::create(&state.pool, &req.email, &pw_hash, &req.name, req.role)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("An account with this email already exists".to_string())
            }
            _ => AppError::Database(e),
        })?;

    let meta = meta.with_session(auth.session_id.to_string());
    state
        .audit
        .system_action(
            auth.actor_type(),
            &auth.actor_id(),
            &auth.name,
            AuditModule::UserManagement,
            "create",
            &format!("Created {} account for {}", user.role.as_str(), user.email),
            &meta,
        )
        .await;

    Ok(Json(user))
}

pub async fn delete_user(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    meta: RequestMeta,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_admin()?;

    if id == auth.user_id {
        return Err(AppError::Validation(
            "Cannot delete your own account".to_string(),
        ));
    }

    let user = db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    db::users::delete(&state.pool, id).await?;

    let meta = meta.with_session(auth.session_id.to_string());
    state
        .audit
        .system_action(
            auth.actor_type(),
            &auth.actor_id(),
            &auth.name,
            AuditModule::UserManagement,
            "delete",
            &format!("Deleted {} account for {}", user.role.as_str(), user.email),
            &meta,
        )
        .await;

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}

pub async fn reset_user_password(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    meta: RequestMeta,
    Json(req): Json<ResetPassword>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_admin()?;

    if req.new_password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let user = db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let pw_hash = password::hash(&req.new_password).map_err(AppError::Internal)?;
    db::users::update_password(&state.pool, user.id, &pw_hash).await?;
    db::refresh_tokens::delete_all_for_user(&state.pool, user.id).await?;

    let meta = meta.with_session(auth.session_id.to_string());
    state
        .audit
        .credential_event(
            auth.actor_type(),
            &auth.actor_id(),
            &auth.name,
            Some(&user.id.to_string()),
            "reset",
            &format!("Password reset for {}", user.email),
            Outcome::Success,
            &meta,
        )
        .await;

    Ok(Json(serde_json::json!({ "message": "Password reset" })))
}

/// Paginated audit trail. The recorder never reads; this view goes straight
/// through `db::audit`.
pub async fn audit_trail(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditRecord>>, AppError> {
    auth.require_admin()?;

    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    let offset = query.offset.unwrap_or(0).max(0);

    let records = db::audit::list(
        &state.pool,
        query.module.as_deref(),
        query.actor_id.as_deref(),
        limit,
        offset,
    )
    .await?;

    Ok(Json(records))
}

pub async fn get_ml_settings(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_admin()?;
    let settings = db::ml_settings::get(&state.pool).await?;
    Ok(Json(settings))
}

pub async fn update_ml_settings(
    auth: AuthUser,
    State(state): State<SharedState>,
    meta: RequestMeta,
    Json(settings): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_admin()?;

    if !settings.is_object() {
        return Err(AppError::Validation(
            "Settings must be a JSON object".to_string(),
        ));
    }

    let old = db::ml_settings::get(&state.pool).await?;
    let new = db::ml_settings::update(&state.pool, &settings, auth.user_id).await?;

    let meta = meta.with_session(auth.session_id.to_string());
    state
        .audit
        .ml_settings_change(
            auth.actor_type(),
            &auth.actor_id(),
            &auth.name,
            "update",
            &old,
            &new,
            &meta,
        )
        .await;

    Ok(Json(new))
}
