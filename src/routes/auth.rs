use axum::Json;
use axum::extract::State;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::audit::{ActorType, AuditModule, Outcome, RequestMeta};
use crate::auth::extractor::AuthUser;
use crate::auth::jwt::{Claims, encode_token};
use crate::auth::password;
use crate::config::RegistrationMode;
use crate::db;
use crate::db::patients::PatientInput;
use crate::error::AppError;
use crate::models::Role;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn auth_cookies(access_token: &str, refresh_token: &str) -> CookieJar {
    let access = Cookie::build(("access_token", access_token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(15))
        .build();

    let refresh = Cookie::build(("refresh_token", refresh_token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(7))
        .build();

    CookieJar::new().add(access).add(refresh)
}

fn clear_auth_cookies() -> CookieJar {
    let access = Cookie::build(("access_token", ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    let refresh = Cookie::build(("refresh_token", ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    CookieJar::new().add(access).add(refresh)
}

fn generate_refresh_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Self-registration. The first account ever created becomes the admin;
/// after that, signup creates patient accounts and is only available when
/// `DIATRACK_REGISTRATION=open`.
pub async fn register(
    State(state): State<SharedState>,
    meta: RequestMeta,
    Json(req): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    if req.email.is_empty() || req.password.is_empty() || req.name.is_empty() {
        return Err(AppError::Validation("All fields are required".to_string()));
    }

    if req.password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    // Advisory lock prevents concurrent bootstrap registrations
    let mut tx = state.pool.begin().await?;
    sqlx::query("SELECT pg_advisory_xact_lock(1)")
        .execute(&mut *tx)
        .await?;

    let count = db::users::count_all(&mut *tx).await?;
    let role = if count == 0 {
        Role::Admin
    } else {
        if state.config.registration != RegistrationMode::Open {
            return Err(AppError::Forbidden(
                "Registration is disabled. Contact the clinic.".to_string(),
            ));
        }
        Role::Patient
    };

    let user = db::users::create(&mut *tx, &req.email, &pw_hash, &req.name, role)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("An account with this email already exists".to_string())
            }
            _ => AppError::Database(e),
        })?;

    // Patients get a demographic record linked to their login
    if role == Role::Patient {
        db::patients::create(
            &mut *tx,
            Some(user.id),
            &PatientInput {
                name: &req.name,
                date_of_birth: None,
                phone: None,
                email: Some(&req.email),
                address: None,
                assigned_doctor_id: None,
            },
        )
        .await?;
    }

    tx.commit().await?;

    let session_id = Uuid::new_v4();
    let claims = Claims::new(user.id, user.name.clone(), user.role, session_id);
    let access_token = encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    let refresh = generate_refresh_token();
    let refresh_hash = hash_token(&refresh);
    db::refresh_tokens::create(
        &state.pool,
        user.id,
        &refresh_hash,
        Utc::now() + Duration::days(7),
    )
    .await?;

    let meta = meta.with_session(session_id.to_string());
    state
        .audit
        .system_action(
            user.role.into(),
            &user.id.to_string(),
            &user.name,
            AuditModule::UserManagement,
            "create",
            &format!("Account registered with role {}", user.role.as_str()),
            &meta,
        )
        .await;

    let jar = auth_cookies(&access_token, &refresh);
    Ok((
        jar,
        Json(AuthResponse {
            access_token,
            refresh_token: refresh,
        }),
    ))
}

pub async fn login(
    State(state): State<SharedState>,
    meta: RequestMeta,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    // Rate limit check
    if let Err(retry_after_secs) = state.login_limiter.check(&req.email) {
        return Err(AppError::RateLimited { retry_after_secs });
    }

    let user = match db::users::find_by_email(&state.pool, &req.email).await? {
        Some(user) => user,
        None => {
            state.login_limiter.record_failure(&req.email);
            state
                .audit
                .credential_event(
                    ActorType::System,
                    "unknown",
                    "unknown",
                    None,
                    "failed_login",
                    "Login attempt for unknown email",
                    Outcome::Failure,
                    &meta,
                )
                .await;
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }
    };

    let valid = password::verify(&req.password, &user.password_hash).map_err(AppError::Internal)?;

    if !valid {
        state.login_limiter.record_failure(&req.email);
        state
            .audit
            .credential_event(
                user.role.into(),
                &user.id.to_string(),
                &user.name,
                Some(&user.id.to_string()),
                "failed_login",
                "Invalid password",
                Outcome::Failure,
                &meta,
            )
            .await;
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let session_id = Uuid::new_v4();
    let claims = Claims::new(user.id, user.name.clone(), user.role, session_id);
    let access_token = encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    let refresh = generate_refresh_token();
    let refresh_hash = hash_token(&refresh);
    db::refresh_tokens::create(
        &state.pool,
        user.id,
        &refresh_hash,
        Utc::now() + Duration::days(7),
    )
    .await?;

    let meta = meta.with_session(session_id.to_string());
    state
        .audit
        .auth_event(
            user.role.into(),
            &user.id.to_string(),
            &user.name,
            "login",
            &meta,
        )
        .await;

    let jar = auth_cookies(&access_token, &refresh);
    Ok((
        jar,
        Json(AuthResponse {
            access_token,
            refresh_token: refresh,
        }),
    ))
}

pub async fn refresh(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let refresh_value = jar
        .get("refresh_token")
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::Unauthorized("Missing refresh token".to_string()))?;

    let token_hash = hash_token(&refresh_value);

    let stored = db::refresh_tokens::find_by_hash(&state.pool, &token_hash)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".to_string()))?;

    if stored.used {
        tracing::warn!(
            "Refresh token reuse detected for user {}. Nuking all sessions.",
            stored.user_id
        );
        db::refresh_tokens::delete_all_for_user(&state.pool, stored.user_id).await?;
        return Err(AppError::Unauthorized(
            "Refresh token reuse detected. All sessions revoked.".to_string(),
        ));
    }

    if stored.expires_at < Utc::now() {
        return Err(AppError::Unauthorized("Refresh token expired".to_string()));
    }

    db::refresh_tokens::mark_used(&state.pool, stored.id).await?;

    let user = db::users::find_by_id(&state.pool, stored.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    let session_id = Uuid::new_v4();
    let claims = Claims::new(user.id, user.name.clone(), user.role, session_id);
    let access_token = encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    let new_refresh = generate_refresh_token();
    let new_refresh_hash = hash_token(&new_refresh);
    db::refresh_tokens::create(
        &state.pool,
        user.id,
        &new_refresh_hash,
        Utc::now() + Duration::days(7),
    )
    .await?;

    let new_jar = auth_cookies(&access_token, &new_refresh);
    Ok((
        new_jar,
        Json(AuthResponse {
            access_token,
            refresh_token: new_refresh,
        }),
    ))
}

pub async fn logout(
    State(state): State<SharedState>,
    auth: AuthUser,
    meta: RequestMeta,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    if let Some(cookie) = jar.get("refresh_token") {
        let token_hash = hash_token(cookie.value());
        db::refresh_tokens::delete_by_hash(&state.pool, &token_hash).await?;
    }

    let meta = meta.with_session(auth.session_id.to_string());
    state
        .audit
        .auth_event(
            auth.actor_type(),
            &auth.actor_id(),
            &auth.name,
            "logout",
            &meta,
        )
        .await;

    Ok((
        clear_auth_cookies(),
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

pub async fn change_password(
    State(state): State<SharedState>,
    auth: AuthUser,
    meta: RequestMeta,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    if req.new_password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    let valid =
        password::verify(&req.current_password, &user.password_hash).map_err(AppError::Internal)?;

    if !valid {
        return Err(AppError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    let pw_hash = password::hash(&req.new_password).map_err(AppError::Internal)?;
    db::users::update_password(&state.pool, user.id, &pw_hash).await?;

    // Nuke all existing refresh tokens
    db::refresh_tokens::delete_all_for_user(&state.pool, user.id).await?;

    let meta = meta.with_session(auth.session_id.to_string());
    state
        .audit
        .credential_event(
            auth.actor_type(),
            &auth.actor_id(),
            &auth.name,
            Some(&auth.actor_id()),
            "edit",
            "Password changed",
            Outcome::Success,
            &meta,
        )
        .await;

    // Issue fresh tokens
    let session_id = Uuid::new_v4();
    let claims = Claims::new(user.id, user.name.clone(), user.role, session_id);
    let access_token = encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    let refresh = generate_refresh_token();
    let refresh_hash = hash_token(&refresh);
    db::refresh_tokens::create(
        &state.pool,
        user.id,
        &refresh_hash,
        Utc::now() + Duration::days(7),
    )
    .await?;

    let jar = auth_cookies(&access_token, &refresh);
    Ok((
        jar,
        Json(AuthResponse {
            access_token,
            refresh_token: refresh,
        }),
    ))
}
