pub mod admin;
pub mod appointments;
pub mod auth;
pub mod lab_results;
pub mod medications;
pub mod metrics;
pub mod patients;

use axum::Router;
use axum::routing::{get, post, put};

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/change-password", post(auth::change_password))
        // Patients
        .route(
            "/api/v1/patients",
            get(patients::list).post(patients::create),
        )
        .route("/api/v1/patients/me", get(patients::me))
        .route(
            "/api/v1/patients/{id}",
            get(patients::get)
                .put(patients::update)
                .delete(patients::delete),
        )
        // Health metrics
        .route(
            "/api/v1/patients/{id}/metrics",
            get(metrics::list).post(metrics::submit),
        )
        // Appointments
        .route(
            "/api/v1/patients/{id}/appointments",
            get(appointments::list_for_patient).post(appointments::schedule),
        )
        .route("/api/v1/appointments/me", get(appointments::my_schedule))
        .route(
            "/api/v1/appointments/{id}",
            put(appointments::reschedule).delete(appointments::cancel),
        )
        // Medications
        .route(
            "/api/v1/patients/{id}/medications",
            get(medications::list_for_patient).post(medications::prescribe),
        )
        .route(
            "/api/v1/medications/{id}",
            put(medications::update).delete(medications::discontinue),
        )
        // Lab results
        .route(
            "/api/v1/patients/{id}/lab-results",
            get(lab_results::list_for_patient).post(lab_results::upload),
        )
        .route(
            "/api/v1/lab-results/{id}",
            put(lab_results::update).delete(lab_results::delete),
        )
        // Admin
        .route(
            "/api/v1/admin/users",
            get(admin::list_users).post(admin::create_user),
        )
        .route(
            "/api/v1/admin/users/{id}",
            axum::routing::delete(admin::delete_user),
        )
        .route(
            "/api/v1/admin/users/{id}/reset-password",
            post(admin::reset_user_password),
        )
        .route("/api/v1/admin/audit", get(admin::audit_trail))
        .route(
            "/api/v1/admin/ml-settings",
            get(admin::get_ml_settings).put(admin::update_ml_settings),
        )
}
