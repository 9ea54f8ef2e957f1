use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use serde_json::Value;

use diatrack::error::AppError;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[test]
fn client_errors_map_to_their_status_codes() {
    let cases = [
        (
            AppError::NotFound("x".to_string()),
            StatusCode::NOT_FOUND,
        ),
        (
            AppError::Unauthorized("x".to_string()),
            StatusCode::UNAUTHORIZED,
        ),
        (
            AppError::Forbidden("x".to_string()),
            StatusCode::FORBIDDEN,
        ),
        (
            AppError::Validation("x".to_string()),
            StatusCode::BAD_REQUEST,
        ),
        (AppError::Conflict("x".to_string()), StatusCode::CONFLICT),
        (
            AppError::RateLimited {
                retry_after_secs: 60,
            },
            StatusCode::TOO_MANY_REQUESTS,
        ),
        (
            AppError::Internal("x".to_string()),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (error, expected) in cases {
        assert_eq!(error.into_response().status(), expected);
    }
}

#[tokio::test]
async fn validation_errors_echo_their_message() {
    let response = AppError::Validation("Name is required".to_string()).into_response();
    let body = body_json(response).await;
    assert_eq!(body["error"], "Name is required");
}

#[tokio::test]
async fn rate_limited_carries_retry_after() {
    let response = AppError::RateLimited {
        retry_after_secs: 120,
    }
    .into_response();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        response.headers().get(header::RETRY_AFTER).unwrap(),
        "120"
    );

    let body = body_json(response).await;
    assert_eq!(body["retry_after_secs"], 120);
}

#[tokio::test]
async fn database_errors_hide_their_detail() {
    let response = AppError::Database(sqlx::Error::PoolClosed).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Internal server error");
}

#[tokio::test]
async fn internal_errors_hide_their_detail() {
    let response = AppError::Internal("pool exhausted".to_string()).into_response();
    let body = body_json(response).await;
    assert_eq!(body["error"], "Internal server error");
}
