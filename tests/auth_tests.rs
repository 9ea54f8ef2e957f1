use uuid::Uuid;

use diatrack::auth::jwt::{Claims, decode_token, encode_token};
use diatrack::auth::password;
use diatrack::models::Role;
use diatrack::rate_limit::LoginRateLimiter;

#[test]
fn password_hash_and_verify() {
    let hash = password::hash("correct horse battery").unwrap();
    assert!(password::verify("correct horse battery", &hash).unwrap());
    assert!(!password::verify("wrong password", &hash).unwrap());
}

#[test]
fn password_hashes_are_salted() {
    let a = password::hash("same password").unwrap();
    let b = password::hash("same password").unwrap();
    assert_ne!(a, b);
}

#[test]
fn jwt_round_trip() {
    let user_id = Uuid::new_v4();
    let session_id = Uuid::new_v4();
    let claims = Claims::new(user_id, "Dr. A".to_string(), Role::Doctor, session_id);

    let token = encode_token(&claims, "test-secret").unwrap();
    let decoded = decode_token(&token, "test-secret").unwrap();

    assert_eq!(decoded.sub, user_id);
    assert_eq!(decoded.sid, session_id);
    assert_eq!(decoded.role, Role::Doctor);
    assert_eq!(decoded.name, "Dr. A");
}

#[test]
fn jwt_rejects_wrong_secret() {
    let claims = Claims::new(
        Uuid::new_v4(),
        "Pat".to_string(),
        Role::Patient,
        Uuid::new_v4(),
    );
    let token = encode_token(&claims, "secret-a").unwrap();
    assert!(decode_token(&token, "secret-b").is_err());
}

#[test]
fn role_parsing() {
    assert_eq!("doctor".parse::<Role>().unwrap(), Role::Doctor);
    assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
    assert!("owner".parse::<Role>().is_err());
    assert_eq!(Role::Secretary.as_str(), "secretary");
}

#[test]
fn user_list_role_filter_parses_from_query_string() {
    use axum::extract::Query;
    use axum::http::Uri;

    use diatrack::routes::admin::UserQuery;

    let uri: Uri = "/api/v1/admin/users?role=doctor".parse().unwrap();
    let Query(query): Query<UserQuery> = Query::try_from_uri(&uri).unwrap();
    assert_eq!(query.role, Some(Role::Doctor));

    let uri: Uri = "/api/v1/admin/users".parse().unwrap();
    let Query(query): Query<UserQuery> = Query::try_from_uri(&uri).unwrap();
    assert_eq!(query.role, None);
}

#[test]
fn login_limiter_locks_after_five_failures() {
    let limiter = LoginRateLimiter::new();

    for _ in 0..4 {
        limiter.record_failure("doc@clinic.test");
        assert!(limiter.check("doc@clinic.test").is_ok());
    }

    limiter.record_failure("doc@clinic.test");
    assert!(limiter.check("doc@clinic.test").is_err());

    // Other accounts are unaffected
    assert!(limiter.check("other@clinic.test").is_ok());
}

#[test]
fn login_limiter_is_case_insensitive() {
    let limiter = LoginRateLimiter::new();
    for _ in 0..5 {
        limiter.record_failure("Doc@Clinic.Test");
    }
    assert!(limiter.check("doc@clinic.test").is_err());
}
