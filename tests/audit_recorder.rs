use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;

use diatrack::audit::{
    ActorType, AuditEvent, AuditModule, AuditRecorder, AuditStore, AuditStoreError,
    DEFAULT_USER_AGENT, Outcome, RequestMeta,
};

/// Captures every inserted event for inspection.
#[derive(Default)]
struct MemStore {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemStore {
    fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditStore for MemStore {
    async fn insert(&self, event: &AuditEvent) -> Result<(), AuditStoreError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Rejects every insert, counting attempts.
#[derive(Default)]
struct FailStore {
    attempts: AtomicUsize,
}

#[async_trait]
impl AuditStore for FailStore {
    async fn insert(&self, _event: &AuditEvent) -> Result<(), AuditStoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AuditStoreError {
            message: "connection refused".to_string(),
        })
    }
}

fn recorder_with_mem() -> (AuditRecorder, Arc<MemStore>) {
    let store = Arc::new(MemStore::default());
    (AuditRecorder::new(store.clone()), store)
}

/// Counts error-level tracing events, nothing else.
struct ErrorCounter {
    errors: Arc<AtomicUsize>,
}

impl tracing::Subscriber for ErrorCounter {
    fn enabled(&self, _metadata: &tracing::Metadata<'_>) -> bool {
        true
    }

    fn new_span(&self, _span: &tracing::span::Attributes<'_>) -> tracing::span::Id {
        tracing::span::Id::from_u64(1)
    }

    fn record(&self, _span: &tracing::span::Id, _values: &tracing::span::Record<'_>) {}

    fn record_follows_from(&self, _span: &tracing::span::Id, _follows: &tracing::span::Id) {}

    fn event(&self, event: &tracing::Event<'_>) {
        if *event.metadata().level() == tracing::Level::ERROR {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn enter(&self, _span: &tracing::span::Id) {}

    fn exit(&self, _span: &tracing::span::Id) {}
}

// ── Wrapper field pass-through ──────────────────────────────────

#[tokio::test]
async fn auth_event_produces_credentials_login_record() {
    let (recorder, store) = recorder_with_mem();

    recorder
        .auth_event(
            ActorType::Doctor,
            "D1",
            "Dr. A",
            "login",
            &RequestMeta::default(),
        )
        .await;

    let events = store.events();
    assert_eq!(events.len(), 1);
    let e = &events[0];
    assert_eq!(e.actor_type, ActorType::Doctor);
    assert_eq!(e.actor_id, "D1");
    assert_eq!(e.actor_name, "Dr. A");
    assert_eq!(e.module, AuditModule::Credentials);
    assert_eq!(e.action_type, "login");
    assert_eq!(e.subject_id, None);
    assert_eq!(e.outcome, Outcome::Success);
}

#[tokio::test]
async fn medication_change_carries_old_and_new_values() {
    let (recorder, store) = recorder_with_mem();

    recorder
        .medication_change(
            ActorType::Doctor,
            "D1",
            "Dr. A",
            "P9",
            "edit",
            Some("Metformin 500mg"),
            Some("Metformin 750mg"),
            &RequestMeta::default(),
        )
        .await;

    let events = store.events();
    assert_eq!(events.len(), 1);
    let e = &events[0];
    assert_eq!(e.module, AuditModule::Medications);
    assert_eq!(e.subject_id.as_deref(), Some("P9"));
    assert_eq!(e.old_value.as_deref(), Some("Metformin 500mg"));
    assert_eq!(e.new_value.as_deref(), Some("Metformin 750mg"));
    assert_eq!(e.action_type, "edit");
}

#[tokio::test]
async fn metrics_submission_round_trips_payload() {
    let (recorder, store) = recorder_with_mem();
    let payload = json!({ "glucose": 120 });

    recorder
        .metrics_submission(
            ActorType::Patient,
            "P9",
            "Patient X",
            "P9",
            "create",
            &payload,
            &RequestMeta::default(),
        )
        .await;

    let events = store.events();
    assert_eq!(events.len(), 1);
    let e = &events[0];
    assert_eq!(e.module, AuditModule::Metrics);
    assert_eq!(e.subject_id.as_deref(), Some("P9"));

    let parsed: serde_json::Value =
        serde_json::from_str(e.new_value.as_deref().unwrap()).unwrap();
    assert_eq!(parsed, payload);
}

#[tokio::test]
async fn lab_result_event_serializes_payload() {
    let (recorder, store) = recorder_with_mem();
    let payload = json!({ "test_name": "HbA1c", "result": 6.8 });

    recorder
        .lab_result_event(
            ActorType::Secretary,
            "S2",
            "Sec B",
            "P9",
            "upload",
            &payload,
            &RequestMeta::default(),
        )
        .await;

    let events = store.events();
    let e = &events[0];
    assert_eq!(e.module, AuditModule::LabResults);
    let parsed: serde_json::Value =
        serde_json::from_str(e.new_value.as_deref().unwrap()).unwrap();
    assert_eq!(parsed, payload);
}

#[tokio::test]
async fn appointment_event_and_system_action_fix_their_modules() {
    let (recorder, store) = recorder_with_mem();

    recorder
        .appointment_event(
            ActorType::Secretary,
            "S2",
            "Sec B",
            "P9",
            "schedule",
            "Appointment at 2026-09-01T10:00:00Z",
            &RequestMeta::default(),
        )
        .await;
    recorder
        .system_action(
            ActorType::Admin,
            "A1",
            "Admin",
            AuditModule::UserManagement,
            "delete",
            "Deleted doctor account",
            &RequestMeta::default(),
        )
        .await;
    recorder
        .ml_settings_change(
            ActorType::Admin,
            "A1",
            "Admin",
            "update",
            &json!({ "threshold": 0.5 }),
            &json!({ "threshold": 0.7 }),
            &RequestMeta::default(),
        )
        .await;

    let events = store.events();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].module, AuditModule::Appointments);
    assert_eq!(events[1].module, AuditModule::UserManagement);
    assert_eq!(events[2].module, AuditModule::MlSettings);
    assert_eq!(events[2].old_value.as_deref(), Some(r#"{"threshold":0.5}"#));
}

#[tokio::test]
async fn credential_event_records_failed_login_without_subject() {
    let (recorder, store) = recorder_with_mem();

    recorder
        .credential_event(
            ActorType::System,
            "unknown",
            "unknown",
            None,
            "failed_login",
            "Login attempt for unknown email",
            Outcome::Failure,
            &RequestMeta::default(),
        )
        .await;

    let e = &store.events()[0];
    assert_eq!(e.module, AuditModule::Credentials);
    assert_eq!(e.subject_id, None);
    assert_eq!(e.outcome, Outcome::Failure);
    assert_eq!(
        e.new_value.as_deref(),
        Some("Login attempt for unknown email")
    );
}

// ── Defaults ────────────────────────────────────────────────────

#[tokio::test]
async fn unset_optionals_default_as_specified() {
    let (recorder, store) = recorder_with_mem();

    recorder
        .record(AuditEvent::new(ActorType::System, "sys", "System"))
        .await;

    let e = &store.events()[0];
    assert_eq!(e.module, AuditModule::System);
    assert_eq!(e.subject_id, None);
    assert_eq!(e.old_value, None);
    assert_eq!(e.new_value, None);
    assert_eq!(e.source_page, None);
    assert_eq!(e.ip_address, None);
    assert_eq!(e.session_id, None);
    // user_agent is the one optional with a non-null default
    assert_eq!(e.user_agent.as_deref(), Some(DEFAULT_USER_AGENT));
}

#[tokio::test]
async fn caller_supplied_user_agent_is_not_overwritten() {
    let (recorder, store) = recorder_with_mem();

    let meta = RequestMeta {
        user_agent: Some("Mozilla/5.0".to_string()),
        ..Default::default()
    };
    recorder
        .auth_event(ActorType::Patient, "P1", "Pat", "login", &meta)
        .await;

    assert_eq!(store.events()[0].user_agent.as_deref(), Some("Mozilla/5.0"));
}

#[tokio::test]
async fn request_meta_fields_flow_into_the_record() {
    let (recorder, store) = recorder_with_mem();

    let meta = RequestMeta {
        source_page: Some("Patient Profile".to_string()),
        ip_address: Some("203.0.113.7".to_string()),
        user_agent: Some("Mozilla/5.0".to_string()),
        session_id: None,
    }
    .with_session("sess-1");

    recorder
        .patient_data_change(
            ActorType::Doctor,
            "D1",
            "Dr. A",
            AuditModule::Patients,
            "P9",
            "edit",
            Some("{}"),
            Some("{\"name\":\"X\"}"),
            &meta,
        )
        .await;

    let e = &store.events()[0];
    assert_eq!(e.source_page.as_deref(), Some("Patient Profile"));
    assert_eq!(e.ip_address.as_deref(), Some("203.0.113.7"));
    assert_eq!(e.session_id.as_deref(), Some("sess-1"));
}

// ── No dedup ────────────────────────────────────────────────────

#[tokio::test]
async fn identical_calls_append_two_records() {
    let (recorder, store) = recorder_with_mem();

    for _ in 0..2 {
        recorder
            .auth_event(
                ActorType::Doctor,
                "D1",
                "Dr. A",
                "login",
                &RequestMeta::default(),
            )
            .await;
    }

    assert_eq!(store.events().len(), 2);
}

// ── Fire-and-forget ─────────────────────────────────────────────

#[tokio::test]
async fn store_failure_never_surfaces_to_the_caller() {
    let store = Arc::new(FailStore::default());
    let recorder = AuditRecorder::new(store.clone());

    // A business operation that audits after its primary effect
    async fn save_patient(recorder: &AuditRecorder) -> Result<&'static str, String> {
        recorder
            .patient_data_change(
                ActorType::Doctor,
                "D1",
                "Dr. A",
                AuditModule::Patients,
                "P9",
                "edit",
                None,
                Some("updated"),
                &RequestMeta::default(),
            )
            .await;
        Ok("saved")
    }

    let result = save_patient(&recorder).await;
    assert_eq!(result, Ok("saved"));
    // Exactly one insert was attempted, no retries
    assert_eq!(store.attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn store_failure_emits_exactly_one_diagnostic() {
    use tracing::instrument::WithSubscriber;

    let store = Arc::new(FailStore::default());
    let recorder = AuditRecorder::new(store.clone());

    let errors = Arc::new(AtomicUsize::new(0));
    let counter = ErrorCounter {
        errors: errors.clone(),
    };

    async {
        recorder
            .auth_event(
                ActorType::Doctor,
                "D1",
                "Dr. A",
                "login",
                &RequestMeta::default(),
            )
            .await;
    }
    .with_subscriber(counter)
    .await;

    assert_eq!(store.attempts.load(Ordering::SeqCst), 1);
    assert_eq!(errors.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn successful_insert_emits_no_diagnostic() {
    use tracing::instrument::WithSubscriber;

    let (recorder, store) = recorder_with_mem();

    let errors = Arc::new(AtomicUsize::new(0));
    let counter = ErrorCounter {
        errors: errors.clone(),
    };

    async {
        recorder
            .auth_event(
                ActorType::Doctor,
                "D1",
                "Dr. A",
                "login",
                &RequestMeta::default(),
            )
            .await;
    }
    .with_subscriber(counter)
    .await;

    assert_eq!(store.events().len(), 1);
    assert_eq!(errors.load(Ordering::SeqCst), 0);
}

// ── Client IP extraction ────────────────────────────────────────

#[test]
fn meta_ignores_forwarded_header_from_untrusted_peer() {
    use axum::http::HeaderMap;

    let mut headers = HeaderMap::new();
    headers.insert("x-forwarded-for", "203.0.113.7".parse().unwrap());
    headers.insert("user-agent", "Mozilla/5.0".parse().unwrap());

    let meta = RequestMeta::from_headers(&headers, Some("198.51.100.9".parse().unwrap()), &[]);
    assert_eq!(meta.ip_address.as_deref(), Some("198.51.100.9"));
    assert_eq!(meta.user_agent.as_deref(), Some("Mozilla/5.0"));
}

#[test]
fn meta_honours_forwarded_header_from_trusted_proxy() {
    use axum::http::HeaderMap;

    let mut headers = HeaderMap::new();
    headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
    headers.insert("x-source-page", "Login".parse().unwrap());

    let proxies = vec!["10.0.0.0/8".parse().unwrap()];
    let meta = RequestMeta::from_headers(&headers, Some("10.0.0.1".parse().unwrap()), &proxies);
    assert_eq!(meta.ip_address.as_deref(), Some("203.0.113.7"));
    assert_eq!(meta.source_page.as_deref(), Some("Login"));
}
