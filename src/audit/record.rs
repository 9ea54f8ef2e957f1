use serde::{Deserialize, Serialize};

/// Identity string stamped into `user_agent` when the caller did not supply one.
pub const DEFAULT_USER_AGENT: &str = concat!("diatrack/", env!("CARGO_PKG_VERSION"));

/// Role of the identity performing a logged action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorType {
    Admin,
    Doctor,
    Secretary,
    Patient,
    System,
}

impl ActorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorType::Admin => "admin",
            ActorType::Doctor => "doctor",
            ActorType::Secretary => "secretary",
            ActorType::Patient => "patient",
            ActorType::System => "system",
        }
    }
}

/// Functional area an audit record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditModule {
    Credentials,
    Patients,
    Medications,
    Metrics,
    Appointments,
    LabResults,
    MlSettings,
    UserManagement,
    System,
}

impl AuditModule {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditModule::Credentials => "credentials",
            AuditModule::Patients => "patients",
            AuditModule::Medications => "medications",
            AuditModule::Metrics => "metrics",
            AuditModule::Appointments => "appointments",
            AuditModule::LabResults => "lab_results",
            AuditModule::MlSettings => "ml_settings",
            AuditModule::UserManagement => "user_management",
            AuditModule::System => "system",
        }
    }
}

/// Whether the business operation being described succeeded or failed.
/// Failed operations are logged too (e.g. a rejected login attempt).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
        }
    }
}

/// A fully described audit event, ready for insertion. This is the canonical
/// shape every call site is normalized into; `recorded_at` is deliberately
/// absent because the store assigns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub actor_type: ActorType,
    pub actor_id: String,
    pub actor_name: String,
    pub subject_id: Option<String>,
    pub module: AuditModule,
    pub action_type: String,
    pub outcome: Outcome,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub source_page: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub session_id: Option<String>,
}

impl AuditEvent {
    /// Start an event with only the required actor identity. Module defaults
    /// to `system` and the action to "unspecified"; the recorder's wrappers
    /// always override both.
    pub fn new(
        actor_type: ActorType,
        actor_id: impl Into<String>,
        actor_name: impl Into<String>,
    ) -> Self {
        Self {
            actor_type,
            actor_id: actor_id.into(),
            actor_name: actor_name.into(),
            subject_id: None,
            module: AuditModule::System,
            action_type: "unspecified".to_string(),
            outcome: Outcome::Success,
            old_value: None,
            new_value: None,
            source_page: None,
            ip_address: None,
            user_agent: None,
            session_id: None,
        }
    }

    pub fn module(mut self, module: AuditModule) -> Self {
        self.module = module;
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action_type = action.into();
        self
    }

    pub fn outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    pub fn old_value(mut self, value: impl Into<String>) -> Self {
        self.old_value = Some(value.into());
        self
    }

    pub fn new_value(mut self, value: impl Into<String>) -> Self {
        self.new_value = Some(value.into());
        self
    }

    /// Attach request-scoped metadata (origin page, client IP, user agent,
    /// session). Fields already set on the event are left untouched.
    pub fn meta(mut self, meta: &super::meta::RequestMeta) -> Self {
        if self.source_page.is_none() {
            self.source_page = meta.source_page.clone();
        }
        if self.ip_address.is_none() {
            self.ip_address = meta.ip_address.clone();
        }
        if self.user_agent.is_none() {
            self.user_agent = meta.user_agent.clone();
        }
        if self.session_id.is_none() {
            self.session_id = meta.session_id.clone();
        }
        self
    }

    /// Apply final defaults before submission. Only `user_agent` has a
    /// non-null default; every other optional stays absent.
    pub(crate) fn finalize(mut self) -> Self {
        if self.user_agent.is_none() {
            self.user_agent = Some(DEFAULT_USER_AGENT.to_string());
        }
        self
    }
}
