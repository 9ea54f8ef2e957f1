use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted audit row as read back for the admin trail view. Enum-typed
/// fields are kept as text here: the table is append-only and must tolerate
/// values written by older or newer builds.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub actor_type: String,
    pub actor_id: String,
    pub actor_name: String,
    pub subject_id: Option<String>,
    pub module: String,
    pub action_type: String,
    pub outcome: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub source_page: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub session_id: Option<String>,
    pub recorded_at: DateTime<Utc>,
}
