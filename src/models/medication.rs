use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Medication {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub name: String,
    pub dosage: String,
    pub frequency: Option<String>,
    pub prescribed_by: Option<Uuid>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Medication {
    /// Compact description used as old/new value in audit records.
    pub fn describe(&self) -> String {
        match &self.frequency {
            Some(freq) => format!("{} {} ({freq})", self.name, self.dosage),
            None => format!("{} {}", self.name, self.dosage),
        }
    }
}
