use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single self-reported or clinic-entered health reading.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct HealthMetric {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub glucose_mg_dl: Option<f64>,
    pub systolic: Option<i32>,
    pub diastolic: Option<i32>,
    pub weight_kg: Option<f64>,
    pub notes: Option<String>,
    pub submitted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
