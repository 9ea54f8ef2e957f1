use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit::ActorType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Secretary,
    Patient,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Secretary => "secretary",
            Role::Patient => "patient",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "doctor" => Ok(Role::Doctor),
            "secretary" => Ok(Role::Secretary),
            "patient" => Ok(Role::Patient),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

impl From<Role> for ActorType {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => ActorType::Admin,
            Role::Doctor => ActorType::Doctor,
            Role::Secretary => ActorType::Secretary,
            Role::Patient => ActorType::Patient,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}
