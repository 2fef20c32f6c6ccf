use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Directory record for a patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for the admin lookup endpoint. Email takes precedence
/// when both are supplied.
#[derive(Debug, Deserialize)]
pub struct PatientLookupQuery {
    pub email: Option<String>,
    pub phone: Option<String>,
}
