use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Directory record for a doctor. `available_times` holds the configured
/// consultation slots as "HH:MM-HH:MM" strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub specialty: String,
    pub email: String,
    #[serde(default)]
    pub available_times: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Doctor {
    /// True when any configured slot string starts with the given "HH:MM"
    /// prefix. Slot membership is prefix matching on the slot text, not
    /// interval arithmetic: "09:00-09:30" matches "09:00" and not "09:15".
    pub fn offers_slot(&self, time_prefix: &str) -> bool {
        self.available_times
            .iter()
            .any(|slot| slot.starts_with(time_prefix))
    }
}

/// Optional filter criteria for directory searches. All three are
/// independent; any subset may be present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorSearchFilters {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub time: Option<String>,
}

impl DoctorSearchFilters {
    /// Collapses sentinel values clients send for "no filter" ("all",
    /// "null", "undefined", blanks) into absent filters.
    pub fn normalize(self) -> Self {
        Self {
            name: normalize_filter(self.name),
            specialty: normalize_filter(self.specialty),
            time: normalize_filter(self.time),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.specialty.is_none() && self.time.is_none()
    }
}

pub fn normalize_filter(value: Option<String>) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.to_lowercase().as_str() {
        "all" | "null" | "undefined" => None,
        _ => Some(trimmed.to_string()),
    }
}

#[derive(Debug, Clone, Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
