// libs/appointment-cell/src/models.rs
use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// A stored appointment row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub appointment_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stored status flag. `Scheduled` is set at booking time and `Completed`
/// only ever arrives through an explicit update. Never derived from the
/// clock, so a scheduled appointment whose time has passed stays scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Condition words accepted by the patient-facing list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentCondition {
    Future,
    Past,
}

impl AppointmentCondition {
    /// Case-insensitive parse. Anything other than "future" or "past" is
    /// rejected so the handler can return a usable error message.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "future" => Some(AppointmentCondition::Future),
            "past" => Some(AppointmentCondition::Past),
            _ => None,
        }
    }

    /// The stored status flag this condition selects on.
    pub fn status(&self) -> AppointmentStatus {
        match self {
            AppointmentCondition::Future => AppointmentStatus::Scheduled,
            AppointmentCondition::Past => AppointmentStatus::Completed,
        }
    }
}

/// What a write wants to store, as seen by validation. `id` is set when
/// revalidating an existing appointment so the conflict check can exclude
/// the row from its own window.
#[derive(Debug, Clone)]
pub struct AppointmentCandidate {
    pub id: Option<Uuid>,
    pub doctor_id: Uuid,
    pub appointment_time: DateTime<Utc>,
}

impl AppointmentCandidate {
    /// The requested start formatted for matching against a doctor's
    /// configured slot strings.
    pub fn time_prefix(&self) -> String {
        self.appointment_time.format("%H:%M").to_string()
    }

    /// Half-open one-minute window around the requested start. Seconds and
    /// finer are truncated so 10:30:00 and 10:30:45 collide.
    pub fn minute_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self
            .appointment_time
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(self.appointment_time);
        (start, start + Duration::minutes(1))
    }
}

/// Outcome of pre-write validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationVerdict {
    Valid,
    DoctorNotFound,
    SlotUnavailable(SlotIssue),
}

/// Why a slot was judged unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotIssue {
    /// The requested start matches none of the doctor's configured slots.
    NotConfigured,
    /// Another appointment already occupies the requested minute.
    Conflict,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub appointment_time: DateTime<Utc>,
}

/// Both fields are required. An update rewrites the time and status
/// together; partial updates are not supported.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub appointment_time: DateTime<Utc>,
    pub status: AppointmentStatus,
}

/// Query parameters for the doctor-scoped list.
#[derive(Debug, Deserialize)]
pub struct DoctorAppointmentsQuery {
    pub patient_name: Option<String>,
    pub date: Option<String>,
}

/// Query parameters for the patient-scoped list.
#[derive(Debug, Deserialize)]
pub struct PatientAppointmentsQuery {
    pub condition: Option<String>,
    pub doctor_name: Option<String>,
}

/// Appointment row joined with its doctor and patient for the list
/// surfaces, so clients render names without extra round trips.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentSummary {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: String,
    pub patient_address: String,
    pub appointment_time: DateTime<Utc>,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,
    #[error("Doctor not found")]
    DoctorNotFound,
    #[error("Patient not found")]
    PatientNotFound,
    #[error("Doctor is not available at the selected time")]
    SlotNotConfigured,
    #[error("Appointment slot already taken")]
    SlotTaken,
    #[error("Unauthorized to cancel this appointment")]
    Forbidden,
    #[error("Database error: {0}")]
    DatabaseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn minute_window_truncates_seconds() {
        let candidate = AppointmentCandidate {
            id: None,
            doctor_id: Uuid::new_v4(),
            appointment_time: Utc.with_ymd_and_hms(2026, 9, 14, 10, 30, 45).unwrap(),
        };

        let (start, end) = candidate.minute_window();
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 9, 14, 10, 30, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 9, 14, 10, 31, 0).unwrap());
    }

    #[test]
    fn time_prefix_is_zero_padded() {
        let candidate = AppointmentCandidate {
            id: None,
            doctor_id: Uuid::new_v4(),
            appointment_time: Utc.with_ymd_and_hms(2026, 9, 14, 9, 5, 0).unwrap(),
        };

        assert_eq!(candidate.time_prefix(), "09:05");
    }

    #[test]
    fn condition_parse_is_case_insensitive() {
        assert_eq!(
            AppointmentCondition::parse("Future"),
            Some(AppointmentCondition::Future)
        );
        assert_eq!(
            AppointmentCondition::parse(" PAST "),
            Some(AppointmentCondition::Past)
        );
        assert_eq!(AppointmentCondition::parse("upcoming"), None);
    }

    #[test]
    fn condition_maps_to_stored_status() {
        assert_eq!(
            AppointmentCondition::Future.status(),
            AppointmentStatus::Scheduled
        );
        assert_eq!(
            AppointmentCondition::Past.status(),
            AppointmentStatus::Completed
        );
    }

    #[test]
    fn status_serializes_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&AppointmentStatus::Scheduled).unwrap(),
            "\"scheduled\""
        );
        let parsed: AppointmentStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(parsed, AppointmentStatus::Completed);
    }
}
