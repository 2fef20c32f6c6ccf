// libs/appointment-cell/src/services/validation.rs
use std::sync::Arc;

use reqwest::Method;
use tracing::{debug, warn};

use doctor_cell::DoctorDirectoryService;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Appointment, AppointmentCandidate, SlotIssue, ValidationVerdict};

/// Pre-write validation pipeline: doctor existence, configured slot match,
/// then a minute-granularity conflict probe. Repository failures fail
/// closed as an unavailable slot rather than letting a write through.
pub struct AppointmentValidationService {
    supabase: Arc<SupabaseClient>,
    doctors: DoctorDirectoryService,
}

impl AppointmentValidationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            doctors: DoctorDirectoryService::new(config),
        }
    }

    pub async fn validate_appointment(
        &self,
        candidate: &AppointmentCandidate,
        auth_token: &str,
    ) -> ValidationVerdict {
        let doctor = match self.doctors.find_doctor(candidate.doctor_id, auth_token).await {
            Ok(Some(doctor)) => doctor,
            Ok(None) => {
                debug!("Validation rejected: doctor {} not found", candidate.doctor_id);
                return ValidationVerdict::DoctorNotFound;
            }
            Err(e) => {
                warn!(
                    "Doctor lookup failed during validation, treating slot as unavailable: {}",
                    e
                );
                return ValidationVerdict::SlotUnavailable(SlotIssue::Conflict);
            }
        };

        let requested = candidate.time_prefix();
        if !doctor.offers_slot(&requested) {
            debug!(
                "Validation rejected: {} is not a configured slot start for doctor {}",
                requested, doctor.id
            );
            return ValidationVerdict::SlotUnavailable(SlotIssue::NotConfigured);
        }

        match self.find_conflicts(candidate, auth_token).await {
            Ok(conflicts) if conflicts.is_empty() => ValidationVerdict::Valid,
            Ok(conflicts) => {
                debug!(
                    "Validation rejected: {} existing appointment(s) in the requested minute",
                    conflicts.len()
                );
                ValidationVerdict::SlotUnavailable(SlotIssue::Conflict)
            }
            Err(e) => {
                warn!(
                    "Conflict lookup failed during validation, treating slot as unavailable: {}",
                    e
                );
                ValidationVerdict::SlotUnavailable(SlotIssue::Conflict)
            }
        }
    }

    async fn find_conflicts(
        &self,
        candidate: &AppointmentCandidate,
        auth_token: &str,
    ) -> anyhow::Result<Vec<Appointment>> {
        let (window_start, window_end) = candidate.minute_window();

        let mut query_parts = vec![
            format!("doctor_id=eq.{}", candidate.doctor_id),
            format!(
                "appointment_time=gte.{}",
                urlencoding::encode(&window_start.to_rfc3339())
            ),
            format!(
                "appointment_time=lt.{}",
                urlencoding::encode(&window_end.to_rfc3339())
            ),
        ];

        // An update must not collide with the row it is rewriting.
        if let Some(exclude_id) = candidate.id {
            query_parts.push(format!("id=neq.{}", exclude_id));
        }

        let path = format!("/rest/v1/appointments?{}", query_parts.join("&"));

        let conflicts: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        Ok(conflicts)
    }
}
