// libs/appointment-cell/src/services/lifecycle.rs
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, OnceLock};

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    Appointment, AppointmentCandidate, AppointmentError, AppointmentStatus,
    BookAppointmentRequest, SlotIssue, UpdateAppointmentRequest, ValidationVerdict,
};
use crate::services::validation::AppointmentValidationService;

/// Process-wide per-doctor write locks. Services are built per request, so
/// the registry lives in a static; holding a doctor's lock across validate
/// and persist keeps two concurrent writes from both passing the conflict
/// check for the same minute.
static DOCTOR_LOCKS: OnceLock<StdMutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>> = OnceLock::new();

fn doctor_lock(doctor_id: Uuid) -> Arc<AsyncMutex<()>> {
    let registry = DOCTOR_LOCKS.get_or_init(|| StdMutex::new(HashMap::new()));
    let mut locks = registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    locks
        .entry(doctor_id)
        .or_insert_with(|| Arc::new(AsyncMutex::new(())))
        .clone()
}

fn representation_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

#[derive(Debug, Deserialize)]
struct PatientRef {
    id: Uuid,
}

/// Booking, rescheduling and cancellation. Every write revalidates under
/// the owning doctor's lock before touching the appointments table.
pub struct AppointmentLifecycleService {
    supabase: Arc<SupabaseClient>,
    validation: AppointmentValidationService,
}

impl AppointmentLifecycleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            validation: AppointmentValidationService::new(config),
        }
    }

    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let lock = doctor_lock(request.doctor_id);
        let _guard = lock.lock().await;

        let candidate = AppointmentCandidate {
            id: None,
            doctor_id: request.doctor_id,
            appointment_time: request.appointment_time,
        };
        check_verdict(self.validation.validate_appointment(&candidate, auth_token).await)?;

        let now = Utc::now();
        let appointment_data = json!({
            "doctor_id": request.doctor_id,
            "patient_id": request.patient_id,
            "appointment_time": request.appointment_time.to_rfc3339(),
            "status": AppointmentStatus::Scheduled.to_string(),
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(auth_token),
                Some(appointment_data),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::DatabaseError("Failed to create appointment".to_string()))?;

        let appointment: Appointment = serde_json::from_value(row)
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        info!(
            "Appointment {} booked with doctor {} at {}",
            appointment.id, appointment.doctor_id, appointment.appointment_time
        );

        Ok(appointment)
    }

    pub async fn update_appointment(
        &self,
        appointment_id: Uuid,
        request: UpdateAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let existing = self.get_appointment(appointment_id, auth_token).await?;

        // doctor_id is immutable on a row, so fetching before taking the
        // lock still serializes against other writes for this doctor.
        let lock = doctor_lock(existing.doctor_id);
        let _guard = lock.lock().await;

        let candidate = AppointmentCandidate {
            id: Some(existing.id),
            doctor_id: existing.doctor_id,
            appointment_time: request.appointment_time,
        };
        check_verdict(self.validation.validate_appointment(&candidate, auth_token).await)?;

        let update_data = json!({
            "appointment_time": request.appointment_time.to_rfc3339(),
            "status": request.status.to_string(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &format!("/rest/v1/appointments?id=eq.{}", appointment_id),
                Some(auth_token),
                Some(update_data),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::DatabaseError("Failed to update appointment".to_string()))?;

        let appointment: Appointment = serde_json::from_value(row)
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        info!(
            "Appointment {} moved to {} ({})",
            appointment.id, appointment.appointment_time, appointment.status
        );

        Ok(appointment)
    }

    /// Cancellation is owner-only: the acting patient is resolved by email
    /// and must match the appointment's patient_id.
    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        patient_email: &str,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        let patient_id = self.find_patient_id(patient_email, auth_token).await?;
        let appointment = self.get_appointment(appointment_id, auth_token).await?;

        if appointment.patient_id != patient_id {
            warn!(
                "Patient {} attempted to cancel appointment {} owned by {}",
                patient_id, appointment_id, appointment.patient_id
            );
            return Err(AppointmentError::Forbidden);
        }

        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &format!("/rest/v1/appointments?id=eq.{}", appointment_id),
                Some(auth_token),
                None,
                Some(representation_headers()),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        info!("Appointment {} cancelled", appointment_id);

        Ok(())
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);

        let result: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        result.into_iter().next().ok_or(AppointmentError::NotFound)
    }

    async fn find_patient_id(
        &self,
        email: &str,
        auth_token: &str,
    ) -> Result<Uuid, AppointmentError> {
        let path = format!("/rest/v1/patients?email=eq.{}", urlencoding::encode(email));

        let result: Vec<PatientRef> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .next()
            .map(|patient| patient.id)
            .ok_or(AppointmentError::PatientNotFound)
    }
}

fn check_verdict(verdict: ValidationVerdict) -> Result<(), AppointmentError> {
    match verdict {
        ValidationVerdict::Valid => Ok(()),
        ValidationVerdict::DoctorNotFound => Err(AppointmentError::DoctorNotFound),
        ValidationVerdict::SlotUnavailable(SlotIssue::NotConfigured) => {
            Err(AppointmentError::SlotNotConfigured)
        }
        ValidationVerdict::SlotUnavailable(SlotIssue::Conflict) => Err(AppointmentError::SlotTaken),
    }
}
