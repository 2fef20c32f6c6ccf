use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Doctor, DoctorError};

#[derive(Debug, Deserialize)]
struct BookedAppointment {
    appointment_time: DateTime<Utc>,
}

/// Answers "which of this doctor's configured slots are still open on a
/// given date": the slot list minus every slot whose start minute is
/// already taken by a booked appointment that day.
pub struct AvailabilityService {
    supabase: Arc<SupabaseClient>,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub async fn available_slots_on_date(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<String>, DoctorError> {
        let doctor = self.fetch_doctor(doctor_id, auth_token).await?;

        let appointments = self.get_appointments_for_date(doctor_id, date, auth_token).await?;

        let booked_starts: Vec<String> = appointments
            .iter()
            .map(|apt| apt.appointment_time.format("%H:%M").to_string())
            .collect();

        debug!(
            "Doctor {} has {} booked starts on {}",
            doctor_id,
            booked_starts.len(),
            date
        );

        let open_slots = doctor
            .available_times
            .into_iter()
            .filter(|slot| !booked_starts.iter().any(|start| slot.starts_with(start.as_str())))
            .collect();

        Ok(open_slots)
    }

    async fn fetch_doctor(&self, doctor_id: Uuid, auth_token: &str) -> Result<Doctor, DoctorError> {
        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);

        let result: Vec<Doctor> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        result.into_iter().next().ok_or(DoctorError::NotFound)
    }

    async fn get_appointments_for_date(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<BookedAppointment>, DoctorError> {
        let start_of_day = date.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let end_of_day = start_of_day + chrono::Duration::days(1);

        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&appointment_time=gte.{}&appointment_time=lt.{}&order=appointment_time.asc",
            doctor_id,
            urlencoding::encode(&start_of_day.to_rfc3339()),
            urlencoding::encode(&end_of_day.to_rfc3339())
        );

        let appointments: Vec<BookedAppointment> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        Ok(appointments)
    }
}
