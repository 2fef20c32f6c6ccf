// libs/appointment-cell/src/services/queries.rs
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Appointment, AppointmentCondition, AppointmentError, AppointmentSummary};

#[derive(Debug, Deserialize)]
struct DoctorRow {
    id: Uuid,
    name: String,
}

#[derive(Debug, Deserialize)]
struct PatientRow {
    id: Uuid,
    name: String,
    email: String,
    phone: String,
    address: String,
}

/// Read-only list surfaces. Rows are filtered in the database where the
/// filter maps to a column, then joined with doctor and patient rows and
/// filtered in memory for the name predicates.
pub struct AppointmentQueryService {
    supabase: Arc<SupabaseClient>,
}

impl AppointmentQueryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    /// Appointments for the acting doctor, optionally narrowed to one
    /// calendar day and to patients whose name contains a fragment.
    pub async fn doctor_appointments(
        &self,
        doctor_email: &str,
        patient_name: Option<&str>,
        date: Option<NaiveDate>,
        auth_token: &str,
    ) -> Result<Vec<AppointmentSummary>, AppointmentError> {
        let doctor = self.find_doctor_by_email(doctor_email, auth_token).await?;

        let mut query_parts = vec![format!("doctor_id=eq.{}", doctor.id)];
        if let Some(date) = date {
            let day_start = date.and_hms_opt(0, 0, 0).unwrap().and_utc();
            let day_end = day_start + Duration::days(1);
            query_parts.push(format!(
                "appointment_time=gte.{}",
                urlencoding::encode(&day_start.to_rfc3339())
            ));
            query_parts.push(format!(
                "appointment_time=lt.{}",
                urlencoding::encode(&day_end.to_rfc3339())
            ));
        }

        let path = format!("/rest/v1/appointments?{}", query_parts.join("&"));
        let appointments: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        debug!(
            "Doctor {} has {} appointment(s) matching the column filters",
            doctor.id,
            appointments.len()
        );

        let mut summaries = self.project_summaries(appointments, auth_token).await?;

        if let Some(fragment) = patient_name {
            let needle = fragment.to_lowercase();
            summaries.retain(|summary| summary.patient_name.to_lowercase().contains(&needle));
        }

        Ok(summaries)
    }

    /// Appointments for the acting patient. A condition narrows to the
    /// matching stored status and orders by time ascending; a doctor name
    /// fragment is applied in memory after the join.
    pub async fn patient_appointments(
        &self,
        patient_email: &str,
        condition: Option<AppointmentCondition>,
        doctor_name: Option<&str>,
        auth_token: &str,
    ) -> Result<Vec<AppointmentSummary>, AppointmentError> {
        let patient = self.find_patient_by_email(patient_email, auth_token).await?;

        let mut query_parts = vec![format!("patient_id=eq.{}", patient.id)];
        if let Some(condition) = condition {
            query_parts.push(format!("status=eq.{}", condition.status()));
            query_parts.push("order=appointment_time.asc".to_string());
        }

        let path = format!("/rest/v1/appointments?{}", query_parts.join("&"));
        let appointments: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let mut summaries = self.project_summaries(appointments, auth_token).await?;

        if let Some(fragment) = doctor_name {
            let needle = fragment.to_lowercase();
            summaries.retain(|summary| summary.doctor_name.to_lowercase().contains(&needle));
        }

        Ok(summaries)
    }

    async fn find_doctor_by_email(
        &self,
        email: &str,
        auth_token: &str,
    ) -> Result<DoctorRow, AppointmentError> {
        let path = format!("/rest/v1/doctors?email=eq.{}", urlencoding::encode(email));

        let result: Vec<DoctorRow> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        result.into_iter().next().ok_or(AppointmentError::DoctorNotFound)
    }

    async fn find_patient_by_email(
        &self,
        email: &str,
        auth_token: &str,
    ) -> Result<PatientRow, AppointmentError> {
        let path = format!("/rest/v1/patients?email=eq.{}", urlencoding::encode(email));

        let result: Vec<PatientRow> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        result.into_iter().next().ok_or(AppointmentError::PatientNotFound)
    }

    /// Joins appointment rows with their doctor and patient rows. The
    /// referenced rows are bulk-fetched once per list call.
    async fn project_summaries(
        &self,
        appointments: Vec<Appointment>,
        auth_token: &str,
    ) -> Result<Vec<AppointmentSummary>, AppointmentError> {
        if appointments.is_empty() {
            return Ok(Vec::new());
        }

        let doctor_ids = unique_ids(appointments.iter().map(|a| a.doctor_id));
        let patient_ids = unique_ids(appointments.iter().map(|a| a.patient_id));

        let doctors: Vec<DoctorRow> = self
            .fetch_by_ids("doctors", &doctor_ids, auth_token)
            .await?;
        let patients: Vec<PatientRow> = self
            .fetch_by_ids("patients", &patient_ids, auth_token)
            .await?;

        let doctors: HashMap<Uuid, DoctorRow> =
            doctors.into_iter().map(|row| (row.id, row)).collect();
        let patients: HashMap<Uuid, PatientRow> =
            patients.into_iter().map(|row| (row.id, row)).collect();

        appointments
            .into_iter()
            .map(|appointment| {
                let doctor = doctors.get(&appointment.doctor_id).ok_or_else(|| {
                    AppointmentError::DatabaseError(format!(
                        "Missing doctor {} for appointment {}",
                        appointment.doctor_id, appointment.id
                    ))
                })?;
                let patient = patients.get(&appointment.patient_id).ok_or_else(|| {
                    AppointmentError::DatabaseError(format!(
                        "Missing patient {} for appointment {}",
                        appointment.patient_id, appointment.id
                    ))
                })?;

                Ok(AppointmentSummary {
                    id: appointment.id,
                    doctor_id: appointment.doctor_id,
                    doctor_name: doctor.name.clone(),
                    patient_id: appointment.patient_id,
                    patient_name: patient.name.clone(),
                    patient_email: patient.email.clone(),
                    patient_phone: patient.phone.clone(),
                    patient_address: patient.address.clone(),
                    appointment_time: appointment.appointment_time,
                    status: appointment.status,
                })
            })
            .collect()
    }

    async fn fetch_by_ids<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        ids: &[Uuid],
        auth_token: &str,
    ) -> Result<Vec<T>, AppointmentError> {
        let id_list: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        let path = format!("/rest/v1/{}?id=in.({})", table, id_list.join(","));

        self.supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))
    }
}

fn unique_ids(ids: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = Vec::new();
    for id in ids {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}
