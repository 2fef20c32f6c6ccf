// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{User, UserRole};
use shared_models::error::AppError;
use shared_utils::extractor::require_role;

use crate::models::{
    AppointmentCondition, AppointmentError, BookAppointmentRequest, DoctorAppointmentsQuery,
    PatientAppointmentsQuery, UpdateAppointmentRequest,
};
use crate::services::{AppointmentLifecycleService, AppointmentQueryService};

/// Treats "all", "null", "undefined" and blank values as an absent filter
/// so clients can send placeholder values for parameters they leave unset.
fn normalize_filter(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.to_lowercase().as_str() {
            "all" | "null" | "undefined" => None,
            _ => Some(trimmed.to_string()),
        }
    })
}

fn acting_email(user: &User) -> Result<&str, AppError> {
    user.email
        .as_deref()
        .ok_or_else(|| AppError::Auth("Invalid or expired token".to_string()))
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, UserRole::Patient)?;

    debug!(
        "Booking request for doctor {} at {}",
        request.doctor_id, request.appointment_time
    );

    let lifecycle = AppointmentLifecycleService::new(&config);

    let appointment = lifecycle
        .book_appointment(request, auth.token())
        .await
        .map_err(|e| match e {
            AppointmentError::DoctorNotFound => {
                AppError::BadRequest("Invalid doctor ID".to_string())
            }
            AppointmentError::SlotNotConfigured => {
                AppError::BadRequest("Doctor is not available at the selected time".to_string())
            }
            AppointmentError::SlotTaken => {
                AppError::Conflict("Appointment slot already taken".to_string())
            }
            _ => {
                error!("Booking failed: {}", e);
                AppError::Internal("Failed to book appointment".to_string())
            }
        })?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, UserRole::Patient)?;

    let lifecycle = AppointmentLifecycleService::new(&config);

    let appointment = lifecycle
        .update_appointment(appointment_id, request, auth.token())
        .await
        .map_err(|e| match e {
            AppointmentError::NotFound => {
                AppError::NotFound("Appointment not found".to_string())
            }
            AppointmentError::DoctorNotFound
            | AppointmentError::SlotNotConfigured
            | AppointmentError::SlotTaken => {
                AppError::BadRequest("Invalid appointment time".to_string())
            }
            _ => {
                error!("Update failed for appointment {}: {}", appointment_id, e);
                AppError::Internal("Error updating appointment".to_string())
            }
        })?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, UserRole::Patient)?;
    let email = acting_email(&user)?;

    let lifecycle = AppointmentLifecycleService::new(&config);

    lifecycle
        .cancel_appointment(appointment_id, email, auth.token())
        .await
        .map_err(|e| match e {
            AppointmentError::PatientNotFound => {
                AppError::NotFound("Patient not found".to_string())
            }
            AppointmentError::NotFound => {
                AppError::NotFound("Appointment not found".to_string())
            }
            AppointmentError::Forbidden => {
                AppError::Forbidden("Unauthorized to cancel this appointment".to_string())
            }
            _ => {
                error!("Cancel failed for appointment {}: {}", appointment_id, e);
                AppError::Internal("Error cancelling appointment".to_string())
            }
        })?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment cancelled successfully"
    })))
}

/// The acting doctor's appointments, optionally narrowed by patient name
/// fragment and calendar day.
#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(params): Query<DoctorAppointmentsQuery>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, UserRole::Doctor)?;
    let email = acting_email(&user)?;

    let patient_name = normalize_filter(params.patient_name);
    let date = match normalize_filter(params.date) {
        Some(raw) => Some(NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
            AppError::BadRequest("Invalid date format. Use YYYY-MM-DD".to_string())
        })?),
        None => None,
    };

    let queries = AppointmentQueryService::new(&config);

    let appointments = queries
        .doctor_appointments(email, patient_name.as_deref(), date, auth.token())
        .await
        .map_err(|e| match e {
            AppointmentError::DoctorNotFound => {
                AppError::NotFound("Doctor not found".to_string())
            }
            _ => {
                error!("Doctor appointment list failed: {}", e);
                AppError::Internal("Error retrieving appointments".to_string())
            }
        })?;

    Ok(Json(json!({
        "success": true,
        "appointments": appointments
    })))
}

/// The acting patient's appointments, optionally narrowed by condition
/// ("future" or "past") and doctor name fragment.
#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(params): Query<PatientAppointmentsQuery>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, UserRole::Patient)?;
    let email = acting_email(&user)?;

    let doctor_name = normalize_filter(params.doctor_name);
    let condition = match normalize_filter(params.condition) {
        Some(raw) => Some(AppointmentCondition::parse(&raw).ok_or_else(|| {
            AppError::BadRequest("Invalid condition. Use 'past' or 'future'.".to_string())
        })?),
        None => None,
    };

    let queries = AppointmentQueryService::new(&config);

    let appointments = queries
        .patient_appointments(email, condition, doctor_name.as_deref(), auth.token())
        .await
        .map_err(|e| match e {
            AppointmentError::PatientNotFound => {
                AppError::NotFound("Patient not found".to_string())
            }
            _ => {
                error!("Patient appointment list failed: {}", e);
                AppError::Internal("Error retrieving appointments".to_string())
            }
        })?;

    Ok(Json(json!({
        "success": true,
        "appointments": appointments
    })))
}
