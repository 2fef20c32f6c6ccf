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
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{DoctorError, DoctorSearchFilters};
use crate::services::{AvailabilityService, DoctorDirectoryService};

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let directory = DoctorDirectoryService::new(&state);

    let doctors = directory.list_doctors().await.map_err(|e| {
        error!("Failed to list doctors: {}", e);
        AppError::Internal("Failed to retrieve doctors".to_string())
    })?;

    Ok(Json(json!({
        "success": true,
        "doctors": doctors
    })))
}

#[axum::debug_handler]
pub async fn filter_doctors(
    State(state): State<Arc<AppConfig>>,
    Query(filters): Query<DoctorSearchFilters>,
) -> Result<Json<Value>, AppError> {
    let directory = DoctorDirectoryService::new(&state);

    match directory.filter_doctors(filters).await {
        Ok(doctors) => Ok(Json(json!({
            "success": true,
            "doctors": doctors
        }))),
        Err(e) => {
            error!("Failed to filter doctors: {}", e);
            Err(AppError::Internal(
                "An error occurred while filtering doctors".to_string(),
            ))
        }
    }
}

#[axum::debug_handler]
pub async fn doctor_availability(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path((doctor_id, date)): Path<(Uuid, String)>,
) -> Result<Json<Value>, AppError> {
    debug!(
        "User {} requesting availability for doctor {} on {}",
        user.id, doctor_id, date
    );

    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("Invalid date format. Use YYYY-MM-DD".to_string()))?;

    let availability = AvailabilityService::new(&state);

    match availability.available_slots_on_date(doctor_id, date, auth.token()).await {
        Ok(slots) => Ok(Json(json!({
            "success": true,
            "doctor_id": doctor_id,
            "date": date,
            "available_slots": slots
        }))),
        Err(DoctorError::NotFound) => Err(AppError::NotFound("Doctor not found".to_string())),
        Err(DoctorError::DatabaseError(e)) => {
            error!("Failed to load doctor availability: {}", e);
            Err(AppError::Internal(
                "Failed to retrieve doctor availability".to_string(),
            ))
        }
    }
}
