use std::sync::Arc;
use axum::{
    extract::{Extension, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use tracing::{debug, error};

use shared_config::AppConfig;
use shared_models::auth::{User, UserRole};
use shared_models::error::AppError;
use shared_utils::extractor::require_role;

use crate::models::PatientLookupQuery;
use crate::services::PatientDirectoryService;

/// The acting patient's own record, resolved from the token identity.
#[axum::debug_handler]
pub async fn get_patient_profile(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, UserRole::Patient)?;

    let email = user
        .email
        .as_deref()
        .ok_or_else(|| AppError::Auth("Invalid or expired token".to_string()))?;

    debug!("Fetching patient profile for user {}", user.id);

    let directory = PatientDirectoryService::new(&config);

    let patient = directory
        .find_by_email(email, auth.token())
        .await
        .map_err(|e| {
            error!("Patient lookup failed: {}", e);
            AppError::Internal("Failed to retrieve patient profile".to_string())
        })?
        .ok_or_else(|| AppError::NotFound("Patient not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "patient": patient
    })))
}

/// Admin lookup by email or phone. Email wins when both are present.
#[axum::debug_handler]
pub async fn lookup_patient(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<PatientLookupQuery>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, UserRole::Admin)?;

    let directory = PatientDirectoryService::new(&config);

    let patient = if let Some(email) = query.email.as_deref() {
        directory.find_by_email(email, auth.token()).await
    } else if let Some(phone) = query.phone.as_deref() {
        directory.find_by_phone(phone, auth.token()).await
    } else {
        return Err(AppError::BadRequest(
            "Provide an email or phone number".to_string(),
        ));
    };

    let patient = patient
        .map_err(|e| {
            error!("Patient lookup failed: {}", e);
            AppError::Internal("Failed to retrieve patient".to_string())
        })?
        .ok_or_else(|| AppError::NotFound("Patient not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "patient": patient
    })))
}
