use std::sync::Arc;

use anyhow::Result;
use reqwest::Method;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Doctor, DoctorSearchFilters};

/// Lookup and search over the doctors table. List and filter serve the
/// public directory surface and run with the anon key only; the keyed
/// lookups forward the caller's token.
pub struct DoctorDirectoryService {
    supabase: Arc<SupabaseClient>,
}

impl DoctorDirectoryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub async fn find_doctor(&self, doctor_id: Uuid, auth_token: &str) -> Result<Option<Doctor>> {
        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);

        let result: Vec<Doctor> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(result.into_iter().next())
    }

    pub async fn find_by_email(&self, email: &str, auth_token: &str) -> Result<Option<Doctor>> {
        let path = format!("/rest/v1/doctors?email=eq.{}", urlencoding::encode(email));

        let result: Vec<Doctor> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(result.into_iter().next())
    }

    pub async fn list_doctors(&self) -> Result<Vec<Doctor>> {
        let doctors: Vec<Doctor> = self.supabase.request(
            Method::GET,
            "/rest/v1/doctors",
            None,
            None,
        ).await?;

        Ok(doctors)
    }

    /// Directory search across all seven non-empty filter subsets, falling
    /// back to the full list when every filter is absent. Name and specialty
    /// go to PostgREST as case-insensitive substring matches; the time
    /// filter is slot-prefix matching over `available_times` and stays
    /// in memory.
    pub async fn filter_doctors(&self, filters: DoctorSearchFilters) -> Result<Vec<Doctor>> {
        let filters = filters.normalize();
        debug!("Filtering doctors with {:?}", filters);

        let mut query_parts: Vec<String> = Vec::new();

        if let Some(name) = &filters.name {
            query_parts.push(format!("name=ilike.%{}%", urlencoding::encode(name)));
        }

        if let Some(specialty) = &filters.specialty {
            query_parts.push(format!("specialty=ilike.%{}%", urlencoding::encode(specialty)));
        }

        let path = if query_parts.is_empty() {
            "/rest/v1/doctors".to_string()
        } else {
            format!("/rest/v1/doctors?{}", query_parts.join("&"))
        };

        let doctors: Vec<Doctor> = self.supabase.request(
            Method::GET,
            &path,
            None,
            None,
        ).await?;

        let doctors = match &filters.time {
            Some(time) => doctors
                .into_iter()
                .filter(|doctor| doctor.offers_slot(time))
                .collect(),
            None => doctors,
        };

        Ok(doctors)
    }
}
