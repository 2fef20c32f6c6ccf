use anyhow::Result;
use reqwest::Method;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::Patient;

/// Keyed lookups over the patients table. Token identity resolution
/// (email from a verified bearer token to a patient row) goes through
/// `find_by_email`.
pub struct PatientDirectoryService {
    supabase: SupabaseClient,
}

impl PatientDirectoryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn find_by_email(&self, email: &str, auth_token: &str) -> Result<Option<Patient>> {
        debug!("Looking up patient by email");

        let path = format!("/rest/v1/patients?email=eq.{}", urlencoding::encode(email));
        let result: Vec<Patient> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(result.into_iter().next())
    }

    pub async fn find_by_phone(&self, phone: &str, auth_token: &str) -> Result<Option<Patient>> {
        debug!("Looking up patient by phone");

        let path = format!("/rest/v1/patients?phone=eq.{}", urlencoding::encode(phone));
        let result: Vec<Patient> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(result.into_iter().next())
    }

    pub async fn get_patient(&self, patient_id: Uuid, auth_token: &str) -> Result<Option<Patient>> {
        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        let result: Vec<Patient> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(result.into_iter().next())
    }
}
