use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    CreatePatientRequest, Patient, PatientError, PatientSearchQuery, UpdatePatientRequest,
};

fn representation_headers() -> reqwest::header::HeaderMap {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        "Prefer",
        reqwest::header::HeaderValue::from_static("return=representation"),
    );
    headers
}

pub struct PatientService {
    supabase: SupabaseClient,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_patient(
        &self,
        request: CreatePatientRequest,
        auth_token: &str,
    ) -> Result<Patient, PatientError> {
        if request.full_name.trim().is_empty() {
            return Err(PatientError::Validation("Full name is required".to_string()));
        }

        debug!("Creating patient profile for: {}", request.email);

        let existing_path = format!("/rest/v1/patients?email=eq.{}", request.email);
        let existing: Vec<Value> = self
            .supabase
            .request(Method::GET, &existing_path, Some(auth_token), None)
            .await?;

        if !existing.is_empty() {
            return Err(PatientError::EmailAlreadyExists {
                email: request.email,
            });
        }

        let patient_data = json!({
            "full_name": request.full_name,
            "email": request.email,
            "phone_number": request.phone_number,
            "date_of_birth": request.date_of_birth.format("%Y-%m-%d").to_string(),
            "gender": request.gender,
            "address": request.address,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/patients",
                Some(auth_token),
                Some(patient_data),
                Some(representation_headers()),
            )
            .await?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| PatientError::Database("Failed to create patient profile".to_string()))?;

        let patient: Patient =
            serde_json::from_value(row).map_err(|e| PatientError::Database(e.to_string()))?;
        debug!("Patient profile created with ID: {}", patient.id);

        Ok(patient)
    }

    pub async fn get_patient(&self, patient_id: &str, auth_token: &str) -> Result<Patient, PatientError> {
        debug!("Fetching patient profile: {}", patient_id);

        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let row = result.into_iter().next().ok_or(PatientError::NotFound)?;
        serde_json::from_value(row).map_err(|e| PatientError::Database(e.to_string()))
    }

    pub async fn list_patients(&self, auth_token: &str) -> Result<Vec<Patient>, PatientError> {
        let result: Vec<Value> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/patients?order=full_name.asc",
                Some(auth_token),
                None,
            )
            .await?;

        result
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| PatientError::Database(e.to_string())))
            .collect()
    }

    pub async fn update_patient(
        &self,
        patient_id: &str,
        request: UpdatePatientRequest,
        auth_token: &str,
    ) -> Result<Patient, PatientError> {
        debug!("Updating patient profile: {}", patient_id);

        self.get_patient(patient_id, auth_token).await?;

        let mut update_data = serde_json::Map::new();
        if let Some(full_name) = request.full_name {
            update_data.insert("full_name".to_string(), json!(full_name));
        }
        if let Some(phone_number) = request.phone_number {
            update_data.insert("phone_number".to_string(), json!(phone_number));
        }
        if let Some(date_of_birth) = request.date_of_birth {
            update_data.insert(
                "date_of_birth".to_string(),
                json!(date_of_birth.format("%Y-%m-%d").to_string()),
            );
        }
        if let Some(gender) = request.gender {
            update_data.insert("gender".to_string(), json!(gender));
        }
        if let Some(address) = request.address {
            update_data.insert("address".to_string(), json!(address));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(Value::Object(update_data)),
                Some(representation_headers()),
            )
            .await?;

        let row = result.into_iter().next().ok_or(PatientError::NotFound)?;
        serde_json::from_value(row).map_err(|e| PatientError::Database(e.to_string()))
    }

    pub async fn delete_patient(&self, patient_id: &str, auth_token: &str) -> Result<(), PatientError> {
        self.get_patient(patient_id, auth_token).await?;

        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                Some(auth_token),
                None,
                Some(representation_headers()),
            )
            .await?;

        Ok(())
    }

    pub async fn search_patients(
        &self,
        query: PatientSearchQuery,
        auth_token: &str,
    ) -> Result<Vec<Patient>, PatientError> {
        debug!("Searching patients with query: {:?}", query);

        let mut query_parts = vec![];

        if let Some(name) = query.name {
            query_parts.push(format!("full_name=ilike.%{}%", name));
        }
        if let Some(email) = query.email {
            query_parts.push(format!("email=ilike.%{}%", email));
        }
        if let Some(phone) = query.phone {
            query_parts.push(format!("phone_number=ilike.%{}%", phone));
        }

        let limit = query.limit.unwrap_or(50);
        let offset = query.offset.unwrap_or(0);
        query_parts.push(format!("limit={}", limit));
        query_parts.push(format!("offset={}", offset));

        let path = format!("/rest/v1/patients?{}", query_parts.join("&"));
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        result
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| PatientError::Database(e.to_string())))
            .collect()
    }
}
