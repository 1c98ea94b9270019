use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    CreateMedicalRecordRequest, MedicalRecord, MedicalRecordError, UpdateMedicalRecordRequest,
};

fn representation_headers() -> reqwest::header::HeaderMap {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        "Prefer",
        reqwest::header::HeaderValue::from_static("return=representation"),
    );
    headers
}

pub struct MedicalRecordService {
    supabase: SupabaseClient,
}

impl MedicalRecordService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn row_exists(
        &self,
        table: &str,
        id: Uuid,
        auth_token: &str,
    ) -> Result<bool, MedicalRecordError> {
        let path = format!("/rest/v1/{}?id=eq.{}&select=id", table, id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;
        Ok(!rows.is_empty())
    }

    pub async fn create_record(
        &self,
        request: CreateMedicalRecordRequest,
        auth_token: &str,
    ) -> Result<MedicalRecord, MedicalRecordError> {
        if !self.row_exists("patients", request.patient_id, auth_token).await? {
            return Err(MedicalRecordError::PatientNotFound);
        }
        if !self.row_exists("doctors", request.doctor_id, auth_token).await? {
            return Err(MedicalRecordError::DoctorNotFound);
        }

        let data = json!({
            "patient_id": request.patient_id,
            "doctor_id": request.doctor_id,
            "diagnosis": request.diagnosis,
            "prescription": request.prescription,
            "notes": request.notes,
            "visit_date": request.visit_date.format("%Y-%m-%d").to_string(),
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/medical_records",
                Some(auth_token),
                Some(data),
                Some(representation_headers()),
            )
            .await?;

        let row = result.into_iter().next().ok_or_else(|| {
            MedicalRecordError::Database("Failed to create medical record".to_string())
        })?;

        let record: MedicalRecord =
            serde_json::from_value(row).map_err(|e| MedicalRecordError::Database(e.to_string()))?;
        debug!("Medical record created with ID: {}", record.id);
        Ok(record)
    }

    pub async fn get_record(
        &self,
        record_id: &str,
        auth_token: &str,
    ) -> Result<MedicalRecord, MedicalRecordError> {
        let path = format!("/rest/v1/medical_records?id=eq.{}", record_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let row = rows.into_iter().next().ok_or(MedicalRecordError::NotFound)?;
        serde_json::from_value(row).map_err(|e| MedicalRecordError::Database(e.to_string()))
    }

    pub async fn update_record(
        &self,
        record_id: &str,
        request: UpdateMedicalRecordRequest,
        auth_token: &str,
    ) -> Result<MedicalRecord, MedicalRecordError> {
        // Existence check first so a missing id surfaces as 404, not an
        // empty PATCH result.
        self.get_record(record_id, auth_token).await?;

        let mut data = Map::new();
        if let Some(diagnosis) = request.diagnosis {
            data.insert("diagnosis".to_string(), json!(diagnosis));
        }
        if let Some(prescription) = request.prescription {
            data.insert("prescription".to_string(), json!(prescription));
        }
        if let Some(notes) = request.notes {
            data.insert("notes".to_string(), json!(notes));
        }
        if let Some(visit_date) = request.visit_date {
            data.insert(
                "visit_date".to_string(),
                json!(visit_date.format("%Y-%m-%d").to_string()),
            );
        }

        if data.is_empty() {
            return Err(MedicalRecordError::Validation(
                "No fields to update".to_string(),
            ));
        }
        data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/medical_records?id=eq.{}", record_id);
        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(Value::Object(data)),
                Some(representation_headers()),
            )
            .await?;

        let row = result.into_iter().next().ok_or(MedicalRecordError::NotFound)?;
        serde_json::from_value(row).map_err(|e| MedicalRecordError::Database(e.to_string()))
    }

    pub async fn delete_record(
        &self,
        record_id: &str,
        auth_token: &str,
    ) -> Result<(), MedicalRecordError> {
        self.get_record(record_id, auth_token).await?;

        let path = format!("/rest/v1/medical_records?id=eq.{}", record_id);
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

        debug!("Medical record {} deleted", record_id);
        Ok(())
    }

    pub async fn list_by_doctor(
        &self,
        doctor_id: &str,
        auth_token: &str,
    ) -> Result<Vec<MedicalRecord>, MedicalRecordError> {
        let path = format!(
            "/rest/v1/medical_records?doctor_id=eq.{}&order=visit_date.desc",
            doctor_id
        );
        self.fetch(&path, auth_token).await
    }

    pub async fn list_by_patient(
        &self,
        patient_id: &str,
        auth_token: &str,
    ) -> Result<Vec<MedicalRecord>, MedicalRecordError> {
        let path = format!(
            "/rest/v1/medical_records?patient_id=eq.{}&order=visit_date.desc",
            patient_id
        );
        self.fetch(&path, auth_token).await
    }

    async fn fetch(
        &self,
        path: &str,
        auth_token: &str,
    ) -> Result<Vec<MedicalRecord>, MedicalRecordError> {
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, path, Some(auth_token), None)
            .await?;

        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| MedicalRecordError::Database(e.to_string()))
            })
            .collect()
    }
}
