use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use notification_cell::EmailService;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    Doctor, DoctorError, RegisterDoctorRequest, UpdateDoctorPersonalInfoRequest,
    UpdateDoctorRequest,
};

pub(crate) fn representation_headers() -> reqwest::header::HeaderMap {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        "Prefer",
        reqwest::header::HeaderValue::from_static("return=representation"),
    );
    headers
}

pub struct DoctorService {
    supabase: SupabaseClient,
    config: AppConfig,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            config: config.clone(),
        }
    }

    pub async fn register_doctor(
        &self,
        request: RegisterDoctorRequest,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        info!("Registering doctor: {} ({})", request.full_name, request.email);

        if request.full_name.trim().is_empty() {
            return Err(DoctorError::Validation("Full name is required".to_string()));
        }
        if request.branch_ids.is_empty() {
            return Err(DoctorError::Validation(
                "At least one branch must be assigned".to_string(),
            ));
        }

        let existing_path = format!("/rest/v1/doctors?email=eq.{}", request.email);
        let existing: Vec<Value> = self
            .supabase
            .request(Method::GET, &existing_path, Some(auth_token), None)
            .await?;
        if !existing.is_empty() {
            return Err(DoctorError::EmailAlreadyExists {
                email: request.email,
            });
        }

        let spec_path = format!(
            "/rest/v1/specializations?id=eq.{}&select=id",
            request.specialization_id
        );
        let specs: Vec<Value> = self
            .supabase
            .request(Method::GET, &spec_path, Some(auth_token), None)
            .await?;
        if specs.is_empty() {
            warn!("Specialization {} not found", request.specialization_id);
            return Err(DoctorError::SpecializationNotFound);
        }

        let mut branch_ids: Vec<Uuid> = request.branch_ids.clone();
        branch_ids.sort();
        branch_ids.dedup();

        let ids = branch_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let branch_path = format!("/rest/v1/branches?id=in.({})&select=id", ids);
        let branches: Vec<Value> = self
            .supabase
            .request(Method::GET, &branch_path, Some(auth_token), None)
            .await?;

        if branches.len() != branch_ids.len() {
            let found: Vec<String> = branches
                .iter()
                .filter_map(|b| b["id"].as_str().map(String::from))
                .collect();
            let missing = branch_ids
                .iter()
                .filter(|id| !found.contains(&id.to_string()))
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            warn!("Branches not found: {}", missing);
            return Err(DoctorError::BranchesNotFound(missing));
        }

        let doctor_data = json!({
            "full_name": request.full_name,
            "email": request.email,
            "phone_number": request.phone_number,
            "specialization_id": request.specialization_id,
            "branch_ids": branch_ids,
            "consultation_fee": request.consultation_fee,
            "bio": request.bio,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/doctors",
                Some(auth_token),
                Some(doctor_data),
                Some(representation_headers()),
            )
            .await?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| DoctorError::Database("Failed to create doctor".to_string()))?;

        let doctor: Doctor =
            serde_json::from_value(row).map_err(|e| DoctorError::Database(e.to_string()))?;

        // Welcome email is best-effort; the registration stands either way.
        match EmailService::new(&self.config) {
            Ok(email) => {
                if let Err(e) = email
                    .send_welcome_email(&doctor.email, &doctor.full_name, &request.temporary_password)
                    .await
                {
                    warn!("Failed to send welcome email to {}: {}", doctor.email, e);
                }
            }
            Err(e) => warn!("Email service unavailable: {}", e),
        }

        info!("Doctor registered with ID: {}", doctor.id);
        Ok(doctor)
    }

    pub async fn get_doctor(&self, doctor_id: &str, auth_token: &str) -> Result<Doctor, DoctorError> {
        debug!("Fetching doctor: {}", doctor_id);

        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let row = result.into_iter().next().ok_or(DoctorError::NotFound)?;
        serde_json::from_value(row).map_err(|e| DoctorError::Database(e.to_string()))
    }

    pub async fn list_doctors(&self, auth_token: &str) -> Result<Vec<Doctor>, DoctorError> {
        let result: Vec<Value> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/doctors?order=full_name.asc",
                Some(auth_token),
                None,
            )
            .await?;

        result
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| DoctorError::Database(e.to_string())))
            .collect()
    }

    pub async fn list_doctors_by_branch(
        &self,
        branch_id: &str,
        auth_token: &str,
    ) -> Result<Vec<Doctor>, DoctorError> {
        debug!("Fetching doctors for branch {}", branch_id);

        let branch_path = format!("/rest/v1/branches?id=eq.{}&select=id", branch_id);
        let branches: Vec<Value> = self
            .supabase
            .request(Method::GET, &branch_path, Some(auth_token), None)
            .await?;
        if branches.is_empty() {
            return Err(DoctorError::BranchesNotFound(branch_id.to_string()));
        }

        let path = format!(
            "/rest/v1/doctors?branch_ids=cs.{{{}}}&order=full_name.asc",
            branch_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        result
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| DoctorError::Database(e.to_string())))
            .collect()
    }

    pub async fn list_doctors_by_specialization(
        &self,
        specialization_id: &str,
        auth_token: &str,
    ) -> Result<Vec<Doctor>, DoctorError> {
        debug!("Fetching doctors for specialization {}", specialization_id);

        let spec_path = format!(
            "/rest/v1/specializations?id=eq.{}&select=id",
            specialization_id
        );
        let specs: Vec<Value> = self
            .supabase
            .request(Method::GET, &spec_path, Some(auth_token), None)
            .await?;
        if specs.is_empty() {
            return Err(DoctorError::SpecializationNotFound);
        }

        let path = format!(
            "/rest/v1/doctors?specialization_id=eq.{}&order=full_name.asc",
            specialization_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        result
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| DoctorError::Database(e.to_string())))
            .collect()
    }

    pub async fn update_doctor(
        &self,
        doctor_id: &str,
        request: UpdateDoctorRequest,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        debug!("Updating doctor: {}", doctor_id);

        self.get_doctor(doctor_id, auth_token).await?;

        let mut update_data = serde_json::Map::new();
        if let Some(full_name) = request.full_name {
            update_data.insert("full_name".to_string(), json!(full_name));
        }
        if let Some(phone_number) = request.phone_number {
            update_data.insert("phone_number".to_string(), json!(phone_number));
        }
        if let Some(specialization_id) = request.specialization_id {
            let spec_path = format!(
                "/rest/v1/specializations?id=eq.{}&select=id",
                specialization_id
            );
            let specs: Vec<Value> = self
                .supabase
                .request(Method::GET, &spec_path, Some(auth_token), None)
                .await?;
            if specs.is_empty() {
                return Err(DoctorError::SpecializationNotFound);
            }
            update_data.insert("specialization_id".to_string(), json!(specialization_id));
        }
        if let Some(branch_ids) = request.branch_ids {
            let mut ids = branch_ids;
            ids.sort();
            ids.dedup();

            let id_list = ids
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(",");
            let branch_path = format!("/rest/v1/branches?id=in.({})&select=id", id_list);
            let branches: Vec<Value> = self
                .supabase
                .request(Method::GET, &branch_path, Some(auth_token), None)
                .await?;
            if branches.len() != ids.len() {
                return Err(DoctorError::BranchesNotFound(id_list));
            }
            update_data.insert("branch_ids".to_string(), json!(ids));
        }
        if let Some(consultation_fee) = request.consultation_fee {
            update_data.insert("consultation_fee".to_string(), json!(consultation_fee));
        }
        if let Some(bio) = request.bio {
            update_data.insert("bio".to_string(), json!(bio));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
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

        let row = result.into_iter().next().ok_or(DoctorError::NotFound)?;
        serde_json::from_value(row).map_err(|e| DoctorError::Database(e.to_string()))
    }

    pub async fn update_personal_info(
        &self,
        doctor_id: &str,
        request: UpdateDoctorPersonalInfoRequest,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        self.update_doctor(
            doctor_id,
            UpdateDoctorRequest {
                full_name: request.full_name,
                phone_number: request.phone_number,
                specialization_id: None,
                branch_ids: None,
                consultation_fee: None,
                bio: request.bio,
            },
            auth_token,
        )
        .await
    }

    pub async fn delete_doctor(&self, doctor_id: &str, auth_token: &str) -> Result<(), DoctorError> {
        self.get_doctor(doctor_id, auth_token).await?;

        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
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
}
