use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    CatalogError, CreateMedicalServiceRequest, MedicalService, UpdateMedicalServiceRequest,
};
use crate::services::branch::representation_headers;

pub struct MedicalServiceCatalog {
    supabase: SupabaseClient,
}

impl MedicalServiceCatalog {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_service(
        &self,
        request: CreateMedicalServiceRequest,
        auth_token: &str,
    ) -> Result<MedicalService, CatalogError> {
        if request.name.trim().is_empty() {
            return Err(CatalogError::Validation("Service name cannot be empty".to_string()));
        }

        debug!("Creating medical service: {}", request.name);

        let data = json!({
            "name": request.name,
            "description": request.description,
            "image_url": request.image_url,
            "price": request.price,
            "branch_ids": request.branch_ids,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/medical_services",
                Some(auth_token),
                Some(data),
                Some(representation_headers()),
            )
            .await?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::Database("Failed to create service".to_string()))?;

        serde_json::from_value(row).map_err(|e| CatalogError::Database(e.to_string()))
    }

    pub async fn get_service(
        &self,
        service_id: &str,
        auth_token: &str,
    ) -> Result<MedicalService, CatalogError> {
        let path = format!("/rest/v1/medical_services?id=eq.{}", service_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let row = result.into_iter().next().ok_or(CatalogError::ServiceNotFound)?;
        serde_json::from_value(row).map_err(|e| CatalogError::Database(e.to_string()))
    }

    pub async fn list_services(&self, auth_token: &str) -> Result<Vec<MedicalService>, CatalogError> {
        let result: Vec<Value> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/medical_services?order=name.asc",
                Some(auth_token),
                None,
            )
            .await?;

        result
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| CatalogError::Database(e.to_string())))
            .collect()
    }

    pub async fn update_service(
        &self,
        service_id: &str,
        request: UpdateMedicalServiceRequest,
        auth_token: &str,
    ) -> Result<MedicalService, CatalogError> {
        self.get_service(service_id, auth_token).await?;

        let mut update_data = serde_json::Map::new();
        if let Some(name) = request.name {
            update_data.insert("name".to_string(), json!(name));
        }
        if let Some(description) = request.description {
            update_data.insert("description".to_string(), json!(description));
        }
        if let Some(image_url) = request.image_url {
            update_data.insert("image_url".to_string(), json!(image_url));
        }
        if let Some(price) = request.price {
            update_data.insert("price".to_string(), json!(price));
        }
        if let Some(branch_ids) = request.branch_ids {
            update_data.insert("branch_ids".to_string(), json!(branch_ids));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/medical_services?id=eq.{}", service_id);
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

        let row = result.into_iter().next().ok_or(CatalogError::ServiceNotFound)?;
        serde_json::from_value(row).map_err(|e| CatalogError::Database(e.to_string()))
    }

    pub async fn delete_service(&self, service_id: &str, auth_token: &str) -> Result<(), CatalogError> {
        self.get_service(service_id, auth_token).await?;

        let path = format!("/rest/v1/medical_services?id=eq.{}", service_id);
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
