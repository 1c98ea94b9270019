use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Branch, CatalogError, CreateBranchRequest, UpdateBranchRequest};

pub(crate) fn representation_headers() -> reqwest::header::HeaderMap {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        "Prefer",
        reqwest::header::HeaderValue::from_static("return=representation"),
    );
    headers
}

pub struct BranchService {
    supabase: SupabaseClient,
}

impl BranchService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_branch(
        &self,
        request: CreateBranchRequest,
        auth_token: &str,
    ) -> Result<Branch, CatalogError> {
        if request.name.trim().is_empty() {
            return Err(CatalogError::Validation("Branch name is required".to_string()));
        }

        debug!("Creating branch: {}", request.name);

        let branch_data = json!({
            "name": request.name,
            "address": request.address,
            "phone_number": request.phone_number,
            "email": request.email,
            "description": request.description,
            "image_url": request.image_url,
            "latitude": request.latitude,
            "longitude": request.longitude,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/branches",
                Some(auth_token),
                Some(branch_data),
                Some(representation_headers()),
            )
            .await?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::Database("Failed to create branch".to_string()))?;

        serde_json::from_value(row).map_err(|e| CatalogError::Database(e.to_string()))
    }

    pub async fn get_branch(&self, branch_id: &str, auth_token: &str) -> Result<Branch, CatalogError> {
        let path = format!("/rest/v1/branches?id=eq.{}", branch_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let row = result.into_iter().next().ok_or(CatalogError::BranchNotFound)?;
        serde_json::from_value(row).map_err(|e| CatalogError::Database(e.to_string()))
    }

    pub async fn list_branches(&self, auth_token: &str) -> Result<Vec<Branch>, CatalogError> {
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, "/rest/v1/branches?order=name.asc", Some(auth_token), None)
            .await?;

        result
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| CatalogError::Database(e.to_string())))
            .collect()
    }

    pub async fn update_branch(
        &self,
        branch_id: &str,
        request: UpdateBranchRequest,
        auth_token: &str,
    ) -> Result<Branch, CatalogError> {
        // Existence check first so a bad id maps to 404, not an empty PATCH result.
        self.get_branch(branch_id, auth_token).await?;

        let mut update_data = serde_json::Map::new();
        if let Some(name) = request.name {
            update_data.insert("name".to_string(), json!(name));
        }
        if let Some(address) = request.address {
            update_data.insert("address".to_string(), json!(address));
        }
        if let Some(phone_number) = request.phone_number {
            update_data.insert("phone_number".to_string(), json!(phone_number));
        }
        if let Some(email) = request.email {
            update_data.insert("email".to_string(), json!(email));
        }
        if let Some(description) = request.description {
            update_data.insert("description".to_string(), json!(description));
        }
        if let Some(image_url) = request.image_url {
            update_data.insert("image_url".to_string(), json!(image_url));
        }
        if let Some(latitude) = request.latitude {
            update_data.insert("latitude".to_string(), json!(latitude));
        }
        if let Some(longitude) = request.longitude {
            update_data.insert("longitude".to_string(), json!(longitude));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/branches?id=eq.{}", branch_id);
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

        let row = result.into_iter().next().ok_or(CatalogError::BranchNotFound)?;
        serde_json::from_value(row).map_err(|e| CatalogError::Database(e.to_string()))
    }

    pub async fn delete_branch(&self, branch_id: &str, auth_token: &str) -> Result<(), CatalogError> {
        self.get_branch(branch_id, auth_token).await?;

        let path = format!("/rest/v1/branches?id=eq.{}", branch_id);
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
