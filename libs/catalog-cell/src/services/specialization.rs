use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    CatalogError, CreateSpecializationRequest, Specialization, UpdateSpecializationRequest,
};
use crate::services::branch::representation_headers;

pub struct SpecializationService {
    supabase: SupabaseClient,
}

impl SpecializationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_specialization(
        &self,
        request: CreateSpecializationRequest,
        auth_token: &str,
    ) -> Result<Specialization, CatalogError> {
        if request.name.trim().is_empty() {
            return Err(CatalogError::Validation(
                "Specialization name is required".to_string(),
            ));
        }
        if request.branch_ids.is_empty() {
            return Err(CatalogError::Validation(
                "At least one branch must be assigned".to_string(),
            ));
        }

        debug!("Creating specialization: {}", request.name);

        // All referenced branches must exist.
        let ids = request
            .branch_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let branch_path = format!("/rest/v1/branches?id=in.({})&select=id,name", ids);
        let branches: Vec<Value> = self
            .supabase
            .request(Method::GET, &branch_path, Some(auth_token), None)
            .await?;

        if branches.len() != request.branch_ids.len() {
            return Err(CatalogError::BranchNotFound);
        }

        // Same name may not repeat within any of the assigned branches.
        let name_path = format!(
            "/rest/v1/specializations?name=ilike.{}",
            urlencoding::encode(request.name.trim())
        );
        let existing: Vec<Specialization> = self
            .supabase
            .request(Method::GET, &name_path, Some(auth_token), None)
            .await
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        for spec in &existing {
            if let Some(shared) = spec
                .branch_ids
                .iter()
                .find(|b| request.branch_ids.contains(*b))
                .copied()
            {
                let shared_id = shared.to_string();
                let branch_name = branches
                    .iter()
                    .find(|b| b["id"].as_str() == Some(shared_id.as_str()))
                    .and_then(|b| b["name"].as_str())
                    .unwrap_or("unknown")
                    .to_string();
                warn!(
                    "Specialization '{}' already exists in branch '{}'",
                    request.name, branch_name
                );
                return Err(CatalogError::SpecializationExists {
                    name: request.name,
                    branch: branch_name,
                });
            }
        }

        let data = json!({
            "name": request.name.trim(),
            "description": request.description,
            "branch_ids": request.branch_ids,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/specializations",
                Some(auth_token),
                Some(data),
                Some(representation_headers()),
            )
            .await?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::Database("Failed to create specialization".to_string()))?;

        serde_json::from_value(row).map_err(|e| CatalogError::Database(e.to_string()))
    }

    pub async fn get_specialization(
        &self,
        specialization_id: &str,
        auth_token: &str,
    ) -> Result<Specialization, CatalogError> {
        let path = format!("/rest/v1/specializations?id=eq.{}", specialization_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let row = result
            .into_iter()
            .next()
            .ok_or(CatalogError::SpecializationNotFound)?;
        serde_json::from_value(row).map_err(|e| CatalogError::Database(e.to_string()))
    }

    pub async fn list_specializations(
        &self,
        auth_token: &str,
    ) -> Result<Vec<Specialization>, CatalogError> {
        let result: Vec<Value> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/specializations?order=name.asc",
                Some(auth_token),
                None,
            )
            .await?;

        result
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| CatalogError::Database(e.to_string())))
            .collect()
    }

    pub async fn list_by_branch(
        &self,
        branch_id: &str,
        auth_token: &str,
    ) -> Result<Vec<Specialization>, CatalogError> {
        let path = format!(
            "/rest/v1/specializations?branch_ids=cs.{{{}}}&order=name.asc",
            branch_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        result
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| CatalogError::Database(e.to_string())))
            .collect()
    }

    pub async fn update_specialization(
        &self,
        specialization_id: &str,
        request: UpdateSpecializationRequest,
        auth_token: &str,
    ) -> Result<Specialization, CatalogError> {
        self.get_specialization(specialization_id, auth_token).await?;

        let mut update_data = serde_json::Map::new();
        if let Some(name) = request.name {
            update_data.insert("name".to_string(), json!(name));
        }
        if let Some(description) = request.description {
            update_data.insert("description".to_string(), json!(description));
        }
        if let Some(branch_ids) = request.branch_ids {
            update_data.insert("branch_ids".to_string(), json!(branch_ids));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/specializations?id=eq.{}", specialization_id);
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

        let row = result
            .into_iter()
            .next()
            .ok_or(CatalogError::SpecializationNotFound)?;
        serde_json::from_value(row).map_err(|e| CatalogError::Database(e.to_string()))
    }

    pub async fn delete_specialization(
        &self,
        specialization_id: &str,
        auth_token: &str,
    ) -> Result<(), CatalogError> {
        self.get_specialization(specialization_id, auth_token).await?;

        let path = format!("/rest/v1/specializations?id=eq.{}", specialization_id);
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
