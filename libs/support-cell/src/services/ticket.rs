use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    CreateTicketRequest, SupportError, SupportTicket, TicketStatus, UpdateTicketRequest,
};

fn representation_headers() -> reqwest::header::HeaderMap {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        "Prefer",
        reqwest::header::HeaderValue::from_static("return=representation"),
    );
    headers
}

pub struct SupportTicketService {
    supabase: SupabaseClient,
}

impl SupportTicketService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// New tickets always open in `Open`; the requesting user becomes the
    /// owner.
    pub async fn create_ticket(
        &self,
        user_id: &str,
        request: CreateTicketRequest,
        auth_token: &str,
    ) -> Result<SupportTicket, SupportError> {
        if request.subject.trim().is_empty() {
            return Err(SupportError::Validation("Subject is required".to_string()));
        }
        if request.description.trim().is_empty() {
            return Err(SupportError::Validation(
                "Description is required".to_string(),
            ));
        }

        let data = json!({
            "user_id": user_id,
            "subject": request.subject,
            "description": request.description,
            "status": TicketStatus::Open,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/support_tickets",
                Some(auth_token),
                Some(data),
                Some(representation_headers()),
            )
            .await?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| SupportError::Database("Failed to create ticket".to_string()))?;

        let ticket: SupportTicket =
            serde_json::from_value(row).map_err(|e| SupportError::Database(e.to_string()))?;
        debug!("Support ticket created with ID: {}", ticket.id);
        Ok(ticket)
    }

    pub async fn get_ticket(
        &self,
        ticket_id: &str,
        auth_token: &str,
    ) -> Result<SupportTicket, SupportError> {
        let path = format!("/rest/v1/support_tickets?id=eq.{}", ticket_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let row = rows.into_iter().next().ok_or(SupportError::NotFound)?;
        serde_json::from_value(row).map_err(|e| SupportError::Database(e.to_string()))
    }

    pub async fn update_ticket(
        &self,
        ticket_id: &str,
        request: UpdateTicketRequest,
        auth_token: &str,
    ) -> Result<SupportTicket, SupportError> {
        self.get_ticket(ticket_id, auth_token).await?;

        let mut data = Map::new();
        if let Some(subject) = request.subject {
            data.insert("subject".to_string(), json!(subject));
        }
        if let Some(description) = request.description {
            data.insert("description".to_string(), json!(description));
        }
        if let Some(status) = request.status {
            data.insert("status".to_string(), json!(status));
        }

        if data.is_empty() {
            return Err(SupportError::Validation("No fields to update".to_string()));
        }
        data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/support_tickets?id=eq.{}", ticket_id);
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

        let row = result.into_iter().next().ok_or(SupportError::NotFound)?;
        serde_json::from_value(row).map_err(|e| SupportError::Database(e.to_string()))
    }

    pub async fn delete_ticket(
        &self,
        ticket_id: &str,
        auth_token: &str,
    ) -> Result<(), SupportError> {
        self.get_ticket(ticket_id, auth_token).await?;

        let path = format!("/rest/v1/support_tickets?id=eq.{}", ticket_id);
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

        debug!("Support ticket {} deleted", ticket_id);
        Ok(())
    }

    pub async fn list_by_user(
        &self,
        user_id: &str,
        auth_token: &str,
    ) -> Result<Vec<SupportTicket>, SupportError> {
        let path = format!(
            "/rest/v1/support_tickets?user_id=eq.{}&order=created_at.desc",
            user_id
        );
        self.fetch(&path, auth_token).await
    }

    pub async fn list_all(&self, auth_token: &str) -> Result<Vec<SupportTicket>, SupportError> {
        self.fetch("/rest/v1/support_tickets?order=created_at.desc", auth_token)
            .await
    }

    async fn fetch(
        &self,
        path: &str,
        auth_token: &str,
    ) -> Result<Vec<SupportTicket>, SupportError> {
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, path, Some(auth_token), None)
            .await?;

        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| SupportError::Database(e.to_string()))
            })
            .collect()
    }
}
