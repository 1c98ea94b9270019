use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSendResponse {
    pub id: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Email service is not configured")]
    NotConfigured,

    #[error("Email API error: {0}")]
    ApiError(String),

    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),
}
