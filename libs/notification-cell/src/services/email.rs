use reqwest::Client;
use tracing::{debug, error, info};

use shared_config::AppConfig;

use crate::models::{EmailMessage, EmailSendResponse, NotificationError};

/// Transactional email client. Posts to the configured HTTP email API; callers
/// that send mail as a side effect of another operation must treat a failure
/// here as non-fatal.
pub struct EmailService {
    client: Client,
    base_url: String,
    api_key: String,
    from: String,
}

impl EmailService {
    pub fn new(config: &AppConfig) -> Result<Self, NotificationError> {
        if !config.is_email_configured() {
            return Err(NotificationError::NotConfigured);
        }

        Ok(Self {
            client: Client::new(),
            base_url: config.email_api_base_url.clone(),
            api_key: config.email_api_key.clone(),
            from: config.email_from.clone(),
        })
    }

    pub async fn send(
        &self,
        to: &str,
        subject: &str,
        html: &str,
    ) -> Result<EmailSendResponse, NotificationError> {
        let url = format!("{}/emails", self.base_url);

        let message = EmailMessage {
            from: self.from.clone(),
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        };

        debug!("Sending email to {} via {}", to, url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Email API error ({}): {}", status, body);
            return Err(NotificationError::ApiError(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let parsed: EmailSendResponse = response.json().await?;
        info!("Email sent to {}", to);
        Ok(parsed)
    }

    pub async fn send_welcome_email(
        &self,
        to: &str,
        full_name: &str,
        temporary_password: &str,
    ) -> Result<EmailSendResponse, NotificationError> {
        let subject = "Welcome to NileCare";
        let html = format!(
            "<p>Dear {},</p>\
             <p>Your doctor account has been created. You can sign in with this \
             email address and the temporary password <strong>{}</strong>.</p>\
             <p>Please change your password after your first login.</p>",
            full_name, temporary_password
        );
        self.send(to, subject, &html).await
    }

    pub async fn send_cancellation_email(
        &self,
        to: &str,
        patient_name: &str,
        doctor_name: &str,
        date: &str,
    ) -> Result<EmailSendResponse, NotificationError> {
        let subject = "Your appointment has been cancelled";
        let html = format!(
            "<p>Dear {},</p>\
             <p>Your appointment with Dr. {} on {} has been cancelled. \
             Please contact us to rebook.</p>",
            patient_name, doctor_name, date
        );
        self.send(to, subject, &html).await
    }
}
