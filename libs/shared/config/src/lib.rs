use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub paymob_base_url: String,
    pub paymob_api_key: String,
    pub paymob_integration_id: i64,
    pub paymob_callback_url: String,
    pub email_api_base_url: String,
    pub email_api_key: String,
    pub email_from: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            paymob_base_url: env::var("PAYMOB_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("PAYMOB_BASE_URL not set, using default");
                    "https://accept.paymob.com/api".to_string()
                }),
            paymob_api_key: env::var("PAYMOB_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("PAYMOB_API_KEY not set, using empty value");
                    String::new()
                }),
            paymob_integration_id: env::var("PAYMOB_CARD_INTEGRATION_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(|| {
                    warn!("PAYMOB_CARD_INTEGRATION_ID not set or invalid, using 0");
                    0
                }),
            paymob_callback_url: env::var("PAYMOB_CALLBACK_URL")
                .unwrap_or_else(|_| {
                    warn!("PAYMOB_CALLBACK_URL not set, using empty value");
                    String::new()
                }),
            email_api_base_url: env::var("EMAIL_API_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("EMAIL_API_BASE_URL not set, using empty value");
                    String::new()
                }),
            email_api_key: env::var("EMAIL_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("EMAIL_API_KEY not set, using empty value");
                    String::new()
                }),
            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| {
                    warn!("EMAIL_FROM not set, using default");
                    "no-reply@nilecare.example".to_string()
                }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    pub fn is_payment_gateway_configured(&self) -> bool {
        !self.paymob_api_key.is_empty()
            && self.paymob_integration_id != 0
            && !self.paymob_base_url.is_empty()
    }

    pub fn is_email_configured(&self) -> bool {
        !self.email_api_base_url.is_empty() && !self.email_api_key.is_empty()
    }
}
