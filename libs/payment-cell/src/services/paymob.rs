use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::models::PaymentError;

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct PaymentKeyApiResponse {
    token: String,
}

/// HTTP client for the Paymob Accept API. The hosted checkout needs three
/// calls in sequence: authenticate, register an order, then mint a payment
/// key scoped to that order.
pub struct PaymobClient {
    client: Client,
    base_url: String,
    api_key: String,
    integration_id: i64,
}

impl PaymobClient {
    pub fn new(config: &AppConfig) -> Result<Self, PaymentError> {
        if !config.is_payment_gateway_configured() {
            return Err(PaymentError::Gateway(
                "Payment gateway is not configured".to_string(),
            ));
        }

        Ok(Self {
            client: Client::new(),
            base_url: config.paymob_base_url.clone(),
            api_key: config.paymob_api_key.clone(),
            integration_id: config.paymob_integration_id,
        })
    }

    pub async fn authenticate(&self) -> Result<String, PaymentError> {
        let url = format!("{}/auth/tokens", self.base_url);
        let body = json!({ "api_key": self.api_key });

        let parsed: AuthResponse = self.post(&url, body).await?;
        debug!("Authenticated against Paymob");
        Ok(parsed.token)
    }

    pub async fn create_order(
        &self,
        auth_token: &str,
        amount: f64,
        currency: &str,
        merchant_order_id: &str,
    ) -> Result<i64, PaymentError> {
        let url = format!("{}/ecommerce/orders", self.base_url);
        let body = json!({
            "auth_token": auth_token,
            "delivery_needed": false,
            "amount_cents": to_cents(amount),
            "currency": currency,
            "merchant_order_id": merchant_order_id,
        });

        let parsed: OrderResponse = self.post(&url, body).await?;
        debug!("Created Paymob order {}", parsed.id);
        Ok(parsed.id)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn generate_payment_key(
        &self,
        auth_token: &str,
        order_id: i64,
        amount: f64,
        currency: &str,
        email: &str,
        full_name: &str,
        phone_number: &str,
    ) -> Result<String, PaymentError> {
        let url = format!("{}/acceptance/payment_keys", self.base_url);

        let mut names = full_name.splitn(2, ' ');
        let first_name = names.next().unwrap_or("NA");
        let last_name = names.next().unwrap_or("NA");

        let body = json!({
            "auth_token": auth_token,
            "amount_cents": to_cents(amount),
            "expiration": 3600,
            "order_id": order_id,
            "currency": currency,
            "integration_id": self.integration_id,
            "billing_data": {
                "first_name": first_name,
                "last_name": last_name,
                "email": email,
                "phone_number": phone_number,
                "apartment": "NA",
                "floor": "NA",
                "street": "NA",
                "building": "NA",
                "shipping_method": "NA",
                "postal_code": "00000",
                "city": "Cairo",
                "country": "EG",
                "state": "Cairo"
            }
        });

        let parsed: PaymentKeyApiResponse = self.post(&url, body).await?;
        debug!("Generated payment key for order {}", order_id);
        Ok(parsed.token)
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: serde_json::Value,
    ) -> Result<T, PaymentError> {
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("Paymob API error ({}): {}", status, text);
            return Err(PaymentError::Gateway(format!("HTTP {}: {}", status, text)));
        }

        response
            .json()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))
    }
}

fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}
