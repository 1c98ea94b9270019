use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Payment, PaymentError, PaymentKeyResponse, PaymentStatus, PaymobCallback};
use crate::services::paymob::PaymobClient;

pub(crate) fn representation_headers() -> reqwest::header::HeaderMap {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        "Prefer",
        reqwest::header::HeaderValue::from_static("return=representation"),
    );
    headers
}

pub struct PaymentService {
    supabase: SupabaseClient,
    config: AppConfig,
}

impl PaymentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            config: config.clone(),
        }
    }

    pub async fn get_payment(
        &self,
        payment_id: &str,
        auth_token: &str,
    ) -> Result<Payment, PaymentError> {
        let path = format!("/rest/v1/payments?id=eq.{}", payment_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let row = rows.into_iter().next().ok_or(PaymentError::NotFound)?;
        parse_payment(row)
    }

    pub async fn get_payment_for_appointment(
        &self,
        appointment_id: &str,
        auth_token: &str,
    ) -> Result<Payment, PaymentError> {
        let path = format!("/rest/v1/payments?appointment_id=eq.{}", appointment_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let row = rows.into_iter().next().ok_or(PaymentError::NotFound)?;
        parse_payment(row)
    }

    /// Creates the Pending payment for a Paymob appointment and walks the
    /// gateway's order flow, returning the key the client hands to the hosted
    /// checkout.
    pub async fn create_payment_for_appointment(
        &self,
        appointment_id: Uuid,
        user_id: &str,
        auth_token: &str,
    ) -> Result<PaymentKeyResponse, PaymentError> {
        info!("Creating payment for appointment {}", appointment_id);

        let appointment = self.load_appointment(appointment_id, auth_token).await?;
        let patient_id = field_str(&appointment, "patient_id")?;
        let doctor_id = field_str(&appointment, "doctor_id")?;

        if self.payment_exists(appointment_id, auth_token).await? {
            return Err(PaymentError::PaymentExists);
        }

        if patient_id != user_id {
            return Err(PaymentError::NotAppointmentPatient);
        }

        let amount = self.consultation_fee(&doctor_id, auth_token).await?;
        let patient = self.load_patient(&patient_id, auth_token).await?;

        let payment = self
            .insert_pending_payment(appointment_id, amount, auth_token)
            .await?;
        let merchant_order_id = payment.id.to_string();

        let paymob = PaymobClient::new(&self.config)?;
        let gateway_token = paymob.authenticate().await?;
        let order_id = paymob
            .create_order(&gateway_token, amount, &payment.currency, &merchant_order_id)
            .await?;

        self.record_order_ids(payment.id, order_id, &merchant_order_id, auth_token)
            .await?;

        let email = patient
            .get("email")
            .and_then(Value::as_str)
            .unwrap_or("NA");
        let full_name = patient
            .get("full_name")
            .and_then(Value::as_str)
            .unwrap_or("NA");
        let phone_number = patient
            .get("phone_number")
            .and_then(Value::as_str)
            .unwrap_or("NA");

        let payment_key = paymob
            .generate_payment_key(
                &gateway_token,
                order_id,
                amount,
                &payment.currency,
                email,
                full_name,
                phone_number,
            )
            .await?;

        info!(
            "Payment {} created for appointment {} (Paymob order {})",
            payment.id, appointment_id, order_id
        );

        Ok(PaymentKeyResponse {
            payment_id: payment.id,
            payment_key,
        })
    }

    /// Webhook entry point. Resolves the payment through the merchant order id
    /// we issued at checkout, then settles it from the gateway status.
    pub async fn handle_callback(
        &self,
        callback: PaymobCallback,
    ) -> Result<Payment, PaymentError> {
        let path = format!(
            "/rest/v1/payments?paymob_merchant_order_id=eq.{}",
            callback.order_id
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None, None).await?;
        let row = rows.into_iter().next().ok_or(PaymentError::NotFound)?;
        let payment = parse_payment(row)?;

        let transaction_id: i64 = callback
            .payment_id
            .parse()
            .map_err(|_| PaymentError::InvalidTransactionId)?;

        let status = PaymentStatus::from_gateway(&callback.status);
        if status == PaymentStatus::Pending {
            warn!(
                "Gateway reported status {:?} for payment {}, leaving it pending",
                callback.status, payment.id
            );
        }

        let data = json!({
            "paymob_transaction_id": transaction_id,
            "status": status,
            "updated_at": Utc::now().to_rfc3339()
        });

        self.patch_payment(payment.id, data, None).await
    }

    /// Doctor-side settlement for cash appointments.
    pub async fn settle_cash_payment(
        &self,
        appointment_id: &str,
        auth_token: &str,
    ) -> Result<Payment, PaymentError> {
        let payment = self
            .get_payment_for_appointment(appointment_id, auth_token)
            .await?;

        let data = json!({
            "status": PaymentStatus::Paid,
            "updated_at": Utc::now().to_rfc3339()
        });

        let updated = self.patch_payment(payment.id, data, Some(auth_token)).await?;
        info!(
            "Payment {} for appointment {} settled as paid",
            updated.id, appointment_id
        );
        Ok(updated)
    }

    async fn load_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Value, PaymentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;
        rows.into_iter()
            .next()
            .ok_or(PaymentError::AppointmentNotFound)
    }

    async fn payment_exists(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<bool, PaymentError> {
        let path = format!(
            "/rest/v1/payments?appointment_id=eq.{}&select=id",
            appointment_id
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;
        Ok(!rows.is_empty())
    }

    async fn consultation_fee(
        &self,
        doctor_id: &str,
        auth_token: &str,
    ) -> Result<f64, PaymentError> {
        let path = format!(
            "/rest/v1/doctors?id=eq.{}&select=consultation_fee",
            doctor_id
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;
        let row = rows.into_iter().next().ok_or(PaymentError::DoctorNotFound)?;

        let fee = field_str(&row, "consultation_fee")?;
        fee.parse::<f64>().map_err(|_| {
            PaymentError::Validation(format!("Invalid consultation fee: {}", fee))
        })
    }

    async fn load_patient(
        &self,
        patient_id: &str,
        auth_token: &str,
    ) -> Result<Value, PaymentError> {
        let path = format!(
            "/rest/v1/patients?id=eq.{}&select=id,full_name,email,phone_number",
            patient_id
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| PaymentError::Database("Patient row missing".to_string()))
    }

    async fn insert_pending_payment(
        &self,
        appointment_id: Uuid,
        amount: f64,
        auth_token: &str,
    ) -> Result<Payment, PaymentError> {
        let data = json!({
            "appointment_id": appointment_id,
            "amount": amount,
            "currency": "EGP",
            "status": PaymentStatus::Pending,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/payments",
                Some(auth_token),
                Some(data),
                Some(representation_headers()),
            )
            .await?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| PaymentError::Database("Failed to create payment".to_string()))?;
        parse_payment(row)
    }

    async fn record_order_ids(
        &self,
        payment_id: Uuid,
        order_id: i64,
        merchant_order_id: &str,
        auth_token: &str,
    ) -> Result<Payment, PaymentError> {
        let data = json!({
            "paymob_order_id": order_id,
            "paymob_merchant_order_id": merchant_order_id,
            "updated_at": Utc::now().to_rfc3339()
        });
        self.patch_payment(payment_id, data, Some(auth_token)).await
    }

    async fn patch_payment(
        &self,
        payment_id: Uuid,
        data: Value,
        auth_token: Option<&str>,
    ) -> Result<Payment, PaymentError> {
        let path = format!("/rest/v1/payments?id=eq.{}", payment_id);
        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                auth_token,
                Some(data),
                Some(representation_headers()),
            )
            .await?;

        let row = result.into_iter().next().ok_or(PaymentError::NotFound)?;
        parse_payment(row)
    }
}

fn parse_payment(row: Value) -> Result<Payment, PaymentError> {
    serde_json::from_value(row).map_err(|e| PaymentError::Database(e.to_string()))
}

fn field_str(row: &Value, field: &str) -> Result<String, PaymentError> {
    row.get(field)
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| PaymentError::Database(format!("Missing field: {}", field)))
}
