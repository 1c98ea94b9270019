use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    /// Maps the gateway's transaction status string onto our payment status.
    /// Anything unrecognised stays Pending until a later callback settles it.
    pub fn from_gateway(status: &str) -> Self {
        match status.to_ascii_uppercase().as_str() {
            "CAPTURED" => PaymentStatus::Paid,
            "FAILED" => PaymentStatus::Failed,
            _ => PaymentStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
    pub paymob_order_id: Option<i64>,
    pub paymob_merchant_order_id: Option<String>,
    pub paymob_transaction_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Webhook payload from Paymob. `order_id` carries our merchant order id back
/// to us; `payment_id` is Paymob's transaction identifier.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymobCallback {
    pub payment_id: String,
    pub order_id: String,
    pub status: String,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentKeyResponse {
    pub payment_id: Uuid,
    pub payment_key: String,
}

/// A Paid payment joined with its appointment context, the unit the revenue
/// reports aggregate over.
#[derive(Debug, Clone)]
pub struct RevenueRow {
    pub amount: f64,
    pub doctor_id: Uuid,
    pub branch_id: Uuid,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyRevenue {
    pub month: u32,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BranchRevenue {
    pub branch_id: Uuid,
    pub branch_name: String,
    pub total: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment not found")]
    NotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Branch not found")]
    BranchNotFound,

    #[error("A payment already exists for this appointment")]
    PaymentExists,

    #[error("Only the appointment's patient can pay for it")]
    NotAppointmentPatient,

    #[error("Invalid gateway transaction ID")]
    InvalidTransactionId,

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for PaymentError {
    fn from(err: anyhow::Error) -> Self {
        PaymentError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_status_captured_maps_to_paid() {
        assert_eq!(PaymentStatus::from_gateway("CAPTURED"), PaymentStatus::Paid);
        assert_eq!(PaymentStatus::from_gateway("captured"), PaymentStatus::Paid);
    }

    #[test]
    fn gateway_status_failed_maps_to_failed() {
        assert_eq!(PaymentStatus::from_gateway("FAILED"), PaymentStatus::Failed);
    }

    #[test]
    fn unknown_gateway_status_stays_pending() {
        assert_eq!(PaymentStatus::from_gateway("PENDING"), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::from_gateway("VOIDED"), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::from_gateway(""), PaymentStatus::Pending);
    }

    #[test]
    fn payment_status_serializes_snake_case() {
        let json = serde_json::to_value(PaymentStatus::Paid).unwrap();
        assert_eq!(json, serde_json::json!("paid"));
    }
}
