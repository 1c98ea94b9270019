use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use payment_cell::models::{PaymentError, PaymentStatus, PaymobCallback};
use payment_cell::services::PaymentService;
use shared_config::AppConfig;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

const PATIENT_ID: &str = "55555555-0000-0000-0000-000000000001";
const DOCTOR_ID: &str = "55555555-0000-0000-0000-000000000002";
const BRANCH_ID: &str = "55555555-0000-0000-0000-000000000003";
const APPOINTMENT_ID: &str = "55555555-0000-0000-0000-000000000004";
const PAYMENT_ID: &str = "55555555-0000-0000-0000-000000000005";

/// Both PostgREST and the gateway are served from the same mock server; their
/// path spaces do not overlap.
fn config_for(mock_server: &MockServer) -> AppConfig {
    let mut config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    config.paymob_base_url = mock_server.uri();
    config
}

fn appointment_id() -> Uuid {
    Uuid::parse_str(APPOINTMENT_ID).unwrap()
}

async fn mock_appointment_exists(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", APPOINTMENT_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(
                APPOINTMENT_ID,
                PATIENT_ID,
                DOCTOR_ID,
                BRANCH_ID,
                "2026-09-10",
                "morning",
                "confirmed",
            )
        ])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn paymob_flow_returns_payment_key_and_records_order_ids() {
    let mock_server = MockServer::start().await;
    mock_appointment_exists(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/payments"))
        .and(query_param("appointment_id", format!("eq.{}", APPOINTMENT_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", DOCTOR_ID)))
        .respond_with(ResponseTemplate::new(200)
            .set_body_json(json!([{ "consultation_fee": "350.00" }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("id", format!("eq.{}", PATIENT_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": PATIENT_ID,
            "full_name": "Mona Adel",
            "email": "mona@example.com",
            "phone_number": "+201000000000"
        }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/payments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::payment_row(PAYMENT_ID, APPOINTMENT_ID, 350.0, "pending")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/tokens"))
        .and(body_partial_json(json!({ "api_key": "test-paymob-key" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "gateway-token" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/ecommerce/orders"))
        .and(body_partial_json(json!({
            "auth_token": "gateway-token",
            "amount_cents": 35000,
            "currency": "EGP",
            "merchant_order_id": PAYMENT_ID
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 9921 })))
        .expect(1)
        .mount(&mock_server)
        .await;

    // The order ids must be persisted before the key is minted.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/payments"))
        .and(query_param("id", format!("eq.{}", PAYMENT_ID)))
        .and(body_partial_json(json!({
            "paymob_order_id": 9921,
            "paymob_merchant_order_id": PAYMENT_ID
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::payment_row(PAYMENT_ID, APPOINTMENT_ID, 350.0, "pending")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/acceptance/payment_keys"))
        .and(body_partial_json(json!({
            "order_id": 9921,
            "integration_id": 4417,
            "billing_data": {
                "first_name": "Mona",
                "last_name": "Adel",
                "city": "Cairo",
                "country": "EG"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "pay-key-abc" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = PaymentService::new(&config_for(&mock_server));
    let result = service
        .create_payment_for_appointment(appointment_id(), PATIENT_ID, "token")
        .await
        .unwrap();

    assert_eq!(result.payment_key, "pay-key-abc");
    assert_eq!(result.payment_id.to_string(), PAYMENT_ID);
}

#[tokio::test]
async fn existing_payment_blocks_a_second_one_before_the_gateway_is_called() {
    let mock_server = MockServer::start().await;
    mock_appointment_exists(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/payments"))
        .and(query_param("appointment_id", format!("eq.{}", APPOINTMENT_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::payment_row(PAYMENT_ID, APPOINTMENT_ID, 350.0, "pending")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "unused" })))
        .expect(0)
        .mount(&mock_server)
        .await;

    let service = PaymentService::new(&config_for(&mock_server));
    let result = service
        .create_payment_for_appointment(appointment_id(), PATIENT_ID, "token")
        .await;

    assert_matches!(result, Err(PaymentError::PaymentExists));
}

#[tokio::test]
async fn only_the_appointments_patient_can_create_the_payment() {
    let mock_server = MockServer::start().await;
    mock_appointment_exists(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/payments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let service = PaymentService::new(&config_for(&mock_server));
    let someone_else = Uuid::new_v4().to_string();
    let result = service
        .create_payment_for_appointment(appointment_id(), &someone_else, "token")
        .await;

    assert_matches!(result, Err(PaymentError::NotAppointmentPatient));
}

#[tokio::test]
async fn captured_callback_marks_the_payment_paid() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/payments"))
        .and(query_param(
            "paymob_merchant_order_id",
            format!("eq.{}", PAYMENT_ID),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::payment_row(PAYMENT_ID, APPOINTMENT_ID, 350.0, "pending")
        ])))
        .mount(&mock_server)
        .await;

    let mut paid_row =
        MockSupabaseResponses::payment_row(PAYMENT_ID, APPOINTMENT_ID, 350.0, "paid");
    paid_row["paymob_transaction_id"] = json!(777);

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/payments"))
        .and(query_param("id", format!("eq.{}", PAYMENT_ID)))
        .and(body_partial_json(json!({
            "status": "paid",
            "paymob_transaction_id": 777
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([paid_row])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = PaymentService::new(&config_for(&mock_server));
    let payment = service
        .handle_callback(PaymobCallback {
            payment_id: "777".to_string(),
            order_id: PAYMENT_ID.to_string(),
            status: "CAPTURED".to_string(),
            amount: Some(350.0),
            currency: Some("EGP".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(payment.status, PaymentStatus::Paid);
    assert_eq!(payment.paymob_transaction_id, Some(777));
}

#[tokio::test]
async fn callback_with_a_non_numeric_transaction_id_is_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/payments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::payment_row(PAYMENT_ID, APPOINTMENT_ID, 350.0, "pending")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/payments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let service = PaymentService::new(&config_for(&mock_server));
    let result = service
        .handle_callback(PaymobCallback {
            payment_id: "not-a-number".to_string(),
            order_id: PAYMENT_ID.to_string(),
            status: "CAPTURED".to_string(),
            amount: None,
            currency: None,
        })
        .await;

    assert_matches!(result, Err(PaymentError::InvalidTransactionId));
}

#[tokio::test]
async fn cash_settlement_marks_the_payment_paid() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/payments"))
        .and(query_param("appointment_id", format!("eq.{}", APPOINTMENT_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::payment_row(PAYMENT_ID, APPOINTMENT_ID, 350.0, "pending")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/payments"))
        .and(query_param("id", format!("eq.{}", PAYMENT_ID)))
        .and(body_partial_json(json!({ "status": "paid" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::payment_row(PAYMENT_ID, APPOINTMENT_ID, 350.0, "paid")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = PaymentService::new(&config_for(&mock_server));
    let payment = service
        .settle_cash_payment(APPOINTMENT_ID, "token")
        .await
        .unwrap();

    assert_eq!(payment.status, PaymentStatus::Paid);
}
