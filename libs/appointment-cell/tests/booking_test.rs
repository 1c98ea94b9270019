use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::{
    AppointmentError, AppointmentStatus, BookAppointmentRequest, PaymentMethod,
};
use appointment_cell::services::AppointmentBookingService;
use schedule_cell::models::Shift;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

const PATIENT_ID: &str = "44444444-0000-0000-0000-000000000001";
const DOCTOR_ID: &str = "44444444-0000-0000-0000-000000000002";
const BRANCH_ID: &str = "44444444-0000-0000-0000-000000000003";
const APPOINTMENT_ID: &str = "44444444-0000-0000-0000-000000000004";

fn service_for(mock_server: &MockServer) -> AppointmentBookingService {
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    AppointmentBookingService::new(&config)
}

fn booking_request(payment_method: PaymentMethod) -> BookAppointmentRequest {
    BookAppointmentRequest {
        patient_id: Uuid::parse_str(PATIENT_ID).unwrap(),
        doctor_id: Uuid::parse_str(DOCTOR_ID).unwrap(),
        branch_id: Uuid::parse_str(BRANCH_ID).unwrap(),
        date: Utc::now().date_naive() + Duration::days(7),
        shift: Shift::Morning,
        payment_method,
    }
}

async fn mock_entities_exist(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("id", format!("eq.{}", PATIENT_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": PATIENT_ID }])))
        .mount(mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", DOCTOR_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": DOCTOR_ID }])))
        .mount(mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/branches"))
        .and(query_param("id", format!("eq.{}", BRANCH_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": BRANCH_ID }])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn booking_a_past_date_is_rejected_before_any_lookup() {
    let mock_server = MockServer::start().await;

    let mut request = booking_request(PaymentMethod::Cash);
    request.date = Utc::now().date_naive() - Duration::days(1);

    let result = service_for(&mock_server)
        .book_appointment(request, "token")
        .await;

    assert!(matches!(result, Err(AppointmentError::DateInPast)));
}

#[tokio::test]
async fn booking_an_unknown_patient_is_a_not_found_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = service_for(&mock_server)
        .book_appointment(booking_request(PaymentMethod::Cash), "token")
        .await;

    assert!(matches!(result, Err(AppointmentError::PatientNotFound)));
}

#[tokio::test]
async fn a_duplicate_slot_is_rejected_regardless_of_status() {
    let mock_server = MockServer::start().await;
    mock_entities_exist(&mock_server).await;

    let date = (Utc::now().date_naive() + Duration::days(7))
        .format("%Y-%m-%d")
        .to_string();

    // A cancelled appointment in the slot still blocks rebooking.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("patient_id", format!("eq.{}", PATIENT_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(
                APPOINTMENT_ID, PATIENT_ID, DOCTOR_ID, BRANCH_ID, &date, "morning", "cancelled"
            )
        ])))
        .mount(&mock_server)
        .await;

    let result = service_for(&mock_server)
        .book_appointment(booking_request(PaymentMethod::Cash), "token")
        .await;

    assert!(matches!(result, Err(AppointmentError::DuplicateBooking)));
}

#[tokio::test]
async fn cash_booking_goes_through_the_transactional_rpc() {
    let mock_server = MockServer::start().await;
    mock_entities_exist(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let date = (Utc::now().date_naive() + Duration::days(7))
        .format("%Y-%m-%d")
        .to_string();

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/book_cash_appointment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockSupabaseResponses::appointment_row(
                APPOINTMENT_ID, PATIENT_ID, DOCTOR_ID, BRANCH_ID, &date, "morning", "confirmed",
            ),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let appointment = service_for(&mock_server)
        .book_appointment(booking_request(PaymentMethod::Cash), "token")
        .await
        .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Confirmed);
}

#[tokio::test]
async fn a_failed_rpc_surfaces_without_a_stray_insert() {
    let mock_server = MockServer::start().await;
    mock_entities_exist(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/book_cash_appointment"))
        .respond_with(ResponseTemplate::new(500).set_body_string("function error"))
        .mount(&mock_server)
        .await;

    // No plain insert may happen when the RPC fails.
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let result = service_for(&mock_server)
        .book_appointment(booking_request(PaymentMethod::Cash), "token")
        .await;

    assert!(matches!(result, Err(AppointmentError::Database(_))));
}
