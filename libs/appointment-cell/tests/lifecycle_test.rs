use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::{AppointmentError, AppointmentStatus};
use appointment_cell::services::AppointmentLifecycleService;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

const PATIENT_ID: &str = "55555555-0000-0000-0000-000000000001";
const DOCTOR_ID: &str = "55555555-0000-0000-0000-000000000002";
const BRANCH_ID: &str = "55555555-0000-0000-0000-000000000003";
const APPOINTMENT_ID: &str = "55555555-0000-0000-0000-000000000004";

fn service_for(mock_server: &MockServer) -> AppointmentLifecycleService {
    // Email endpoint is not mocked; notification failure must not fail the op.
    let mut config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    config.email_api_key = String::new();
    AppointmentLifecycleService::new(&config)
}

async fn mock_appointment_with_status(mock_server: &MockServer, status: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", APPOINTMENT_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(
                APPOINTMENT_ID, PATIENT_ID, DOCTOR_ID, BRANCH_ID, "2025-06-10", "morning", status
            )
        ])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn a_confirmed_appointment_can_be_completed() {
    let mock_server = MockServer::start().await;
    mock_appointment_with_status(&mock_server, "confirmed").await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(
                APPOINTMENT_ID, PATIENT_ID, DOCTOR_ID, BRANCH_ID, "2025-06-10", "morning", "completed"
            )
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let appointment = service_for(&mock_server)
        .mark_completed(APPOINTMENT_ID, "token")
        .await
        .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Completed);
}

#[tokio::test]
async fn a_cancelled_appointment_cannot_be_completed() {
    let mock_server = MockServer::start().await;
    mock_appointment_with_status(&mock_server, "cancelled").await;

    let result = service_for(&mock_server)
        .mark_completed(APPOINTMENT_ID, "token")
        .await;

    assert!(matches!(
        result,
        Err(AppointmentError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn a_completed_appointment_cannot_be_cancelled() {
    let mock_server = MockServer::start().await;
    mock_appointment_with_status(&mock_server, "completed").await;

    let result = service_for(&mock_server)
        .cancel_appointment(APPOINTMENT_ID, "token")
        .await;

    assert!(matches!(
        result,
        Err(AppointmentError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn bulk_cancel_counts_only_non_cancelled_appointments() {
    let mock_server = MockServer::start().await;
    let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": DOCTOR_ID, "full_name": "Dr. Omar Farouk" }
        ])))
        .mount(&mock_server)
        .await;

    // The status=neq.cancelled filter is part of the query, so the server only
    // returns the two live appointments.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "neq.cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(
                "55555555-0000-0000-0000-000000000010",
                PATIENT_ID, DOCTOR_ID, BRANCH_ID, "2025-06-10", "morning", "confirmed"
            ),
            MockSupabaseResponses::appointment_row(
                "55555555-0000-0000-0000-000000000011",
                PATIENT_ID, DOCTOR_ID, BRANCH_ID, "2025-06-10", "evening", "confirmed"
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let cancelled = service_for(&mock_server)
        .cancel_for_doctor_on_date(DOCTOR_ID, date, "token")
        .await
        .unwrap();

    assert_eq!(cancelled, 2);
}

#[tokio::test]
async fn bulk_cancel_is_idempotent_when_nothing_is_live() {
    let mock_server = MockServer::start().await;
    let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": DOCTOR_ID, "full_name": "Dr. Omar Farouk" }
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let cancelled = service_for(&mock_server)
        .cancel_for_doctor_on_date(DOCTOR_ID, date, "token")
        .await
        .unwrap();

    assert_eq!(cancelled, 0);
}

#[tokio::test]
async fn bulk_cancel_for_an_unknown_doctor_is_not_found() {
    let mock_server = MockServer::start().await;
    let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = service_for(&mock_server)
        .cancel_for_doctor_on_date(DOCTOR_ID, date, "token")
        .await;

    assert!(matches!(result, Err(AppointmentError::DoctorNotFound)));
}
