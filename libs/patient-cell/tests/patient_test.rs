use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use patient_cell::models::{CreatePatientRequest, PatientError};
use patient_cell::services::PatientService;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

fn service_for(mock_server: &MockServer) -> PatientService {
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    PatientService::new(&config)
}

fn create_request(email: &str) -> CreatePatientRequest {
    CreatePatientRequest {
        full_name: "Aya Hassan".to_string(),
        email: email.to_string(),
        phone_number: "+201000000000".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 15).unwrap(),
        gender: "female".to_string(),
        address: Some("12 Corniche St, Cairo".to_string()),
    }
}

#[tokio::test]
async fn create_patient_rejects_a_duplicate_email() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("email", "eq.aya@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::patient_row(
                "11111111-0000-0000-0000-000000000001",
                "aya@example.com",
                "Aya Hassan"
            )
        ])))
        .mount(&mock_server)
        .await;

    let result = service_for(&mock_server)
        .create_patient(create_request("aya@example.com"), "token")
        .await;

    assert!(matches!(result, Err(PatientError::EmailAlreadyExists { .. })));
}

#[tokio::test]
async fn create_patient_inserts_when_email_is_free() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("email", "eq.new@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::patient_row(
                "11111111-0000-0000-0000-000000000002",
                "new@example.com",
                "Aya Hassan"
            )
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let patient = service_for(&mock_server)
        .create_patient(create_request("new@example.com"), "token")
        .await
        .unwrap();

    assert_eq!(patient.email, "new@example.com");
}

#[tokio::test]
async fn get_patient_maps_an_empty_result_to_not_found() {
    let mock_server = MockServer::start().await;
    let patient_id = "11111111-0000-0000-0000-000000000003";

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("id", format!("eq.{}", patient_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = service_for(&mock_server).get_patient(patient_id, "token").await;

    assert!(matches!(result, Err(PatientError::NotFound)));
}
