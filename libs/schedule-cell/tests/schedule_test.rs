use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use schedule_cell::models::{CreateScheduleRequest, ScheduleError, Shift};
use schedule_cell::services::ScheduleService;
use shared_utils::test_utils::TestConfig;

const DOCTOR_ID: &str = "33333333-0000-0000-0000-000000000001";

fn service_for(mock_server: &MockServer) -> ScheduleService {
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    ScheduleService::new(&config)
}

fn schedule_row(id: &str, day: &str, shift: &str) -> serde_json::Value {
    json!({
        "id": id,
        "doctor_id": DOCTOR_ID,
        "day_of_week": day,
        "shift": shift,
        "start_time": "10:00:00",
        "end_time": "13:00:00",
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
    })
}

async fn mock_doctor_exists(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", DOCTOR_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": DOCTOR_ID }])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn create_schedule_rejects_a_duplicate_day_and_shift() {
    let mock_server = MockServer::start().await;
    mock_doctor_exists(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/schedules"))
        .and(query_param("doctor_id", format!("eq.{}", DOCTOR_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            schedule_row("33333333-0000-0000-0000-000000000002", "Monday", "morning")
        ])))
        .mount(&mock_server)
        .await;

    let request = CreateScheduleRequest {
        doctor_id: Uuid::parse_str(DOCTOR_ID).unwrap(),
        day_of_week: "Monday".to_string(),
        shift: Shift::Morning,
    };

    let result = service_for(&mock_server).create_schedule(request, "token").await;

    assert!(matches!(result, Err(ScheduleError::DuplicateSchedule { .. })));
}

#[tokio::test]
async fn create_schedule_derives_times_from_the_shift() {
    let mock_server = MockServer::start().await;
    mock_doctor_exists(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/schedules"))
        .and(wiremock::matchers::body_partial_json(json!({
            "shift": "evening",
            "start_time": "18:00:00",
            "end_time": "21:00:00"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": "33333333-0000-0000-0000-000000000003",
            "doctor_id": DOCTOR_ID,
            "day_of_week": "Friday",
            "shift": "evening",
            "start_time": "18:00:00",
            "end_time": "21:00:00",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = CreateScheduleRequest {
        doctor_id: Uuid::parse_str(DOCTOR_ID).unwrap(),
        day_of_week: "Friday".to_string(),
        shift: Shift::Evening,
    };

    let schedule = service_for(&mock_server)
        .create_schedule(request, "token")
        .await
        .unwrap();

    assert_eq!(schedule.shift, Shift::Evening);
}

#[tokio::test]
async fn create_schedule_rejects_an_unknown_doctor() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let request = CreateScheduleRequest {
        doctor_id: Uuid::parse_str(DOCTOR_ID).unwrap(),
        day_of_week: "Monday".to_string(),
        shift: Shift::Morning,
    };

    let result = service_for(&mock_server).create_schedule(request, "token").await;

    assert!(matches!(result, Err(ScheduleError::DoctorNotFound)));
}

#[tokio::test]
async fn create_schedule_rejects_an_unknown_day() {
    let mock_server = MockServer::start().await;

    let request = CreateScheduleRequest {
        doctor_id: Uuid::parse_str(DOCTOR_ID).unwrap(),
        day_of_week: "Someday".to_string(),
        shift: Shift::Morning,
    };

    let result = service_for(&mock_server).create_schedule(request, "token").await;

    assert!(matches!(result, Err(ScheduleError::Validation(_))));
}
