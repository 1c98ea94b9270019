use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_utils::test_utils::TestConfig;
use support_cell::models::{CreateTicketRequest, SupportError, TicketStatus, UpdateTicketRequest};
use support_cell::services::SupportTicketService;

const USER_ID: &str = "88888888-0000-0000-0000-000000000001";
const TICKET_ID: &str = "88888888-0000-0000-0000-000000000002";

fn service_for(mock_server: &MockServer) -> SupportTicketService {
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    SupportTicketService::new(&config)
}

fn ticket_row(status: &str) -> serde_json::Value {
    json!({
        "id": TICKET_ID,
        "user_id": USER_ID,
        "subject": "Cannot see my invoices",
        "description": "The payments page shows an empty list.",
        "status": status,
        "created_at": "2026-03-01T09:00:00Z",
        "updated_at": "2026-03-01T09:00:00Z"
    })
}

#[tokio::test]
async fn new_tickets_open_as_open() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/support_tickets"))
        .and(body_partial_json(json!({
            "user_id": USER_ID,
            "subject": "Cannot see my invoices",
            "status": "open"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([ticket_row("open")])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ticket = service_for(&mock_server)
        .create_ticket(
            USER_ID,
            CreateTicketRequest {
                subject: "Cannot see my invoices".to_string(),
                description: "The payments page shows an empty list.".to_string(),
            },
            "token",
        )
        .await
        .unwrap();

    assert_eq!(ticket.status, TicketStatus::Open);
}

#[tokio::test]
async fn a_blank_subject_is_rejected_without_any_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/support_tickets"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let result = service_for(&mock_server)
        .create_ticket(
            USER_ID,
            CreateTicketRequest {
                subject: "   ".to_string(),
                description: "details".to_string(),
            },
            "token",
        )
        .await;

    assert_matches!(result, Err(SupportError::Validation(_)));
}

#[tokio::test]
async fn updating_a_ticket_patches_only_the_given_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/support_tickets"))
        .and(query_param("id", format!("eq.{}", TICKET_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([ticket_row("open")])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/support_tickets"))
        .and(query_param("id", format!("eq.{}", TICKET_ID)))
        .and(body_partial_json(json!({ "status": "resolved" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([ticket_row("resolved")])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ticket = service_for(&mock_server)
        .update_ticket(
            TICKET_ID,
            UpdateTicketRequest {
                subject: None,
                description: None,
                status: Some(TicketStatus::Resolved),
            },
            "token",
        )
        .await
        .unwrap();

    assert_eq!(ticket.status, TicketStatus::Resolved);
}

#[tokio::test]
async fn getting_a_missing_ticket_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/support_tickets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = service_for(&mock_server).get_ticket(TICKET_ID, "token").await;

    assert_matches!(result, Err(SupportError::NotFound));
}
