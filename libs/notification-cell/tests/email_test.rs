use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use notification_cell::models::NotificationError;
use notification_cell::EmailService;
use shared_utils::test_utils::TestConfig;

fn config_for(mock_server: &MockServer) -> shared_config::AppConfig {
    let mut config = TestConfig::default().to_app_config();
    config.email_api_base_url = mock_server.uri();
    config
}

#[tokio::test]
async fn send_posts_message_with_bearer_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(header("Authorization", "Bearer test-email-key"))
        .and(body_partial_json(serde_json::json!({
            "to": "patient@example.com",
            "subject": "Hello"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "msg_123"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server);
    let service = EmailService::new(&config).unwrap();

    let result = service
        .send("patient@example.com", "Hello", "<p>Hi</p>")
        .await
        .unwrap();

    assert_eq!(result.id.as_deref(), Some("msg_123"));
}

#[tokio::test]
async fn send_surfaces_api_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(422).set_body_string("invalid recipient"))
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server);
    let service = EmailService::new(&config).unwrap();

    let result = service.send("bad", "Hello", "<p>Hi</p>").await;

    assert!(matches!(result, Err(NotificationError::ApiError(_))));
}

#[tokio::test]
async fn new_requires_configuration() {
    let mut config = TestConfig::default().to_app_config();
    config.email_api_key = String::new();

    let result = EmailService::new(&config);

    assert!(matches!(result, Err(NotificationError::NotConfigured)));
}
