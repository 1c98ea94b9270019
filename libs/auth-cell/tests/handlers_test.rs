use axum::{extract::State, http::HeaderMap};

use auth_cell::handlers::{validate_token, verify_token};
use shared_models::error::AppError;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn auth_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Authorization", format!("Bearer {}", token).parse().unwrap());
    headers
}

#[tokio::test]
async fn validate_accepts_a_signed_token() {
    let config = TestConfig::default();
    let user = TestUser::patient("aya@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);

    let response = validate_token(State(config.to_arc()), auth_headers(&token))
        .await
        .unwrap();

    assert!(response.0.valid);
    assert_eq!(response.0.user_id, user.id);
    assert_eq!(response.0.role.as_deref(), Some("patient"));
}

#[tokio::test]
async fn validate_rejects_an_expired_token() {
    let config = TestConfig::default();
    let user = TestUser::patient("aya@example.com");
    let token = JwtTestUtils::create_expired_token(&user, &config.jwt_secret);

    let result = validate_token(State(config.to_arc()), auth_headers(&token)).await;

    assert!(matches!(result, Err(AppError::Auth(_))));
}

#[tokio::test]
async fn validate_rejects_a_missing_header() {
    let config = TestConfig::default();

    let result = validate_token(State(config.to_arc()), HeaderMap::new()).await;

    assert!(matches!(result, Err(AppError::Auth(_))));
}

#[tokio::test]
async fn verify_reports_false_for_a_tampered_token() {
    let config = TestConfig::default();
    let user = TestUser::doctor("omar@example.com");
    let token = JwtTestUtils::create_test_token(&user, "some-other-secret", None);

    let response = verify_token(State(config.to_arc()), auth_headers(&token))
        .await
        .unwrap();

    assert_eq!(response.0["valid"], false);
}
