use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use catalog_cell::models::{CatalogError, CreateBranchRequest};
use catalog_cell::services::BranchService;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

fn service_for(mock_server: &MockServer) -> BranchService {
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    BranchService::new(&config)
}

#[tokio::test]
async fn create_branch_returns_the_inserted_row() {
    let mock_server = MockServer::start().await;
    let branch_id = "6f2d9c4e-0000-0000-0000-000000000001";

    Mock::given(method("POST"))
        .and(path("/rest/v1/branches"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::branch_row(branch_id, "Giza Branch")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = CreateBranchRequest {
        name: "Giza Branch".to_string(),
        address: "1 Nile St, Giza".to_string(),
        phone_number: Some("+20223456789".to_string()),
        email: None,
        description: None,
        image_url: None,
        latitude: Some(30.0444),
        longitude: Some(31.2357),
    };

    let branch = service_for(&mock_server)
        .create_branch(request, "token")
        .await
        .unwrap();

    assert_eq!(branch.name, "Giza Branch");
}

#[tokio::test]
async fn create_branch_rejects_an_empty_name() {
    let mock_server = MockServer::start().await;

    let request = CreateBranchRequest {
        name: "  ".to_string(),
        address: "1 Nile St".to_string(),
        phone_number: None,
        email: None,
        description: None,
        image_url: None,
        latitude: None,
        longitude: None,
    };

    let result = service_for(&mock_server).create_branch(request, "token").await;

    assert!(matches!(result, Err(CatalogError::Validation(_))));
}

#[tokio::test]
async fn get_branch_maps_an_empty_result_to_not_found() {
    let mock_server = MockServer::start().await;
    let branch_id = "6f2d9c4e-0000-0000-0000-000000000002";

    Mock::given(method("GET"))
        .and(path("/rest/v1/branches"))
        .and(query_param("id", format!("eq.{}", branch_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = service_for(&mock_server).get_branch(branch_id, "token").await;

    assert!(matches!(result, Err(CatalogError::BranchNotFound)));
}

#[tokio::test]
async fn delete_branch_checks_existence_first() {
    let mock_server = MockServer::start().await;
    let branch_id = "6f2d9c4e-0000-0000-0000-000000000003";

    Mock::given(method("GET"))
        .and(path("/rest/v1/branches"))
        .and(query_param("id", format!("eq.{}", branch_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = service_for(&mock_server).delete_branch(branch_id, "token").await;

    assert!(matches!(result, Err(CatalogError::BranchNotFound)));
}
