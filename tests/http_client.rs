use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use apikey_provisioner::apikey::{ApiKeyResource, ApiKeyResourceModel, LifecycleTimeouts};
use apikey_provisioner::cloud::types::{CreateApiKeyRequest, DeleteApiKeyRequest};
use apikey_provisioner::cloud::{CloudService, HttpCloudService, OperationState};
use apikey_provisioner::errors::RemoteErrorCode;
use apikey_provisioner::{CallContext, PollConfig, ProvisionerError};

const TOKEN: &str = "test-bearer-token";
const API_VERSION: &str = "2024-10-01-00";

fn client(server: &MockServer) -> HttpCloudService {
    HttpCloudService::with_timeout(
        &server.uri(),
        API_VERSION,
        TOKEN.to_string(),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn api_key_body(id: &str, state: &str) -> serde_json::Value {
    json!({
        "apiKey": {
            "id": id,
            "resourceVersion": "7",
            "state": state,
            "spec": {
                "ownerId": "sa-1",
                "ownerType": "OWNER_TYPE_SERVICE_ACCOUNT",
                "displayName": "ci-key",
                "expiryTime": "2030-01-01T00:00:00Z"
            }
        }
    })
}

#[tokio::test]
async fn test_get_api_key_sends_auth_and_version_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cloud/api-keys/key-1"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .and(header("x-api-version", API_VERSION))
        .respond_with(ResponseTemplate::new(200).set_body_json(api_key_body("key-1", "RESOURCE_STATE_ACTIVE")))
        .expect(1)
        .mount(&server)
        .await;

    let api_key = client(&server).get_api_key("key-1").await.unwrap();
    assert_eq!(api_key.id, "key-1");
    assert_eq!(api_key.resource_version, "7");
    assert_eq!(api_key.spec.owner_type, "OWNER_TYPE_SERVICE_ACCOUNT");
    assert!(!api_key.spec.disabled);
}

#[tokio::test]
async fn test_status_codes_map_to_remote_error_codes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cloud/api-keys/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"code": 5, "message": "api key not found"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cloud/api-keys/busy"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cloud/api-keys/forbidden"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let client = client(&server);

    let err = client.get_api_key("missing").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.message, "api key not found");

    let err = client.get_api_key("busy").await.unwrap_err();
    assert_eq!(err.code, RemoteErrorCode::Unavailable);
    assert_eq!(err.message, "upstream unavailable");

    let err = client.get_api_key("forbidden").await.unwrap_err();
    assert_eq!(err.code, RemoteErrorCode::PermissionDenied);
}

#[tokio::test]
async fn test_undecodable_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cloud/api-keys/key-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client(&server).get_api_key("key-1").await.unwrap_err();
    assert_eq!(err.code, RemoteErrorCode::Decode);
}

#[tokio::test]
async fn test_create_posts_camel_case_spec() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cloud/api-keys"))
        .and(body_partial_json(json!({
            "asyncOperationId": "op-123",
            "spec": {
                "ownerId": "sa-1",
                "ownerType": "OWNER_TYPE_SERVICE_ACCOUNT",
                "displayName": "ci-key",
                "expiryTime": "2030-01-01T00:00:00Z"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "keyId": "key-1",
            "token": "tck_secret",
            "asyncOperation": {"id": "op-123", "state": "STATE_PENDING"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let spec = ApiKeyResourceModel::new("service-account", "sa-1", "ci-key", "2030-01-01T00:00:00Z")
        .to_spec()
        .unwrap();
    let response = client(&server)
        .create_api_key(CreateApiKeyRequest {
            spec,
            async_operation_id: "op-123".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(response.key_id, "key-1");
    assert_eq!(response.token, "tck_secret");
    assert_eq!(
        response.async_operation.map(|op| op.state),
        Some(OperationState::Pending)
    );
}

#[tokio::test]
async fn test_delete_passes_version_and_operation_id_as_query() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/cloud/api-keys/key-1"))
        .and(query_param("resourceVersion", "7"))
        .and(query_param("asyncOperationId", "op-del"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "asyncOperation": {"id": "op-del", "state": "STATE_FULFILLED"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server)
        .delete_api_key(
            "key-1",
            DeleteApiKeyRequest {
                resource_version: "7".to_string(),
                async_operation_id: "op-del".to_string(),
            },
        )
        .await
        .unwrap();
    assert!(response.async_operation.is_some());
}

#[tokio::test]
async fn test_stale_version_is_a_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/cloud/api-keys/key-1"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({"message": "resource version mismatch"})),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .delete_api_key(
            "key-1",
            DeleteApiKeyRequest {
                resource_version: "6".to_string(),
                async_operation_id: "op-del".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, RemoteErrorCode::Conflict);
}

#[tokio::test]
async fn test_resource_create_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cloud/api-keys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "keyId": "key-1",
            "token": "tck_secret",
            "asyncOperation": {"id": "op-1", "state": "STATE_IN_PROGRESS"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/cloud/operations/[^/]+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "asyncOperation": {"id": "op-1", "state": "STATE_FULFILLED"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cloud/api-keys/key-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(api_key_body("key-1", "RESOURCE_STATE_ACTIVE")))
        .mount(&server)
        .await;

    let resource = ApiKeyResource::new(
        Arc::new(client(&server)),
        PollConfig::fixed(Duration::from_millis(5)),
        LifecycleTimeouts::default(),
    );
    let created = resource
        .create(
            &CallContext::background(),
            &ApiKeyResourceModel::new("service-account", "sa-1", "ci-key", "2030-01-01T00:00:00Z"),
        )
        .await
        .unwrap();

    assert_eq!(created.id.as_deref(), Some("key-1"));
    assert_eq!(created.state.as_deref(), Some("active"));
    assert_eq!(created.token.as_ref().map(|t| t.expose()), Some("tck_secret"));
}

#[tokio::test]
async fn test_resource_reports_failed_operation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cloud/api-keys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "keyId": "key-1",
            "token": "tck_secret",
            "asyncOperation": {"id": "op-1", "state": "STATE_PENDING"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/cloud/operations/[^/]+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "asyncOperation": {
                "id": "op-1",
                "state": "STATE_FAILED",
                "failureReason": "owner does not exist"
            }
        })))
        .mount(&server)
        .await;

    let resource = ApiKeyResource::new(
        Arc::new(client(&server)),
        PollConfig::fixed(Duration::from_millis(5)),
        LifecycleTimeouts::default(),
    );
    let err = resource
        .create(
            &CallContext::background(),
            &ApiKeyResourceModel::new("service-account", "sa-1", "ci-key", "2030-01-01T00:00:00Z"),
        )
        .await
        .unwrap_err();

    match err {
        ProvisionerError::OperationFailed { reason, .. } => {
            assert_eq!(reason, "owner does not exist")
        }
        other => panic!("expected operation failure, got {other}"),
    }
}

#[tokio::test]
async fn test_key_ids_stay_within_their_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cloud/api-keys/key%2F..%3Fx"))
        .respond_with(ResponseTemplate::new(200).set_body_json(api_key_body("key/..?x", "RESOURCE_STATE_ACTIVE")))
        .expect(1)
        .mount(&server)
        .await;

    let api_key = client(&server).get_api_key("key/..?x").await.unwrap();
    assert_eq!(api_key.id, "key/..?x");
}
