//! Integration tests using mock HTTP server
//!
//! Tests the full flow: YAML definition → registry → vendor HTTP calls →
//! flattened objects and cursors, and the HTTP boundary in front of it.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use solidafy_adapters::cli::{build_registry, router};
use solidafy_adapters::config::AdapterConfig;
use solidafy_adapters::cursor::{self, CompositeCursor};
use solidafy_adapters::datasource::rest::{load_definition, load_definition_from_str};
use solidafy_adapters::{AdapterRegistry, ErrorCode, GetPageRequest};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{basic_auth, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn registry(config: AdapterConfig) -> AdapterRegistry {
    build_registry(
        Arc::new(config),
        [load_definition("servicenow").unwrap()],
    )
    .unwrap()
}

fn request_json(address: &str, entity: Value, page_size: usize, cursor: &str) -> Value {
    json!({
        "datasource": {
            "id": "snow-prod",
            "type": "servicenow",
            "address": address,
            "auth": {"type": "basic", "username": "sync", "password": "secret"},
            "config": {}
        },
        "entity": entity,
        "pageSize": page_size,
        "cursor": cursor
    })
}

fn user_entity() -> Value {
    json!({
        "id": "users",
        "externalId": "sys_user",
        "attributes": [
            {"id": "sys_id", "externalId": "sys_id", "uniqueId": true},
            {"id": "email", "externalId": "email"},
            {"id": "active", "externalId": "active", "type": "bool"},
            {"id": "updated", "externalId": "sys_updated_on", "type": "datetime"}
        ]
    })
}

async fn mount_users(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/now/table/sys_user"))
        .and(query_param("sysparm_offset", "0"))
        .and(basic_auth("sync", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [
                {"sys_id": "u1", "email": "ada@example.com", "active": "true", "sys_updated_on": "2024-03-01 10:00:00"},
                {"sys_id": "u2", "email": "alan@example.com", "active": "false", "sys_updated_on": "2024-03-02 11:30:00"}
            ]
        })))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/now/table/sys_user"))
        .and(query_param("sysparm_offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [
                {"sys_id": "u3", "email": "grace@example.com", "active": "true", "sys_updated_on": "2024-03-03 09:15:00"}
            ]
        })))
        .mount(mock_server)
        .await;
}

// ============================================================================
// Registry
// ============================================================================

#[tokio::test]
async fn test_rest_sync_through_registry() {
    let mock_server = MockServer::start().await;
    mount_users(&mock_server).await;

    let registry = registry(AdapterConfig::default());
    let mut request: GetPageRequest =
        serde_json::from_value(request_json(&mock_server.uri(), user_entity(), 2, "")).unwrap();

    let mut emails = Vec::new();
    let mut cursors = Vec::new();
    loop {
        let page = registry.handle(&request).await.unwrap();
        for object in &page.objects {
            let value = serde_json::to_value(object).unwrap();
            emails.push(value["attributes"]["email"].as_str().unwrap().to_string());
        }
        if page.is_last() {
            break;
        }
        cursors.push(page.next_cursor.clone());
        request.cursor = page.next_cursor;
        assert!(cursors.len() < 10, "sync did not terminate");
    }

    assert_eq!(
        emails,
        vec!["ada@example.com", "alan@example.com", "grace@example.com"]
    );
    assert_eq!(cursors.len(), 1);
    let decoded: CompositeCursor = cursor::unmarshal(&cursors[0]).unwrap().unwrap();
    assert_eq!(decoded, CompositeCursor::with_cursor("2".to_string()));
}

#[tokio::test]
async fn test_typed_attributes() {
    let mock_server = MockServer::start().await;
    mount_users(&mock_server).await;

    let registry = registry(AdapterConfig::default());
    let request: GetPageRequest =
        serde_json::from_value(request_json(&mock_server.uri(), user_entity(), 2, "")).unwrap();

    let page = registry.handle(&request).await.unwrap();
    let first = serde_json::to_value(&page.objects[0]).unwrap();

    assert_eq!(first["attributes"]["active"], json!(true));
    assert_eq!(first["attributes"]["updated"], json!("2024-03-01T10:00:00Z"));
}

#[tokio::test]
async fn test_registry_rejects_before_vendor_calls() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": []})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let registry = registry(AdapterConfig {
        max_page_size: 50,
        ..AdapterConfig::default()
    });

    let cases = [
        (request_json(&mock_server.uri(), user_entity(), 51, ""), ErrorCode::InvalidPageRequestConfig),
        (request_json(&mock_server.uri(), user_entity(), 0, ""), ErrorCode::InvalidPageRequestConfig),
        (request_json(&mock_server.uri(), user_entity(), 10, "%%%"), ErrorCode::InvalidPageRequestConfig),
        (
            request_json(
                &mock_server.uri(),
                json!({"id": "x", "externalId": "cmdb_ci", "attributes": [{"id": "id", "externalId": "sys_id", "uniqueId": true}]}),
                10,
                "",
            ),
            ErrorCode::InvalidEntityConfig,
        ),
        (
            request_json(
                &mock_server.uri(),
                json!({"id": "users", "externalId": "sys_user", "attributes": [{"id": "email", "externalId": "email"}]}),
                10,
                "",
            ),
            ErrorCode::InvalidEntityConfig,
        ),
    ];

    for (request, code) in cases {
        let request: GetPageRequest = serde_json::from_value(request).unwrap();
        let err = registry.handle(&request).await.unwrap_err();
        assert_eq!(err.code, code, "{}", err.message);
    }
}

#[tokio::test]
async fn test_member_entity_sync() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/now/table/sys_user_group"))
        .and(query_param("sysparm_limit", "1"))
        .and(query_param("sysparm_offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [{"sys_id": "g1", "name": "Network"}]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/now/table/sys_user_group"))
        .and(query_param("sysparm_offset", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": []})))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/now/table/sys_user_grmember"))
        .and(query_param("sysparm_query", "group=g1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [{"user": "u1"}, {"user": "u2"}]
        })))
        .mount(&mock_server)
        .await;

    let entity = json!({
        "id": "group_members",
        "externalId": "sys_user_grmember",
        "attributes": [
            {"id": "id", "externalId": "id", "uniqueId": true},
            {"id": "user", "externalId": "user"},
            {"id": "group", "externalId": "group_id"}
        ]
    });

    let registry = registry(AdapterConfig::default());
    let mut request: GetPageRequest =
        serde_json::from_value(request_json(&mock_server.uri(), entity, 10, "")).unwrap();

    let first = registry.handle(&request).await.unwrap();
    let ids: Vec<Value> = first
        .objects
        .iter()
        .map(|o| serde_json::to_value(o).unwrap()["attributes"]["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!("u1-g1"), json!("u2-g1")]);

    request.cursor = first.next_cursor;
    let second = registry.handle(&request).await.unwrap();
    assert!(second.objects.is_empty());
    assert!(second.is_last());
}

// ============================================================================
// HTTP Boundary
// ============================================================================

async fn post(registry: AdapterRegistry, body: &Value) -> (StatusCode, Value) {
    let response = router(registry)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/get_page")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_http_get_page() {
    let mock_server = MockServer::start().await;
    mount_users(&mock_server).await;

    let (status, body) = post(
        registry(AdapterConfig::default()),
        &request_json(&mock_server.uri(), user_entity(), 2, ""),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["objects"].as_array().unwrap().len(), 2);
    assert_eq!(
        body["nextCursor"],
        json!(cursor::marshal_string(&CompositeCursor::with_cursor("2".to_string())).unwrap())
    );
}

#[tokio::test]
async fn test_http_client_error_is_400() {
    let (status, body) = post(
        registry(AdapterConfig::default()),
        &request_json("http://127.0.0.1:9", user_entity(), 10, "not-a-cursor"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("invalid_page_request_config"));
}

#[tokio::test]
async fn test_http_vendor_error_is_500() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let (status, body) = post(
        registry(AdapterConfig::default()),
        &request_json(&mock_server.uri(), user_entity(), 10, ""),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], json!("internal"));
}

#[tokio::test]
async fn test_http_health_and_datasources() {
    let app = router(registry(AdapterConfig::default()));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/datasources")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["datasources"][0]["type"], json!("servicenow"));
    assert!(body["datasources"][0]["entities"]
        .as_array()
        .unwrap()
        .contains(&json!("sys_user_grmember")));
}

#[test]
fn test_inline_definition_registers() {
    let definition = load_definition_from_str(
        r"
name: tickets
entities:
  ticket:
    path: /tickets
    unique_attribute: key
",
    )
    .unwrap();

    let registry = build_registry(Arc::new(AdapterConfig::default()), [definition]).unwrap();
    assert_eq!(registry.datasource_types(), vec!["tickets"]);
}
