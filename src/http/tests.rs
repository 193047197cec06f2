//! Tests for the HTTP client module

use super::*;
use crate::auth::AuthCredentials;
use crate::error::Error;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(base_url: &str) -> HttpClient {
    HttpClient::with_config(
        HttpClientConfig::builder()
            .base_url(base_url)
            .no_rate_limit()
            .build(),
    )
    .unwrap()
}

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert!(config.base_url.is_none());
    assert!(config.rate_limit.is_some());
    assert!(config.user_agent.starts_with("solidafy-adapters/"));
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .base_url("https://api.example.com")
        .timeout(Duration::from_secs(60))
        .rate_limit(RateLimiterConfig::new(5, 5))
        .header("Accept", "application/json")
        .build();

    assert_eq!(config.base_url.as_deref(), Some("https://api.example.com"));
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.rate_limit, Some(RateLimiterConfig::new(5, 5)));
    assert_eq!(
        config.default_headers.get("Accept").map(String::as_str),
        Some("application/json")
    );
}

#[test]
fn test_request_config_keeps_query_order() {
    let config = RequestConfig::new()
        .query("sysparm_limit", "10")
        .query("sysparm_offset", "20")
        .header("X-Request-Id", "abc123");

    assert_eq!(
        config.query,
        vec![
            ("sysparm_limit".to_string(), "10".to_string()),
            ("sysparm_offset".to_string(), "20".to_string()),
        ]
    );
    assert_eq!(config.headers.len(), 1);
}

#[test]
fn test_build_url() {
    let client = client("https://api.example.com/");
    assert_eq!(
        client.build_url("/api/now/table/sys_user"),
        "https://api.example.com/api/now/table/sys_user"
    );
    assert_eq!(
        client.build_url("https://other.example.com/next"),
        "https://other.example.com/next"
    );
}

#[tokio::test]
async fn test_get_json_with_query_and_auth() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("limit", "2"))
        .and(header("Authorization", "Bearer t0k"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Total-Count", "7")
                .set_body_json(serde_json::json!({"result": [{"id": 1}]})),
        )
        .mount(&mock_server)
        .await;

    let client = client(&mock_server.uri()).with_credentials(Some(AuthCredentials::Bearer {
        token: "t0k".to_string(),
    }));

    let response = client
        .get_json("/users", RequestConfig::new().query("limit", "2"))
        .await
        .unwrap();

    assert_eq!(response.body["result"][0]["id"], 1);
    assert_eq!(response.headers.get("X-Total-Count").unwrap(), "7");
}

#[tokio::test]
async fn test_client_error_is_http_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such table"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server.uri())
        .get_json("/missing", RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
    assert_eq!(err.status(), Some(404));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = client(&mock_server.uri())
        .get_json("/flaky", RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 503, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_rate_limited_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "5"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server.uri())
        .get_json("/busy", RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::RateLimited {
            retry_after_seconds: 5
        }
    ));
}

#[tokio::test]
async fn test_timeout_is_classified() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let client = client(&mock_server.uri()).with_timeout(Duration::from_millis(50));
    let err = client
        .get_json("/slow", RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout { timeout_ms: 50 }));
}

#[tokio::test]
async fn test_non_json_body_is_vendor_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server.uri())
        .get_json("/html", RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Vendor { .. }));
}
