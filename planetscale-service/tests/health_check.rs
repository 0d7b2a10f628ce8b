mod common;

use common::{service_token_header, TestApp};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::spawn(None, None, vec![]).await;
    let client = Client::new();

    let response = client
        .get(&format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));

    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "planetscale-service");

    app.stop().await.unwrap();
}

#[tokio::test]
async fn readiness_check_verifies_credentials() {
    let app = TestApp::spawn(
        None,
        None,
        vec![Mock::given(method("GET"))
            .and(path("/user"))
            .and(header("authorization", service_token_header().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "usr_1"})))
            .expect(1)],
    )
    .await;

    let response = Client::new()
        .get(&format!("{}/ready", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ready");

    app.stop().await.unwrap();
}

#[tokio::test]
async fn readiness_check_fails_when_credentials_are_rejected() {
    let app = TestApp::spawn(
        None,
        None,
        vec![Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)],
    )
    .await;

    let response = Client::new()
        .get(&format!("{}/ready", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "not_ready");
    assert_eq!(
        body["error"],
        "Invalid credentials. Please check your PlanetScale API credentials."
    );
    assert_eq!(
        body["details"],
        "Verify your service token ID and secret, or OAuth access token."
    );

    app.stop().await.unwrap();
}

#[tokio::test]
async fn metrics_endpoint_exposes_request_counters() {
    let app = TestApp::spawn(None, None, vec![]).await;
    let client = Client::new();

    client
        .get(&format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    let response = client
        .get(&format!("{}/metrics", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let body = response.text().await.unwrap();
    assert!(body.contains("http_requests_total"));
    assert!(body.contains(r#"path="/health""#));

    app.stop().await.unwrap();
}

#[tokio::test]
async fn request_id_is_echoed() {
    let app = TestApp::spawn(None, None, vec![]).await;

    let response = Client::new()
        .get(&format!("{}/health", app.address))
        .header("x-request-id", "req-42")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(
        response.headers().get("x-request-id").unwrap().to_str().unwrap(),
        "req-42"
    );

    app.stop().await.unwrap();
}
