mod common;

use anyhow::Result;
use base64::Engine;
use serde_json::{json, Value};

use common::TestApp;
use roster_api::api::handle_event;

/// REST API (payload 1.0) proxy event as delivered behind a Cognito authorizer
fn rest_event(method: &str, path: &str, body: Option<&str>, claims: Option<Value>) -> Value {
    let mut context = json!({
        "accountId": "123456789012",
        "resourceId": "abc123",
        "stage": "prod",
        "requestId": "c6af9ac6-7b61-11e6-9a41-93e8deadbeef",
        "identity": {"sourceIp": "203.0.113.10", "userAgent": "roster-tests"},
        "resourcePath": "/{proxy+}",
        "httpMethod": method,
        "apiId": "1234567890",
        "protocol": "HTTP/1.1",
        "requestTimeEpoch": 1700000000000i64
    });
    if let Some(claims) = claims {
        context["authorizer"] = json!({ "claims": claims });
    }

    json!({
        "resource": "/{proxy+}",
        "path": path,
        "httpMethod": method,
        "headers": {"Content-Type": "application/json", "Host": "api.example.com"},
        "multiValueHeaders": {"Content-Type": ["application/json"], "Host": ["api.example.com"]},
        "queryStringParameters": null,
        "multiValueQueryStringParameters": null,
        "pathParameters": {"proxy": path.trim_start_matches('/')},
        "stageVariables": null,
        "requestContext": context,
        "body": body,
        "isBase64Encoded": false
    })
}

/// HTTP API (payload 2.0) event as delivered behind a JWT authorizer
fn http_api_event(method: &str, path: &str, body: &str, base64: bool, claims: Value) -> Value {
    json!({
        "version": "2.0",
        "routeKey": "$default",
        "rawPath": path,
        "rawQueryString": "",
        "headers": {"content-type": "application/json", "host": "api.example.com"},
        "requestContext": {
            "accountId": "123456789012",
            "apiId": "api-id",
            "authorizer": {"jwt": {"claims": claims, "scopes": null}},
            "domainName": "api.example.com",
            "domainPrefix": "api",
            "http": {
                "method": method,
                "path": path,
                "protocol": "HTTP/1.1",
                "sourceIp": "203.0.113.10",
                "userAgent": "roster-tests"
            },
            "requestId": "id",
            "routeKey": "$default",
            "stage": "$default",
            "time": "12/Mar/2024:19:03:58 +0000",
            "timeEpoch": 1710270238000i64
        },
        "body": body,
        "isBase64Encoded": base64
    })
}

fn admin_claims() -> Value {
    json!({"sub": "admin-1", "cognito:groups": "Administrator"})
}

#[tokio::test]
async fn create_through_proxy_event() -> Result<()> {
    let app = TestApp::spawn();
    let event = rest_event(
        "POST",
        "/members/member",
        Some("{\"name\":\"Aldric\",\"level\":\"3\"}"),
        Some(admin_claims()),
    );

    let response = handle_event(&app.dispatcher, event).await;
    assert_eq!(response.status_code, 201, "body: {}", response.body);
    assert_eq!(
        response.headers.get("Access-Control-Allow-Origin").map(String::as_str),
        Some(app.config.security.cors_origin.as_str())
    );

    let body: Value = serde_json::from_str(&response.body)?;
    assert_eq!(body["name"], "Aldric");
    assert_eq!(body["level"], 3);
    assert_eq!(app.store.len(&app.config.tables.members), 1);
    Ok(())
}

#[tokio::test]
async fn base64_body_is_decoded() -> Result<()> {
    let app = TestApp::spawn();
    app.seed_member(json!({"id": "m1", "name": "Aldric", "title": "Sir"})).await?;

    let body = base64::engine::general_purpose::STANDARD.encode(br#"{"title":"Lord"}"#);
    let event = http_api_event(
        "PUT",
        "/members/member/m1",
        &body,
        true,
        json!({"sub": "admin-1", "cognito:groups": "[Administrator]"}),
    );

    let response = handle_event(&app.dispatcher, event).await;
    assert_eq!(response.status_code, 200, "body: {}", response.body);
    let body: Value = serde_json::from_str(&response.body)?;
    assert_eq!(body["title"], "Lord");
    assert_eq!(body["name"], "Aldric");
    Ok(())
}

#[tokio::test]
async fn missing_claims_are_unauthorized() -> Result<()> {
    let app = TestApp::spawn();
    app.seed_member(json!({"id": "m1", "name": "Aldric"})).await?;

    let response = handle_event(&app.dispatcher, rest_event("DELETE", "/members/member/m1", None, None)).await;
    assert_eq!(response.status_code, 401);
    assert_eq!(app.store.len(&app.config.tables.members), 1);
    Ok(())
}

#[tokio::test]
async fn unparseable_event_is_a_bad_request() -> Result<()> {
    let app = TestApp::spawn();
    let response = handle_event(&app.dispatcher, json!("not an event")).await;
    assert_eq!(response.status_code, 400);
    assert!(response.headers.contains_key("Access-Control-Allow-Origin"));

    let body: Value = serde_json::from_str(&response.body)?;
    assert_eq!(body["code"], "BAD_REQUEST");
    Ok(())
}

#[tokio::test]
async fn preflight_event_short_circuits() -> Result<()> {
    let app = TestApp::spawn();
    let response = handle_event(&app.dispatcher, rest_event("OPTIONS", "/members/member/m1", None, None)).await;
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "{}");
    assert!(response.headers.contains_key("Access-Control-Allow-Methods"));
    Ok(())
}
