//! Shared fixtures for gateway integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response},
};
use chrono::{Duration, Utc};
use mockito::{Mock, ServerGuard};
use nmrl_common::config::Secret;
use nmrl_gateway::config::{GatewayConfig, OAuthApp};
use nmrl_gateway::github::RepoName;
use serde_json::Value;
use std::time::Duration as StdDuration;

pub const APP_KEY_PEM: &str = include_str!("../fixtures/test_app_key.pem");
pub const APP_PUBLIC_KEY_PEM: &str = include_str!("../fixtures/test_app_key.pub.pem");

pub const WORK_REPO: &str = "bot-fork/BilayerData";
pub const TARGET_REPO: &str = "NMRLipids/BilayerData";

/// Gateway config with every outbound URL pointed at `server`
pub fn test_config(server: &ServerGuard) -> GatewayConfig {
    GatewayConfig {
        bind: "127.0.0.1:0".parse().unwrap(),
        oauth: OAuthApp {
            client_id: "cid".to_string(),
            client_secret: Secret::new("csecret"),
        },
        app_id: 1234,
        app_private_key: Secret::new(APP_KEY_PEM),
        work_repo: WORK_REPO.parse().unwrap(),
        target_repo: TARGET_REPO.parse().unwrap(),
        base_branch: "main".to_string(),
        databank_url: server.url(),
        github_api_url: server.url(),
        github_web_url: server.url(),
        timeout: StdDuration::from_secs(5),
    }
}

/// Mock the two App calls that mint an installation token for `repo`,
/// each expected `hits` times
pub async fn mock_installation_token(
    server: &mut ServerGuard,
    repo: &RepoName,
    installation_id: u64,
    token: &str,
    lifetime: Duration,
    hits: usize,
) -> (Mock, Mock) {
    let expires_at = (Utc::now() + lifetime).to_rfc3339();
    let installation = server
        .mock("GET", format!("/repos/{}/installation", repo).as_str())
        .match_header("authorization", mockito::Matcher::Regex("^Bearer ey".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"id":{}}}"#, installation_id))
        .expect(hits)
        .create_async()
        .await;
    let access = server
        .mock(
            "POST",
            format!("/app/installations/{}/access_tokens", installation_id).as_str(),
        )
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"token":"{}","expires_at":"{}"}}"#, token, expires_at))
        .expect(hits)
        .create_async()
        .await;
    (installation, access)
}

/// Mock GET /user for `token`
pub async fn mock_user(server: &mut ServerGuard, token: &str, login: &str) -> Mock {
    server
        .mock("GET", "/user")
        .match_header("authorization", format!("Bearer {}", token).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"login":"{}","id":1}}"#, login))
        .create_async()
        .await
}

pub async fn mock_permission(
    server: &mut ServerGuard,
    repo: &str,
    login: &str,
    permission: &str,
) -> Mock {
    server
        .mock(
            "GET",
            format!("/repos/{}/collaborators/{}/permission", repo, login).as_str(),
        )
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"permission":"{}","user":{{"login":"{}"}}}}"#, permission, login))
        .create_async()
        .await
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn extract_json(response: Response<Body>) -> Value {
    use http_body_util::BodyExt;
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}
