//! Integration tests for nmrl-gateway endpoints
//!
//! GitHub and the Databank API are both played by one mockito server.

mod helpers;

use axum::http::StatusCode;
use chrono::Duration;
use helpers::*;
use mockito::{Matcher, ServerGuard};
use nmrl_gateway::{build_router, AppState};
use serde_json::json;
use tower::util::ServiceExt; // for `oneshot`

fn setup_app(server: &ServerGuard) -> axum::Router {
    build_router(AppState::new(test_config(server)).unwrap())
}

// =============================================================================
// Health / awake
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = mockito::Server::new_async().await;
    let response = setup_app(&server)
        .oneshot(empty_request("GET", "/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "nmrl-gateway");
    assert!(body["version"].is_string());
    assert!(body["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn test_awake_returns_html() {
    use http_body_util::BodyExt;

    let server = mockito::Server::new_async().await;
    let response = setup_app(&server)
        .oneshot(empty_request("GET", "/awake", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"<h1> Server is awake!<h1>");
}

// =============================================================================
// /verifyCode
// =============================================================================

#[tokio::test]
async fn test_verify_code_missing_code() {
    let server = mockito::Server::new_async().await;
    let response = setup_app(&server)
        .oneshot(json_request("POST", "/verifyCode", None, &json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response).await;
    assert_eq!(body, json!({"error": "Missing code parameter", "status": 400}));
}

#[tokio::test]
async fn test_verify_code_unparseable_body() {
    let server = mockito::Server::new_async().await;
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/verifyCode")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = setup_app(&server).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(extract_json(response).await["error"], "Error parsing JSON");
}

#[tokio::test]
async fn test_verify_code_success_reports_admin_status() {
    let mut server = mockito::Server::new_async().await;
    let _exchange = server
        .mock("POST", "/login/oauth/access_token")
        .match_body(Matcher::UrlEncoded("code".into(), "good-code".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"gho_alice","token_type":"bearer","scope":""}"#)
        .create_async()
        .await;
    let _user = mock_user(&mut server, "gho_alice", "alice").await;
    let target = TARGET_REPO.parse().unwrap();
    let _tokens = mock_installation_token(&mut server, &target, 8, "ghs_target", Duration::hours(1), 1).await;
    let _perm = mock_permission(&mut server, TARGET_REPO, "alice", "maintain").await;

    let response = setup_app(&server)
        .oneshot(json_request("POST", "/verifyCode", None, &json!({"code": "good-code"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response).await;
    assert_eq!(
        body,
        json!({
            "authenticated": true,
            "token": "gho_alice",
            "username": "alice",
            "admin_status": true
        })
    );
}

#[tokio::test]
async fn test_verify_code_rejected_code() {
    let mut server = mockito::Server::new_async().await;
    let _exchange = server
        .mock("POST", "/login/oauth/access_token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"bad_verification_code","error_description":"The code passed is incorrect or expired."}"#)
        .create_async()
        .await;

    let response = setup_app(&server)
        .oneshot(json_request("POST", "/verifyCode", None, &json!({"code": "stale"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(extract_json(response).await["status"], 401);
}

#[tokio::test]
async fn test_verify_code_github_down() {
    let mut server = mockito::Server::new_async().await;
    let _exchange = server
        .mock("POST", "/login/oauth/access_token")
        .with_status(503)
        .create_async()
        .await;

    let response = setup_app(&server)
        .oneshot(json_request("POST", "/verifyCode", None, &json!({"code": "any"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(extract_json(response).await["error"], "GitHub OAuth exchange failed");
}

#[tokio::test]
async fn test_verify_code_authorization_failure_is_500() {
    let mut server = mockito::Server::new_async().await;
    let _exchange = server
        .mock("POST", "/login/oauth/access_token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"gho_alice"}"#)
        .create_async()
        .await;
    let _user = mock_user(&mut server, "gho_alice", "alice").await;
    let _installation = server
        .mock("GET", "/repos/NMRLipids/BilayerData/installation")
        .with_status(500)
        .create_async()
        .await;

    let response = setup_app(&server)
        .oneshot(json_request("POST", "/verifyCode", None, &json!({"code": "good"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(extract_json(response).await["error"], "Authorization service error");
}

// =============================================================================
// /user-admin-check
// =============================================================================

#[tokio::test]
async fn test_admin_check_missing_token() {
    let server = mockito::Server::new_async().await;
    let response = setup_app(&server)
        .oneshot(empty_request("POST", "/user-admin-check", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        extract_json(response).await,
        json!({"error": "Missing token", "status": 401})
    );
}

#[tokio::test]
async fn test_admin_check_writer_is_authorized() {
    let mut server = mockito::Server::new_async().await;
    let _user = mock_user(&mut server, "gho_bob", "bob").await;
    let target = TARGET_REPO.parse().unwrap();
    let _tokens = mock_installation_token(&mut server, &target, 8, "ghs_target", Duration::hours(1), 1).await;
    let _perm = mock_permission(&mut server, TARGET_REPO, "bob", "write").await;

    let response = setup_app(&server)
        .oneshot(empty_request("POST", "/user-admin-check", Some("gho_bob")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response).await, json!({"authorized": true}));
}

#[tokio::test]
async fn test_admin_check_reader_is_forbidden() {
    let mut server = mockito::Server::new_async().await;
    let _user = mock_user(&mut server, "gho_carol", "carol").await;
    let target = TARGET_REPO.parse().unwrap();
    let _tokens = mock_installation_token(&mut server, &target, 8, "ghs_target", Duration::hours(1), 1).await;
    let _perm = mock_permission(&mut server, TARGET_REPO, "carol", "read").await;

    let response = setup_app(&server)
        .oneshot(empty_request("POST", "/user-admin-check", Some("gho_carol")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(extract_json(response).await["error"], "Insufficient privileges");
}

#[tokio::test]
async fn test_admin_check_revoked_token_is_forbidden() {
    let mut server = mockito::Server::new_async().await;
    let _user = server
        .mock("GET", "/user")
        .with_status(401)
        .with_body(r#"{"message":"Bad credentials"}"#)
        .create_async()
        .await;

    let response = setup_app(&server)
        .oneshot(empty_request("POST", "/user-admin-check", Some("gho_revoked")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// =============================================================================
// /upload
// =============================================================================

fn upload_body() -> serde_json::Value {
    json!({
        "userName": "Alice",
        "branch": "main",
        "DOI": "10.5281/zenodo.1",
        "SOFTWARE": "gromacs",
        "TRJ": [["traj.xtc"]],
        "TPR": [["topol.tpr"]],
        "SYSTEM": "POPC",
        "COMPOSITION": {"POPC": {"NAME": "POPC", "MAPPING": "mappingPOPCcharmm.yaml"}}
    })
}

async fn mock_token_check(server: &mut ServerGuard, status: usize) -> mockito::Mock {
    server
        .mock("POST", "/applications/cid/token")
        .match_header("authorization", Matcher::Regex("^Basic ".into()))
        .match_body(Matcher::PartialJson(json!({"access_token": "gho_alice"})))
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(if status == 200 { r#"{"token":"gho_alice"}"# } else { r#"{"message":"Not Found"}"# })
        .create_async()
        .await
}

async fn mock_valid_record(server: &mut ServerGuard) -> mockito::Mock {
    server
        .mock("POST", "/info-valid-check")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"valid":true}"#)
        .create_async()
        .await
}

/// Mocks for sync, branch lookup and branch creation on the work repository
async fn mock_work_repo_setup(server: &mut ServerGuard) -> Vec<mockito::Mock> {
    let work = WORK_REPO.parse().unwrap();
    let (a, b) = mock_installation_token(server, &work, 7, "ghs_work", Duration::hours(1), 1).await;
    let sync = server
        .mock("POST", "/repos/bot-fork/BilayerData/merge-upstream")
        .match_header("authorization", "Bearer ghs_work")
        .match_body(Matcher::Json(json!({"branch": "main"})))
        .with_status(200)
        .with_body(r#"{"message":"Successfully fetched and fast-forwarded","merge_type":"fast-forward"}"#)
        .create_async()
        .await;
    let head = server
        .mock("GET", "/repos/bot-fork/BilayerData/branches/main")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"name":"main","commit":{"sha":"abc123"}}"#)
        .create_async()
        .await;
    let create_ref = server
        .mock("POST", "/repos/bot-fork/BilayerData/git/refs")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({"sha": "abc123"})),
            Matcher::Regex(r#""ref":"refs/heads/bot/info_yaml_\d{14}""#.into()),
        ]))
        .with_status(201)
        .with_body(r#"{"ref":"refs/heads/bot/info_yaml_x","object":{"sha":"abc123"}}"#)
        .create_async()
        .await;
    vec![a, b, sync, head, create_ref]
}

#[tokio::test]
async fn test_upload_missing_authorization() {
    let server = mockito::Server::new_async().await;
    let response = setup_app(&server)
        .oneshot(json_request("POST", "/upload", None, &upload_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        extract_json(response).await["error"],
        "Missing or malformed Authorization header"
    );
}

#[tokio::test]
async fn test_upload_unknown_token() {
    let mut server = mockito::Server::new_async().await;
    let _check = mock_token_check(&mut server, 404).await;

    let response = setup_app(&server)
        .oneshot(json_request("POST", "/upload", Some("gho_alice"), &upload_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        extract_json(response).await,
        json!({"error": "Token not found or invalid", "status": 404})
    );
}

#[tokio::test]
async fn test_upload_requires_json_content_type() {
    let mut server = mockito::Server::new_async().await;
    let _check = mock_token_check(&mut server, 200).await;

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/upload")
        .header("authorization", "Bearer gho_alice")
        .body(axum::body::Body::from(upload_body().to_string()))
        .unwrap();
    let response = setup_app(&server).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        extract_json(response).await["error"],
        "Content-Type must be application/json"
    );
}

#[tokio::test]
async fn test_upload_missing_user_name() {
    let mut server = mockito::Server::new_async().await;
    let _check = mock_token_check(&mut server, 200).await;
    let _user = mock_user(&mut server, "gho_alice", "alice").await;

    let mut body = upload_body();
    body.as_object_mut().unwrap().remove("userName");
    let response = setup_app(&server)
        .oneshot(json_request("POST", "/upload", Some("gho_alice"), &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        extract_json(response).await["error"],
        "Missing userName or branch in JSON"
    );
}

#[tokio::test]
async fn test_upload_invalid_record_relays_reason() {
    let mut server = mockito::Server::new_async().await;
    let _check = mock_token_check(&mut server, 200).await;
    let _user = mock_user(&mut server, "gho_alice", "alice").await;
    let validation = server
        .mock("POST", "/info-valid-check")
        .match_body(Matcher::PartialJson(json!({"DOI": "10.5281/zenodo.1"})))
        .with_status(400)
        .with_body(r#"{"error":"Missing required keys: TRJ","status":400}"#)
        .create_async()
        .await;

    let response = setup_app(&server)
        .oneshot(json_request("POST", "/upload", Some("gho_alice"), &upload_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        extract_json(response).await,
        json!({"error": "Missing required keys: TRJ", "status": 400})
    );
    validation.assert_async().await;
}

#[tokio::test]
async fn test_upload_success_opens_pull_request() {
    let mut server = mockito::Server::new_async().await;
    let _check = mock_token_check(&mut server, 200).await;
    let _user = mock_user(&mut server, "gho_alice", "alice").await;
    let _valid = mock_valid_record(&mut server).await;
    let _work = mock_work_repo_setup(&mut server).await;

    let commit = server
        .mock(
            "PUT",
            Matcher::Regex(r"^/repos/bot-fork/BilayerData/contents/UserData/info\.yml$".into()),
        )
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({"message": "Add info.yml from Alice"})),
            Matcher::Regex(r#""branch":"bot/info_yaml_\d{14}""#.into()),
        ]))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"content":{"path":"UserData/info.yml","html_url":"https://github.com/bot-fork/BilayerData/blob/x/UserData/info.yml"},"commit":{"sha":"def456"}}"#,
        )
        .create_async()
        .await;

    let target = TARGET_REPO.parse().unwrap();
    let _target_tokens =
        mock_installation_token(&mut server, &target, 8, "ghs_target", Duration::hours(1), 1).await;
    let pull = server
        .mock("POST", "/repos/NMRLipids/BilayerData/pulls")
        .match_header("authorization", "Bearer ghs_target")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({
                "title": "Upload Portal: Simulation files from Alice",
                "base": "main",
                "maintainer_can_modify": false
            })),
            Matcher::Regex(r#""head":"bot-fork:bot/info_yaml_\d{14}""#.into()),
            Matcher::Regex("@alice".into()),
        ]))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"number":12,"html_url":"https://github.com/NMRLipids/BilayerData/pull/12"}"#)
        .create_async()
        .await;

    let response = setup_app(&server)
        .oneshot(json_request("POST", "/upload", Some("gho_alice"), &upload_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        extract_json(response).await,
        json!({
            "message": "Uploaded!",
            "pullUrl": "https://github.com/NMRLipids/BilayerData/pull/12"
        })
    );
    commit.assert_async().await;
    pull.assert_async().await;
}

#[tokio::test]
async fn test_upload_commit_failure_deletes_branch() {
    let mut server = mockito::Server::new_async().await;
    let _check = mock_token_check(&mut server, 200).await;
    let _user = mock_user(&mut server, "gho_alice", "alice").await;
    let _valid = mock_valid_record(&mut server).await;
    let _work = mock_work_repo_setup(&mut server).await;

    let _commit = server
        .mock("PUT", "/repos/bot-fork/BilayerData/contents/UserData/info.yml")
        .with_status(409)
        .with_body(r#"{"message":"Conflict"}"#)
        .create_async()
        .await;
    let delete = server
        .mock(
            "DELETE",
            Matcher::Regex(r"^/repos/bot-fork/BilayerData/git/refs/heads/bot/info_yaml_\d{14}$".into()),
        )
        .with_status(204)
        .create_async()
        .await;
    let pull = server
        .mock("POST", "/repos/NMRLipids/BilayerData/pulls")
        .expect(0)
        .create_async()
        .await;

    let response = setup_app(&server)
        .oneshot(json_request("POST", "/upload", Some("gho_alice"), &upload_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        extract_json(response).await["error"],
        "Failed to write to repository"
    );
    delete.assert_async().await;
    pull.assert_async().await;
}

#[tokio::test]
async fn test_upload_pull_request_failure_keeps_branch() {
    let mut server = mockito::Server::new_async().await;
    let _check = mock_token_check(&mut server, 200).await;
    let _user = mock_user(&mut server, "gho_alice", "alice").await;
    let _valid = mock_valid_record(&mut server).await;
    let _work = mock_work_repo_setup(&mut server).await;

    let _commit = server
        .mock("PUT", "/repos/bot-fork/BilayerData/contents/UserData/info.yml")
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"content":{"path":"UserData/info.yml","html_url":"https://x"},"commit":{"sha":"def456"}}"#)
        .create_async()
        .await;
    let target = TARGET_REPO.parse().unwrap();
    let _target_tokens =
        mock_installation_token(&mut server, &target, 8, "ghs_target", Duration::hours(1), 1).await;
    let _pull = server
        .mock("POST", "/repos/NMRLipids/BilayerData/pulls")
        .with_status(422)
        .with_body(r#"{"message":"Validation Failed"}"#)
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let response = setup_app(&server)
        .oneshot(json_request("POST", "/upload", Some("gho_alice"), &upload_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    delete.assert_async().await;
}

#[tokio::test]
async fn test_upload_databank_server_error_is_502() {
    let mut server = mockito::Server::new_async().await;
    let _check = mock_token_check(&mut server, 200).await;
    let _user = mock_user(&mut server, "gho_alice", "alice").await;
    let _validation = server
        .mock("POST", "/info-valid-check")
        .with_status(500)
        .with_body(r#"{"error":"Molecule catalog not available","status":500}"#)
        .create_async()
        .await;
    let sync = server
        .mock("POST", "/repos/bot-fork/BilayerData/merge-upstream")
        .expect(0)
        .create_async()
        .await;

    let response = setup_app(&server)
        .oneshot(json_request("POST", "/upload", Some("gho_alice"), &upload_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        extract_json(response).await,
        json!({"error": "Validation service unavailable", "status": 502})
    );
    sync.assert_async().await;
}

/// Mocks that must not be reached once branch setup has failed
async fn mock_untouched_after_setup(server: &mut ServerGuard) -> Vec<mockito::Mock> {
    let contents = server
        .mock("PUT", Matcher::Regex(r"^/repos/bot-fork/BilayerData/contents/".into()))
        .expect(0)
        .create_async()
        .await;
    let pull = server
        .mock("POST", "/repos/NMRLipids/BilayerData/pulls")
        .expect(0)
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    vec![contents, pull, delete]
}

#[tokio::test]
async fn test_upload_sync_failure_stops_before_branch() {
    let mut server = mockito::Server::new_async().await;
    let _check = mock_token_check(&mut server, 200).await;
    let _user = mock_user(&mut server, "gho_alice", "alice").await;
    let _valid = mock_valid_record(&mut server).await;
    let work = WORK_REPO.parse().unwrap();
    let _work_tokens =
        mock_installation_token(&mut server, &work, 7, "ghs_work", Duration::hours(1), 1).await;
    let sync = server
        .mock("POST", "/repos/bot-fork/BilayerData/merge-upstream")
        .with_status(409)
        .with_body(r#"{"message":"There are merge conflicts"}"#)
        .create_async()
        .await;
    let create_ref = server
        .mock("POST", "/repos/bot-fork/BilayerData/git/refs")
        .expect(0)
        .create_async()
        .await;
    let untouched = mock_untouched_after_setup(&mut server).await;

    let response = setup_app(&server)
        .oneshot(json_request("POST", "/upload", Some("gho_alice"), &upload_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        extract_json(response).await["error"],
        "Failed to write to repository"
    );
    sync.assert_async().await;
    create_ref.assert_async().await;
    for mock in untouched {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_upload_branch_creation_failure_stops_before_commit() {
    let mut server = mockito::Server::new_async().await;
    let _check = mock_token_check(&mut server, 200).await;
    let _user = mock_user(&mut server, "gho_alice", "alice").await;
    let _valid = mock_valid_record(&mut server).await;
    let work = WORK_REPO.parse().unwrap();
    let _work_tokens =
        mock_installation_token(&mut server, &work, 7, "ghs_work", Duration::hours(1), 1).await;
    let _sync = server
        .mock("POST", "/repos/bot-fork/BilayerData/merge-upstream")
        .with_status(200)
        .with_body(r#"{"message":"This branch is not behind the upstream","merge_type":"none"}"#)
        .create_async()
        .await;
    let _head = server
        .mock("GET", "/repos/bot-fork/BilayerData/branches/main")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"name":"main","commit":{"sha":"abc123"}}"#)
        .create_async()
        .await;
    let create_ref = server
        .mock("POST", "/repos/bot-fork/BilayerData/git/refs")
        .with_status(422)
        .with_body(r#"{"message":"Reference already exists"}"#)
        .create_async()
        .await;
    let untouched = mock_untouched_after_setup(&mut server).await;

    let response = setup_app(&server)
        .oneshot(json_request("POST", "/upload", Some("gho_alice"), &upload_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        extract_json(response).await["error"],
        "Failed to write to repository"
    );
    create_ref.assert_async().await;
    for mock in untouched {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_admin_check_rejected_installation_token_is_reminted_once() {
    let mut server = mockito::Server::new_async().await;
    let _user = mock_user(&mut server, "gho_bob", "bob").await;
    let target = TARGET_REPO.parse().unwrap();
    let (installation, access) =
        mock_installation_token(&mut server, &target, 8, "ghs_target", Duration::hours(1), 2).await;
    let permission = server
        .mock("GET", "/repos/NMRLipids/BilayerData/collaborators/bob/permission")
        .with_status(401)
        .with_body(r#"{"message":"Bad credentials"}"#)
        .expect(2)
        .create_async()
        .await;

    let response = setup_app(&server)
        .oneshot(empty_request("POST", "/user-admin-check", Some("gho_bob")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(extract_json(response).await["error"], "Authorization service error");
    installation.assert_async().await;
    access.assert_async().await;
    permission.assert_async().await;
}

#[tokio::test]
async fn test_workflow_outcome_names_branch_and_committed_file() {
    use nmrl_gateway::upload::{Submission, UploadWorkflow};

    let mut server = mockito::Server::new_async().await;
    let _work = mock_work_repo_setup(&mut server).await;
    let _commit = server
        .mock("PUT", "/repos/bot-fork/BilayerData/contents/UserData/info.yml")
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"content":{"path":"UserData/info.yml","html_url":"https://github.com/bot-fork/BilayerData/blob/b/UserData/info.yml"},"commit":{"sha":"def456"}}"#,
        )
        .create_async()
        .await;
    let target = TARGET_REPO.parse().unwrap();
    let _target_tokens =
        mock_installation_token(&mut server, &target, 8, "ghs_target", Duration::hours(1), 1).await;
    let _pull = server
        .mock("POST", "/repos/NMRLipids/BilayerData/pulls")
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"number":3,"html_url":"https://github.com/NMRLipids/BilayerData/pull/3"}"#)
        .create_async()
        .await;

    let state = AppState::new(test_config(&server)).unwrap();
    let mut record = upload_body().as_object().cloned().unwrap();
    record.remove("userName");
    record.remove("branch");
    let submission = Submission {
        user_name: "Alice".into(),
        github_login: "alice".into(),
        requested_branch: "main".into(),
        record,
    };
    let now = chrono::Utc::now();
    let outcome = UploadWorkflow::new(&state.github, &state.tokens, &state.upload_target)
        .run(&submission, now)
        .await
        .unwrap();

    assert_eq!(outcome.branch, nmrl_gateway::upload::bot_branch_name(now));
    assert_eq!(
        outcome.file_url,
        "https://github.com/bot-fork/BilayerData/blob/b/UserData/info.yml"
    );
    assert_eq!(outcome.pull_url, "https://github.com/NMRLipids/BilayerData/pull/3");
}
