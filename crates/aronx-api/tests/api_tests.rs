//! Router tests: in-memory store, wiremock standing in for the panel

use std::sync::Arc;

use aronx_api::{AppStateInner, router};
use aronx_db::Database;
use aronx_link::LinkConfig;
use aronx_panel::{HttpPanel, PanelConfig};
use aronx_provision::Provisioner;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, path_regex},
};

const ADMIN_TOKEN: &str = "admin-secret";

struct TestApp {
    app: Router,
    db: Arc<Database>,
}

fn link_config() -> LinkConfig {
    LinkConfig {
        server_host: Some("vpn.example.com".into()),
        server_port: Some("443".into()),
        public_key: Some("pbk".into()),
        short_id: Some("ab12".into()),
        server_name: Some("www.example.com".into()),
        ..Default::default()
    }
}

fn test_app(panel: &MockServer, admin_token: Option<&str>) -> TestApp {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let panel = HttpPanel::new(PanelConfig::new(&panel.uri(), "admin", "s3cret", 1));
    let provisioner = Provisioner::new(db.clone(), panel, link_config()).unwrap();

    let state = Arc::new(AppStateInner {
        provisioner,
        admin_token: admin_token.map(str::to_string),
    });

    TestApp {
        app: router(state),
        db,
    }
}

async fn healthy_panel() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/panel/api/inbounds/addClient"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/panel/api/inbounds/1/delClient/.+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;

    server
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header("X-Admin-Token", token);
    }

    let response = app
        .clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_invite_to_reset_flow() {
    let panel = healthy_panel().await;
    let t = test_app(&panel, Some(ADMIN_TOKEN));

    let (status, body) = send(&t.app, "POST", "/admin/create-invite", Some(ADMIN_TOKEN)).await;
    assert_eq!(status, StatusCode::CREATED);
    let code = body["invite_code"].as_str().unwrap().to_string();

    let (status, body) = send(
        &t.app,
        "POST",
        &format!("/invite/use?invite_code={code}&telegram_id=42&username=neo"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["existing"], false);
    let credential = body["credential_id"].as_str().unwrap().to_string();
    assert!(body["vless_link"].as_str().unwrap().contains(&credential));

    let (status, body) = send(&t.app, "GET", "/me?telegram_id=42", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["credential_id"], credential.as_str());

    let (status, body) = send(&t.app, "POST", "/me/reset?telegram_id=42", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["old_credential_id"], credential.as_str());
    assert_eq!(body["old_client_removed"], true);
    let fresh = body["new_credential_id"].as_str().unwrap().to_string();
    assert_ne!(fresh, credential);

    let (_, body) = send(&t.app, "GET", "/me?telegram_id=42", None).await;
    assert_eq!(body["credential_id"], fresh.as_str());

    let account = t.db.find_by_external_id("42").unwrap().unwrap();
    assert_eq!(account.display_name.as_deref(), Some("neo"));
}

#[tokio::test]
async fn test_used_invite_is_conflict() {
    let panel = healthy_panel().await;
    let t = test_app(&panel, None);
    let code = t.db.create_invite().unwrap().code;

    let uri = |who: u32| format!("/invite/use?invite_code={code}&telegram_id={who}");
    let (status, _) = send(&t.app, "POST", &uri(1), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&t.app, "POST", &uri(2), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "invite_used");
}

#[tokio::test]
async fn test_unknown_invite_and_account_are_not_found() {
    let panel = healthy_panel().await;
    let t = test_app(&panel, None);

    let (status, body) = send(
        &t.app,
        "POST",
        "/invite/use?invite_code=NOPE123456&telegram_id=1",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "invite_not_found");

    let (status, body) = send(&t.app, "GET", "/me?telegram_id=1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "account_not_found");
}

#[tokio::test]
async fn test_panel_failure_is_bad_gateway_and_keeps_invite() {
    let panel = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&panel)
        .await;
    Mock::given(method("POST"))
        .and(path("/panel/api/inbounds/addClient"))
        .respond_with(ResponseTemplate::new(500).set_body_string("inbound not found"))
        .mount(&panel)
        .await;

    let t = test_app(&panel, None);
    let code = t.db.create_invite().unwrap().code;

    let (status, body) = send(
        &t.app,
        "POST",
        &format!("/invite/use?invite_code={code}&telegram_id=7"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "panel_create_failed");

    assert!(!t.db.get_invite(&code).unwrap().unwrap().is_used);
    assert!(t.db.find_by_external_id("7").unwrap().is_none());
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let panel = healthy_panel().await;

    let t = test_app(&panel, Some(ADMIN_TOKEN));
    let (status, _) = send(&t.app, "POST", "/admin/create-invite", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&t.app, "POST", "/admin/create-invite", Some("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let disabled = test_app(&panel, None);
    let (status, _) = send(&disabled.app, "POST", "/admin/create-invite", Some(ADMIN_TOKEN)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_health_endpoints() {
    let panel = healthy_panel().await;
    let t = test_app(&panel, None);

    let (status, body) = send(&t.app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&t.app, "GET", "/health/db", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "ok");
}
