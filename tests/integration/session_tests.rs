//! Login, logout and session-authenticated web page tests

use axum::http::StatusCode;
use serde_json::{json, Value};

use laser_beam::{db::SessionRepository, services};

use crate::common::*;

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let app = TestApp::new().await;

    let response = app.login("alice", PASSWORD).await;
    response
        .assert_status(StatusCode::SEE_OTHER)
        .assert_redirect_to("/");

    let cookie = response
        .headers
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session_key="))
        .unwrap()
        .to_string();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));

    let token = response.session_cookie("session_key").unwrap();
    assert!(SessionRepository::new(&app.state.db)
        .get_by_key(&token)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::new().await;

    let wrong_password = app.login("alice", "wrong-password").await;
    let unknown_user = app.login("nobody", PASSWORD).await;

    for response in [&wrong_password, &unknown_user] {
        response.assert_unauthorized();
        assert!(response.text().contains("Invalid username or password"));
        assert!(response.session_cookie("session_key").is_none());
    }
}

#[tokio::test]
async fn test_htmx_login_redirects_with_header() {
    let app = TestApp::new().await;

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/login")
        .header("content-type", "application/x-www-form-urlencoded")
        .header("HX-Request", "true")
        .body(axum::body::Body::from(format!(
            "username=alice&password={}",
            PASSWORD
        )))
        .unwrap();
    let response = app.request(request).await;

    response.assert_ok();
    assert_eq!(response.header("hx-redirect"), Some("/"));
    assert!(response.session_cookie("session_key").is_some());
}

#[tokio::test]
async fn test_pages_redirect_to_login_without_session() {
    let app = TestApp::new().await;

    for uri in ["/", "/events", "/account", "/account/password"] {
        app.get(uri).await.assert_redirect_to("/login");
    }
    app.get_with_session("/events", "forged-token")
        .await
        .assert_redirect_to("/login");
}

#[tokio::test]
async fn test_htmx_request_without_session_gets_redirect_header() {
    let app = TestApp::new().await;

    let response = app.hx_get_with_session("/events", "forged-token").await;
    response.assert_ok();
    assert_eq!(response.header("hx-redirect"), Some("/login"));
}

#[tokio::test]
async fn test_events_page_shows_own_tenant_only() {
    let app = TestApp::new().await;
    seed_org_a_events(&app.state).await;
    create_event(&app.state, 3, event_request("error", "Secret B", None, None)).await;

    let token = app.session_for("alice", PASSWORD).await;
    let response = app.get_with_session("/events", &token).await;
    response.assert_ok();

    let html = response.text();
    assert!(html.contains("<!DOCTYPE html>"));
    assert!(html.contains("Error 1001"));
    assert!(html.contains("Info 1002"));
    assert!(!html.contains("Secret B"));
}

#[tokio::test]
async fn test_events_fragment_for_htmx() {
    let app = TestApp::new().await;
    seed_org_a_events(&app.state).await;

    let token = app.session_for("alice", PASSWORD).await;
    let response = app
        .hx_get_with_session("/events?filter=type:error", &token)
        .await;
    response.assert_ok();

    let html = response.text();
    assert!(!html.contains("<!DOCTYPE html>"));
    assert!(html.contains("Error 1001"));
    assert!(!html.contains("Info 1002"));
}

#[tokio::test]
async fn test_unknown_columns_fall_back_to_default_listing() {
    let app = TestApp::new().await;
    seed_org_a_events(&app.state).await;
    let token = app.session_for("alice", PASSWORD).await;

    for (uri, notice) in [
        ("/events?order_by=bogus", "cannot order by"),
        ("/events?filter=secret_key:x", "cannot filter on"),
    ] {
        let response = app.get_with_session(uri, &token).await;
        response.assert_ok();
        assert_eq!(
            response.header("content-type").map(|v| v.starts_with("text/html")),
            Some(true),
            "{} should render a page",
            uri
        );

        let html = response.text();
        assert!(html.contains(notice), "{} should show a notice", uri);
        assert!(html.contains("Error 1001"));
        assert!(html.contains("Info 1002"));
    }
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let app = TestApp::new().await;
    let token = app.session_for("alice", PASSWORD).await;

    app.get_with_session("/events", &token).await.assert_ok();

    app.get_with_session("/logout", &token)
        .await
        .assert_redirect_to("/login");

    app.get_with_session("/events", &token)
        .await
        .assert_redirect_to("/login");
    assert!(SessionRepository::new(&app.state.db)
        .get_by_key(&token)
        .await
        .is_err());
}

#[tokio::test]
async fn test_account_form_rerenders_with_errors() {
    let app = TestApp::new().await;
    let token = app.session_for("alice", PASSWORD).await;

    let response = app
        .post_form_with_session(
            "/account",
            &token,
            "first_name=Al&last_name=Smith&email=bad&phone=",
        )
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let html = response.text();
    assert!(html.contains("First name must have at least 3 characters"));
    assert!(html.contains("Email address is not valid"));
    assert!(html.contains(r#"value="Al""#));
}

#[tokio::test]
async fn test_account_form_saves_and_shows_toast() {
    let app = TestApp::new().await;
    let token = app.session_for("alice", PASSWORD).await;

    let response = app
        .post_form_with_session(
            "/account",
            &token,
            "first_name=Alicia&last_name=Smith&email=alicia%40example.com&phone=",
        )
        .await;
    response.assert_ok();

    let html = response.text();
    assert!(html.contains("Successfully updated user account!"));
    assert!(html.contains("Alicia Smith"));
}

#[tokio::test]
async fn test_account_json_update_validation() {
    let app = TestApp::new().await;
    let token = app.session_for("alice", PASSWORD).await;

    let response = app
        .put_json_with_session(
            "/account",
            &token,
            json!({"first_name": "Alice", "last_name": "Li", "email": "", "phone": ""}),
        )
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(
        body["details"]["last_name"],
        "Last name must have at least 3 characters"
    );

    let response = app
        .put_json_with_session(
            "/account",
            &token,
            json!({"first_name": "Alice", "last_name": "Lindqvist", "email": "", "phone": ""}),
        )
        .await;
    response.assert_ok();
    let body: Value = response.json();
    assert_eq!(body["last_name"], "Lindqvist");
}

#[tokio::test]
async fn test_password_change() {
    let app = TestApp::new().await;
    let token = app.session_for("alice", PASSWORD).await;

    let response = app
        .put_json_with_session(
            "/account/password",
            &token,
            json!({"password": "new-secret", "confirm_password": "other"}),
        )
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["details"]["confirm_password"], "Both passwords must match");

    let response = app
        .put_json_with_session(
            "/account/password",
            &token,
            json!({"password": "new-secret", "confirm_password": "new-secret"}),
        )
        .await;
    response.assert_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Successfully updated password!");

    app.login("alice", PASSWORD).await.assert_unauthorized();
    app.login("alice", "new-secret")
        .await
        .assert_status(StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_expired_session_is_rejected() {
    let mut config = test_config();
    config.auth.session_ttl_minutes = 1;
    let app = TestApp::with_config(config).await;
    let token = app.session_for("alice", PASSWORD).await;

    let session = SessionRepository::new(&app.state.db)
        .get_by_key(&token)
        .await
        .unwrap();
    SessionRepository::new(&app.state.db)
        .touch(session.id, chrono::Utc::now() - chrono::Duration::minutes(5))
        .await
        .unwrap();

    app.get_with_session("/events", &token)
        .await
        .assert_redirect_to("/login");
}

#[tokio::test]
async fn test_auto_login_user() {
    let mut config = test_config();
    config.auth.auto_login_user = Some("alice".to_string());
    let app = TestApp::with_config(config).await;

    let response = app.get("/account").await;
    response.assert_ok();
    assert!(response.text().contains("alice@example.com"));
}

#[tokio::test]
async fn test_bootstrap_is_idempotent() {
    let app = TestApp::new().await;

    // the seeded global organization is kept as is
    let outcome = services::bootstrap(&app.state.db, &app.state.config, Some(("admin", "s3cret")))
        .await
        .unwrap();
    assert!(!outcome.organization_created);
    assert_eq!(outcome.organization.secret_key, GLOBAL_KEY);
    let admin = outcome.admin.unwrap();
    assert_eq!(admin.organization_id, 1);

    let outcome = services::bootstrap(&app.state.db, &app.state.config, Some(("admin", "other")))
        .await
        .unwrap();
    assert!(outcome.admin.is_none());

    app.login("admin", "s3cret")
        .await
        .assert_status(StatusCode::SEE_OTHER);
}
