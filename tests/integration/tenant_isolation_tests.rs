//! Cross-tenant access tests

use serde_json::{json, Value};

use crate::common::*;

#[tokio::test]
async fn test_other_tenant_key_is_unauthorized() {
    let app = TestApp::new().await;
    let (event, _) = seed_org_a_events(&app.state).await;

    let response = app.get_with_key("/org/2/events", ORG_B_KEY).await;
    response.assert_unauthorized();
    let body: Value = response.json();
    assert_eq!(body["message"], "not authorized for requested org_id");

    app.get_with_key(&format!("/org/2/events/{}", event.id), ORG_B_KEY)
        .await
        .assert_unauthorized();
    app.put_json_with_key(
        &format!("/org/2/events/{}", event.id),
        ORG_B_KEY,
        json!({"name": "hijacked"}),
    )
    .await
    .assert_unauthorized();
    app.delete_with_key(&format!("/org/2/events/{}", event.id), ORG_B_KEY)
        .await
        .assert_unauthorized();
}

#[tokio::test]
async fn test_event_id_from_another_tenant_is_not_found() {
    let app = TestApp::new().await;
    let (event, _) = seed_org_a_events(&app.state).await;

    // authorized for org 3, but the event lives in org 2
    app.get_with_key(&format!("/org/3/events/{}", event.id), ORG_B_KEY)
        .await
        .assert_not_found();
    app.delete_with_key(&format!("/org/3/events/{}", event.id), ORG_B_KEY)
        .await
        .assert_not_found();

    app.get_with_key(&format!("/org/2/events/{}", event.id), ORG_A_KEY)
        .await
        .assert_ok();
}

#[tokio::test]
async fn test_global_key_reads_every_tenant() {
    let app = TestApp::new().await;
    seed_org_a_events(&app.state).await;

    let body: Value = app.get_with_key("/org/2/events", GLOBAL_KEY).await.json();
    assert_eq!(body["total"], 2);
    assert!(body["data"]
        .as_array()
        .unwrap()
        .iter()
        .all(|e| e["organization_id"] == 2));

    let body: Value = app.get_with_key("/org/3/events", GLOBAL_KEY).await.json();
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_listing_never_leaks_other_tenants() {
    let app = TestApp::new().await;
    seed_org_a_events(&app.state).await;
    create_event(
        &app.state,
        3,
        event_request("critical", "Outage", Some("billing"), Some("Connection refused")),
    )
    .await;

    let body: Value = app
        .get_with_key("/org/3/events?search=conn", ORG_B_KEY)
        .await
        .json();
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["name"], "Outage");

    let facets = body["filter_facets"].as_array().unwrap();
    let type_facet = facets
        .iter()
        .find(|f| f["property_name"] == "type")
        .unwrap();
    assert_eq!(type_facet["values"], json!(["critical"]));
    let application_facet = facets
        .iter()
        .find(|f| f["property_name"] == "application")
        .unwrap();
    assert_eq!(application_facet["values"], json!(["billing"]));
}

#[tokio::test]
async fn test_event_body_cannot_move_tenants() {
    let app = TestApp::new().await;

    let response = app
        .post_json_with_key(
            "/org/2/events",
            ORG_A_KEY,
            json!({"type": "info", "name": "n", "organization_id": 3}),
        )
        .await;
    response.assert_created();
    let created: Value = response.json();
    assert_eq!(created["organization_id"], 2);
}

#[tokio::test]
async fn test_session_cookie_is_not_an_api_credential() {
    let app = TestApp::new().await;

    let token = app.session_for("root", PASSWORD).await;
    app.get_with_session("/org/2/events", &token)
        .await
        .assert_unauthorized();
}
