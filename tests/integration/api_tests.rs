//! JSON API integration tests

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::*;

mod health {
    use super::*;

    #[tokio::test]
    async fn test_health_needs_no_key() {
        let app = TestApp::new().await;

        let response = app.get("/health").await;
        response.assert_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_detailed_health_reports_database() {
        let app = TestApp::new().await;

        let response = app.get("/health/detailed").await;
        response.assert_ok();
        let body: Value = response.json();
        assert_eq!(body["database"]["status"], "healthy");
    }
}

mod authentication {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_is_unauthorized() {
        let app = TestApp::new().await;

        let response = app.get("/org/2/events").await;
        response.assert_unauthorized();
        let body: Value = response.json();
        assert_eq!(body["message"], "no api key supplied");
    }

    #[tokio::test]
    async fn test_unknown_key_is_unauthorized() {
        let app = TestApp::new().await;

        app.get_with_key("/org/2/events", "nope")
            .await
            .assert_unauthorized();
    }

    #[tokio::test]
    async fn test_key_query_parameter() {
        let app = TestApp::new().await;

        app.get(&format!("/org/2/events?key={}", ORG_A_KEY))
            .await
            .assert_ok();
    }
}

mod events {
    use super::*;

    #[tokio::test]
    async fn test_first_page_of_two() {
        let app = TestApp::new().await;
        let (first, _) = seed_org_a_events(&app.state).await;

        let response = app
            .get_with_key("/org/2/events?offset=0&limit=1&order_by=id:asc", ORG_A_KEY)
            .await;
        response.assert_ok();

        let body: Value = response.json();
        assert_eq!(body["start"], 1);
        assert_eq!(body["end"], 1);
        assert_eq!(body["total"], 2);
        assert_eq!(body["next_page"]["offset"], 1);
        assert!(body["previous_page"].is_null());
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["id"], first.id);
        assert_eq!(body["data"][0]["type"], "error");
    }

    #[tokio::test]
    async fn test_filter_by_type() {
        let app = TestApp::new().await;
        seed_org_a_events(&app.state).await;

        let response = app
            .get_with_key("/org/2/events?filter=type:error", ORG_A_KEY)
            .await;
        response.assert_ok();

        let body: Value = response.json();
        assert_eq!(body["total"], 1);
        assert_eq!(body["data"][0]["name"], "Error 1001");

        let facets = body["filter_facets"].as_array().unwrap();
        let type_facet = facets
            .iter()
            .find(|f| f["property_name"] == "type")
            .unwrap();
        assert_eq!(type_facet["selected_value"], "error");
        assert_eq!(type_facet["values"], json!(["error", "info"]));
    }

    #[tokio::test]
    async fn test_search_matches_word_prefixes() {
        let app = TestApp::new().await;
        seed_org_a_events(&app.state).await;

        let response = app
            .get_with_key("/org/2/events?search=conn%20fail", ORG_A_KEY)
            .await;
        response.assert_ok();

        let body: Value = response.json();
        assert_eq!(body["total"], 1);
        assert_eq!(body["data"][0]["message"], "Connection failed to db");
    }

    #[tokio::test]
    async fn test_search_ignores_punctuation_tokens() {
        let app = TestApp::new().await;
        seed_org_a_events(&app.state).await;

        let body: Value = app
            .get_with_key("/org/2/events?search=conn%20-", ORG_A_KEY)
            .await
            .json();
        assert_eq!(body["total"], 1);
        assert_eq!(body["data"][0]["name"], "Error 1001");

        let body: Value = app
            .get_with_key("/org/2/events?search=%2D%2D", ORG_A_KEY)
            .await
            .json();
        assert_eq!(body["total"], 2);
    }

    #[tokio::test]
    async fn test_empty_page_past_the_end() {
        let app = TestApp::new().await;
        seed_org_a_events(&app.state).await;

        let response = app
            .get_with_key("/org/2/events?offset=10&limit=10", ORG_A_KEY)
            .await;
        response.assert_ok();

        let body: Value = response.json();
        assert_eq!(body["total"], 2);
        assert!(body["data"].as_array().unwrap().is_empty());
        assert!(body["next_page"].is_null());
    }

    #[tokio::test]
    async fn test_offset_near_integer_limit() {
        let app = TestApp::new().await;
        seed_org_a_events(&app.state).await;

        let response = app
            .get_with_key(
                &format!("/org/2/events?offset={}&limit=10", i64::MAX - 5),
                ORG_A_KEY,
            )
            .await;
        response.assert_ok();

        let body: Value = response.json();
        assert_eq!(body["total"], 2);
        assert!(body["data"].as_array().unwrap().is_empty());
        assert!(body["next_page"].is_null());
        assert_eq!(body["end"], 2);
    }

    #[tokio::test]
    async fn test_invalid_pagination_is_bad_request() {
        let app = TestApp::new().await;

        for query in [
            "limit=abc",
            "limit=101",
            "offset=-1",
            "order_by=password:asc",
            "order_by=id:sideways",
            "filter=secret_key:x",
            "filter=type",
        ] {
            let response = app
                .get_with_key(&format!("/org/2/events?{}", query), ORG_A_KEY)
                .await;
            assert_eq!(
                response.status,
                StatusCode::BAD_REQUEST,
                "query {} should be rejected",
                query
            );
        }
    }

    #[tokio::test]
    async fn test_create_get_update_delete() {
        let app = TestApp::new().await;

        let response = app
            .post_json_with_key(
                "/org/2/events",
                ORG_A_KEY,
                json!({"type": "warning", "name": "Disk 80%", "application": "storage"}),
            )
            .await;
        response.assert_created();
        let created: Value = response.json();
        assert_eq!(created["organization_id"], 2);
        let id = created["id"].as_i64().unwrap();

        let response = app
            .put_json_with_key(
                &format!("/org/2/events/{}", id),
                ORG_A_KEY,
                json!({"name": "Disk 90%", "message": "Disk usage above threshold"}),
            )
            .await;
        response.assert_ok();
        let updated: Value = response.json();
        assert_eq!(updated["name"], "Disk 90%");
        assert_eq!(updated["message"], "Disk usage above threshold");
        for unchanged in ["id", "organization_id", "time", "type", "application"] {
            assert_eq!(updated[unchanged], created[unchanged], "{} changed", unchanged);
        }

        let fetched: Value = app
            .get_with_key(&format!("/org/2/events/{}", id), ORG_A_KEY)
            .await
            .json();
        assert_eq!(fetched, updated);

        app.delete_with_key(&format!("/org/2/events/{}", id), ORG_A_KEY)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        app.get_with_key(&format!("/org/2/events/{}", id), ORG_A_KEY)
            .await
            .assert_not_found();
    }

    #[tokio::test]
    async fn test_create_rejects_blank_type() {
        let app = TestApp::new().await;

        let response = app
            .post_json_with_key("/org/2/events", ORG_A_KEY, json!({"type": " ", "name": "x"}))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["details"]["type"], "Type must not be empty");
    }

    #[tokio::test]
    async fn test_create_keeps_supplied_time() {
        let app = TestApp::new().await;

        let response = app
            .post_json_with_key(
                "/org/2/events",
                ORG_A_KEY,
                json!({"type": "info", "name": "Backfill", "time": "2020-02-03T04:05:06Z"}),
            )
            .await;
        response.assert_created();
        let created: Value = response.json();
        assert_eq!(created["time"], "2020-02-03T04:05:06Z");
    }

    #[tokio::test]
    async fn test_create_rejects_time_outside_four_digit_years() {
        let app = TestApp::new().await;

        let response = app
            .post_json_with_key(
                "/org/2/events",
                ORG_A_KEY,
                json!({"type": "info", "name": "Far future", "time": "+10000-01-01T00:00:00Z"}),
            )
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(
            body["details"]["time"],
            "Time must be between the years 0000 and 9999"
        );

        // nothing was stored, so listing still works
        let body: Value = app.get_with_key("/org/2/events", ORG_A_KEY).await.json();
        assert_eq!(body["total"], 0);
    }

    #[tokio::test]
    async fn test_create_for_missing_organization_conflicts() {
        let app = TestApp::new().await;

        let response = app
            .post_json_with_key(
                "/org/999/events",
                GLOBAL_KEY,
                json!({"type": "info", "name": "Orphan"}),
            )
            .await;
        response.assert_conflict();
        let body: Value = response.json();
        assert_eq!(body["message"], "referenced record does not exist");
    }

    #[tokio::test]
    async fn test_empty_update_is_bad_request() {
        let app = TestApp::new().await;
        let (event, _) = seed_org_a_events(&app.state).await;

        app.put_json_with_key(&format!("/org/2/events/{}", event.id), ORG_A_KEY, json!({}))
            .await
            .assert_bad_request();
    }
}

mod organizations {
    use super::*;

    #[tokio::test]
    async fn test_list_requires_global_key() {
        let app = TestApp::new().await;

        app.get_with_key("/org", ORG_A_KEY)
            .await
            .assert_unauthorized();

        let orgs: Vec<Value> = app.get_with_key("/org", GLOBAL_KEY).await.json();
        assert_eq!(orgs.len(), 3);
        assert!(orgs.iter().all(|o| o.get("secret_key").is_none()));
    }

    #[tokio::test]
    async fn test_create_returns_key_once() {
        let app = TestApp::new().await;

        let response = app
            .post_json_with_key("/org", GLOBAL_KEY, json!({"name": "Organization C"}))
            .await;
        response.assert_created();
        let created: Value = response.json();
        let key = created["secret_key"].as_str().unwrap().to_string();
        assert!(!key.is_empty());

        let id = created["id"].as_i64().unwrap();
        let fetched: Value = app
            .get_with_key(&format!("/org/{}", id), &key)
            .await
            .json();
        assert_eq!(fetched["name"], "Organization C");
        assert!(fetched.get("secret_key").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let app = TestApp::new().await;

        app.post_json_with_key("/org", GLOBAL_KEY, json!({"name": "Organization A"}))
            .await
            .assert_conflict();
    }

    #[tokio::test]
    async fn test_delete_organization() {
        let app = TestApp::new().await;

        app.delete_with_key("/org/3", ORG_A_KEY)
            .await
            .assert_unauthorized();
        app.delete_with_key("/org/1", GLOBAL_KEY)
            .await
            .assert_bad_request();
        app.delete_with_key("/org/3", GLOBAL_KEY)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        app.get_with_key("/org/3", GLOBAL_KEY)
            .await
            .assert_not_found();
    }
}

mod users {
    use super::*;

    fn carol() -> Value {
        json!({
            "username": "carol",
            "password": "secret1",
            "first_name": "Carol",
            "last_name": "Jones",
            "email": "carol@example.com"
        })
    }

    #[tokio::test]
    async fn test_create_and_list_users() {
        let app = TestApp::new().await;

        let response = app
            .post_json_with_key("/org/2/users", ORG_A_KEY, carol())
            .await;
        response.assert_created();
        let created: Value = response.json();
        assert_eq!(created["organization_id"], 2);
        assert!(created.get("password_hash").is_none());

        let body: Value = app.get_with_key("/org/2/users", ORG_A_KEY).await.json();
        assert_eq!(body["total"], 2);

        // the new user can sign in
        let response = app.login("carol", "secret1").await;
        response.assert_status(StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let app = TestApp::new().await;

        let mut body = carol();
        body["username"] = json!("alice");
        app.post_json_with_key("/org/2/users", ORG_A_KEY, body)
            .await
            .assert_conflict();
    }

    #[tokio::test]
    async fn test_user_for_missing_organization_conflicts() {
        let app = TestApp::new().await;

        let response = app
            .post_json_with_key("/org/999/users", GLOBAL_KEY, carol())
            .await;
        response.assert_conflict();
        let body: Value = response.json();
        assert_eq!(body["message"], "referenced record does not exist");

        app.login("carol", "secret1").await.assert_unauthorized();
    }

    #[tokio::test]
    async fn test_only_global_credentials_create_global_admins() {
        let app = TestApp::new().await;

        let mut body = carol();
        body["admin_status"] = json!(2);
        app.post_json_with_key("/org/2/users", ORG_A_KEY, body.clone())
            .await
            .assert_status(StatusCode::FORBIDDEN);
        app.post_json_with_key("/org/2/users", GLOBAL_KEY, body)
            .await
            .assert_created();
    }

    #[tokio::test]
    async fn test_invalid_user_lists_every_field() {
        let app = TestApp::new().await;

        let response = app
            .post_json_with_key(
                "/org/2/users",
                ORG_A_KEY,
                json!({
                    "username": "x y",
                    "password": "a",
                    "first_name": "Al",
                    "last_name": "Jones",
                    "email": "not-an-email"
                }),
            )
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = response.json();
        let details = body["details"].as_object().unwrap();
        for field in ["username", "password", "first_name", "email"] {
            assert!(details.contains_key(field), "missing {} in {:?}", field, details);
        }
        assert!(!details.contains_key("last_name"));
    }
}
