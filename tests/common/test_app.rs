//! Test application setup utilities
//!
//! Builds the full router over a throwaway SQLite file and drives it with
//! `tower::ServiceExt::oneshot`.

use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use tower::ServiceExt;
use uuid::Uuid;

use laser_beam::{
    config::{AppConfig, DatabaseConfig},
    create_router, db, AppState,
};

use super::fixtures::{seed, Seed};

/// Test application wrapper for integration testing
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub seed: Seed,
}

impl TestApp {
    /// Create a seeded test application
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Create a seeded test application with custom configuration
    pub async fn with_config(config: AppConfig) -> Self {
        let db = db::init_pool(&config.database)
            .await
            .expect("Failed to initialize test database");
        let state = AppState::new(config, db);
        let seed = seed(&state).await;
        let router = create_router(state.clone());

        Self {
            router,
            state,
            seed,
        }
    }

    /// Make a GET request to the test application
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// GET authenticated with an API key header
    pub async fn get_with_key(&self, uri: &str, key: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("GET")
                .uri(uri)
                .header("X-API-Key", key)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Request with a JSON body, authenticated with an API key header
    pub async fn json_with_key(
        &self,
        method: &str,
        uri: &str,
        key: &str,
        body: serde_json::Value,
    ) -> TestResponse {
        self.request(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("X-API-Key", key)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Make a POST request with JSON body
    pub async fn post_json_with_key(
        &self,
        uri: &str,
        key: &str,
        body: serde_json::Value,
    ) -> TestResponse {
        self.json_with_key("POST", uri, key, body).await
    }

    /// Make a PUT request with JSON body
    pub async fn put_json_with_key(
        &self,
        uri: &str,
        key: &str,
        body: serde_json::Value,
    ) -> TestResponse {
        self.json_with_key("PUT", uri, key, body).await
    }

    /// Make a DELETE request
    pub async fn delete_with_key(&self, uri: &str, key: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .header("X-API-Key", key)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Submit the login form and return the response
    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        let form = format!(
            "username={}&password={}",
            urlencoding::encode(username),
            urlencoding::encode(password)
        );
        self.request(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form))
                .unwrap(),
        )
        .await
    }

    /// Log in and return the session token from the cookie
    pub async fn session_for(&self, username: &str, password: &str) -> String {
        let response = self.login(username, password).await;
        response
            .session_cookie(&self.state.config.auth.session_cookie_name)
            .unwrap_or_else(|| panic!("login as {} did not set a session cookie", username))
    }

    /// GET with a session cookie
    pub async fn get_with_session(&self, uri: &str, token: &str) -> TestResponse {
        self.request(self.session_request("GET", uri, token, None, Body::empty()))
            .await
    }

    /// GET with a session cookie, as htmx would send it
    pub async fn hx_get_with_session(&self, uri: &str, token: &str) -> TestResponse {
        let mut request = self.session_request("GET", uri, token, None, Body::empty());
        request
            .headers_mut()
            .insert("HX-Request", "true".parse().unwrap());
        self.request(request).await
    }

    /// POST a urlencoded form with a session cookie
    pub async fn post_form_with_session(&self, uri: &str, token: &str, form: &str) -> TestResponse {
        self.request(self.session_request(
            "POST",
            uri,
            token,
            Some("application/x-www-form-urlencoded"),
            Body::from(form.to_string()),
        ))
        .await
    }

    /// PUT a JSON body with a session cookie
    pub async fn put_json_with_session(
        &self,
        uri: &str,
        token: &str,
        body: serde_json::Value,
    ) -> TestResponse {
        self.request(self.session_request(
            "PUT",
            uri,
            token,
            Some("application/json"),
            Body::from(body.to_string()),
        ))
        .await
    }

    fn session_request(
        &self,
        method: &str,
        uri: &str,
        token: &str,
        content_type: Option<&str>,
        body: Body,
    ) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri).header(
            header::COOKIE,
            format!("{}={}", self.state.config.auth.session_cookie_name, token),
        );
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        builder.body(body).unwrap()
    }

    /// Make an arbitrary request
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: axum::http::StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: bytes::Bytes,
}

impl TestResponse {
    /// Get the response body as a string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Parse the response body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse response as JSON")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Value of the session cookie set by this response, if any
    pub fn session_cookie(&self, name: &str) -> Option<String> {
        let prefix = format!("{}=", name);
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.strip_prefix(&prefix))
            .map(|v| v.split(';').next().unwrap_or_default().to_string())
            .find(|v| !v.is_empty())
    }

    /// Assert the response status
    pub fn assert_status(&self, expected: axum::http::StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
        self
    }

    /// Assert the response status is OK (200)
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::OK)
    }

    /// Assert the response status is Created (201)
    pub fn assert_created(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::CREATED)
    }

    /// Assert the response status is Bad Request (400)
    pub fn assert_bad_request(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::BAD_REQUEST)
    }

    /// Assert the response status is Unauthorized (401)
    pub fn assert_unauthorized(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::UNAUTHORIZED)
    }

    /// Assert the response status is Not Found (404)
    pub fn assert_not_found(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::NOT_FOUND)
    }

    /// Assert the response status is Conflict (409)
    pub fn assert_conflict(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::CONFLICT)
    }

    /// Assert a redirect (plain or htmx) to `location`
    pub fn assert_redirect_to(&self, location: &str) -> &Self {
        let target = self.header("location").or_else(|| self.header("hx-redirect"));
        assert_eq!(
            target,
            Some(location),
            "Expected redirect to {}, got status {} with headers {:?}",
            location,
            self.status,
            self.headers
        );
        self
    }
}

/// Create a test configuration with a temporary SQLite database
pub fn test_config() -> AppConfig {
    // Use a unique temp file for each test to avoid conflicts
    let db_path = format!(
        "/tmp/laser_beam_test_{}.db",
        Uuid::new_v4().to_string().replace('-', "")
    );

    AppConfig {
        database: DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", db_path),
            max_connections: 4,
            min_connections: 1,
            ..DatabaseConfig::default()
        },
        ..AppConfig::default()
    }
}
