//! HTML rendering helpers shared by the web pages

use std::collections::BTreeMap;
use std::fmt::Write as _;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::{
    middleware::HxHeaders,
    models::{Organization, User},
};

const HTMX_SCRIPT: &str = "https://unpkg.com/htmx.org@1.9.12";

const STYLE: &str = r#"
        body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
               margin: 0; background: #f5f5f5; color: #222; }
        nav { background: #1f2937; padding: 12px 24px; display: flex; gap: 16px; align-items: center; }
        nav a { color: #e5e7eb; text-decoration: none; }
        nav a.active { color: #fff; font-weight: 600; }
        nav .spacer { flex: 1; }
        main { max-width: 1100px; margin: 24px auto; background: white; padding: 24px;
               border-radius: 8px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }
        table { width: 100%; border-collapse: collapse; }
        th, td { text-align: left; padding: 6px 8px; border-bottom: 1px solid #eee; }
        .toast { background: #d1fae5; color: #065f46; padding: 8px 12px; border-radius: 4px; margin-bottom: 12px; }
        .error { color: #dc3545; font-size: 0.9em; }
        .facet a.selected { font-weight: 600; text-decoration: underline; }
        label { display: block; margin-top: 12px; }
"#;

/// Everything a page needs besides its own content
#[derive(Debug, Clone, Default)]
pub struct PageData {
    pub user: Option<User>,
    pub organization: Option<Organization>,
    pub route: &'static str,
    pub errors: BTreeMap<String, String>,
    pub toasts: Vec<String>,
}

impl PageData {
    pub fn new(user: User, organization: Organization, route: &'static str) -> Self {
        Self {
            user: Some(user),
            organization: Some(organization),
            route,
            ..Default::default()
        }
    }

    pub fn has_error(&self, name: &str) -> bool {
        self.errors.contains_key(name)
    }

    pub fn add_toast(&mut self, toast: impl Into<String>) {
        self.toasts.push(toast.into());
    }

    /// `<p class="error">` for a field, or nothing
    pub fn field_error(&self, name: &str) -> String {
        self.errors
            .get(name)
            .map(|message| format!(r#"<p class="error">{}</p>"#, html_escape(message)))
            .unwrap_or_default()
    }
}

/// Simple HTML escaping
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn toasts(page: &PageData) -> String {
    page.toasts.iter().fold(String::new(), |mut out, toast| {
        let _ = write!(out, r#"<div class="toast">{}</div>"#, html_escape(toast));
        out
    })
}

fn nav(page: &PageData) -> String {
    let Some(user) = &page.user else {
        return String::new();
    };
    let link = |href: &str, label: &str| {
        let class = if page.route.starts_with(href) {
            r#" class="active""#
        } else {
            ""
        };
        format!(r#"<a href="{}"{}>{}</a>"#, href, class, label)
    };
    let organization = page
        .organization
        .as_ref()
        .map(|o| html_escape(&o.name))
        .unwrap_or_default();

    format!(
        r#"<nav hx-boost="true">
        <strong style="color:#fff">Laser Beam</strong>
        {}
        {}
        <span class="spacer"></span>
        <span style="color:#9ca3af">{} &middot; {}</span>
        <a href="/logout" hx-boost="false">Log out</a>
    </nav>"#,
        link("/events", "Events"),
        link("/account", "Account"),
        html_escape(&user.username),
        organization
    )
}

/// Full HTML document around `content`
pub fn layout(title: &str, page: &PageData, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{} - Laser Beam</title>
    <script src="{}"></script>
    <style>{}</style>
</head>
<body>
    {}
    <main id="content">
        {}{}
    </main>
</body>
</html>"#,
        html_escape(title),
        HTMX_SCRIPT,
        STYLE,
        nav(page),
        toasts(page),
        content
    )
}

/// Render a fragment for htmx swaps and a full page otherwise.
///
/// htmx only swaps 2xx responses, so fragments are always sent with 200.
pub fn respond(
    hx: &HxHeaders,
    status: StatusCode,
    title: &str,
    page: &PageData,
    content: &str,
) -> Response {
    if hx.wants_fragment() {
        let fragment = format!("{}{}", toasts(page), content);
        (StatusCode::OK, Html(fragment)).into_response()
    } else {
        (status, Html(layout(title, page, content))).into_response()
    }
}
