//! HTMX request headers
//!
//! Pages are rendered whole for normal navigation and as fragments when htmx
//! swaps part of the page, so handlers inspect these headers.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
};

/// The htmx request flags that decide between a full page and a fragment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HxHeaders {
    pub boosted: bool,
    pub request: bool,
    pub history_restore_request: bool,
}

impl HxHeaders {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let flag = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.eq_ignore_ascii_case("true"))
        };

        Self {
            boosted: flag("hx-boosted"),
            request: flag("hx-request"),
            history_restore_request: flag("hx-history-restore-request"),
        }
    }

    /// True when htmx will swap the response into an existing page
    pub fn wants_fragment(&self) -> bool {
        self.request && !self.boosted && !self.history_restore_request
    }
}

impl<S> FromRequestParts<S> for HxHeaders
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(HxHeaders::from_headers(&parts.headers))
    }
}

/// Redirect that also works for htmx requests, which need `HX-Redirect` instead of a 3xx.
pub fn hx_redirect(hx: &HxHeaders, location: &str) -> Response {
    if hx.request {
        match HeaderValue::from_str(location) {
            Ok(value) => {
                let mut response = StatusCode::OK.into_response();
                response.headers_mut().insert("HX-Redirect", value);
                response
            }
            Err(_) => Redirect::to("/").into_response(),
        }
    } else {
        Redirect::to(location).into_response()
    }
}
