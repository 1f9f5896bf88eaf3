//! Events page: the paginated, filterable, searchable event table

use std::fmt::Write as _;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Response,
};
use tracing::debug;

use crate::{
    db::{EventRepository, RepoError},
    middleware::{CurrentUser, HxHeaders},
    models::{
        Event, PaginationQuery, PaginationRequestOptions, PaginationResponse, SortDirection,
    },
    utils::AppError,
    AppState,
};

use super::{
    html::{html_escape, respond},
    page_for,
};

/// Sortable table columns and their headings
const COLUMNS: &[(&str, &str)] = &[
    ("time", "Time"),
    ("type", "Type"),
    ("name", "Name"),
    ("application", "Application"),
    ("message", "Message"),
];

/// Anchor that swaps the events panel and keeps the URL in sync
fn panel_link(query: &str, label: &str, class: &str) -> String {
    let href = format!("/events{}", query);
    format!(
        r##"<a href="{0}" hx-get="{0}" hx-target="#events" hx-swap="outerHTML" hx-push-url="true"{1}>{2}</a>"##,
        html_escape(&href),
        class,
        label
    )
}

fn search_form(request: &PaginationRequestOptions) -> String {
    let filter = request
        .filter
        .as_ref()
        .map(|f| {
            format!(
                r#"<input type="hidden" name="filter" value="{}">"#,
                html_escape(&f.to_string())
            )
        })
        .unwrap_or_default();

    format!(
        r##"<form class="search" action="/events" hx-get="/events" hx-target="#events" hx-swap="outerHTML" hx-push-url="true">
    <input type="search" name="search" value="{}" placeholder="Search events">
    <input type="hidden" name="limit" value="{}">
    <input type="hidden" name="order_by" value="{}">
    {}
    <button type="submit">Search</button>
</form>"##,
        html_escape(request.search.as_deref().unwrap_or_default()),
        request.limit,
        html_escape(&request.order.to_string()),
        filter
    )
}

fn facets(page: &PaginationResponse<Vec<Event>>) -> String {
    let mut out = String::new();
    for facet in &page.filter_facets {
        let _ = write!(
            out,
            r#"<div class="facet"><strong>{}:</strong> "#,
            html_escape(&facet.property_name)
        );
        let all_class = if facet.selected_value.is_none() {
            r#" class="selected""#
        } else {
            ""
        };
        out.push_str(&panel_link(
            &page.request.filter_link(&facet.property_name, ""),
            "All",
            all_class,
        ));
        for value in &facet.values {
            let class = if facet.selected_value.as_deref() == Some(value.as_str()) {
                r#" class="selected""#
            } else {
                ""
            };
            out.push(' ');
            out.push_str(&panel_link(
                &page.request.filter_link(&facet.property_name, value),
                &html_escape(value),
                class,
            ));
        }
        out.push_str("</div>");
    }
    out
}

fn table(page: &PaginationResponse<Vec<Event>>) -> String {
    let mut out = String::from("<table><thead><tr>");
    for (column, heading) in COLUMNS {
        let marker = if page.request.order.column == *column {
            match page.request.order.direction {
                SortDirection::Asc => " &uarr;",
                SortDirection::Desc => " &darr;",
            }
        } else {
            ""
        };
        let _ = write!(
            out,
            "<th>{}</th>",
            panel_link(
                &page.request.sort_link_for_column(column),
                &format!("{}{}", heading, marker),
                ""
            )
        );
    }
    out.push_str("</tr></thead><tbody>");

    if page.data.is_empty() {
        let _ = write!(
            out,
            r#"<tr><td colspan="{}">No events found</td></tr>"#,
            COLUMNS.len()
        );
    }
    for event in &page.data {
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            event.formatted_time(),
            html_escape(&event.event_type),
            html_escape(&event.name),
            html_escape(event.application.as_deref().unwrap_or_default()),
            html_escape(event.message.as_deref().unwrap_or_default()),
        );
    }
    out.push_str("</tbody></table>");
    out
}

fn pager(page: &PaginationResponse<Vec<Event>>) -> String {
    let summary = if page.total == 0 {
        "No results".to_string()
    } else {
        format!("Showing {} to {} of {}", page.start, page.end, page.total)
    };
    let previous = page
        .previous_page
        .as_ref()
        .map(|p| panel_link(&p.query_string(), "&laquo; Previous", ""))
        .unwrap_or_default();
    let next = page
        .next_page
        .as_ref()
        .map(|p| panel_link(&p.query_string(), "Next &raquo;", ""))
        .unwrap_or_default();

    format!(
        r#"<div class="pager"><span>{}</span> {} {}</div>"#,
        summary, previous, next
    )
}

/// The swappable `#events` panel
fn events_panel(page: &PaginationResponse<Vec<Event>>, notice: Option<&str>) -> String {
    let notice = notice
        .map(|n| format!(r#"<p class="error">{}</p>"#, html_escape(n)))
        .unwrap_or_default();
    format!(
        r#"<div id="events">
{}
{}
{}
{}
{}
</div>"#,
        notice,
        search_form(&page.request),
        facets(page),
        table(page),
        pager(page)
    )
}

/// `GET /events`
///
/// Malformed query parameters fall back to the default listing with a notice
/// instead of failing the page.
pub async fn events_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    hx: HxHeaders,
    Query(query): Query<PaginationQuery>,
) -> Result<Response, AppError> {
    let (options, mut notice) = match PaginationRequestOptions::from_query(&query) {
        Ok(options) => (options, None),
        Err(e) => (PaginationRequestOptions::default(), Some(e.to_string())),
    };
    debug!(user_id = user.id, "Rendering events with {}", options);

    let organization_id = user.organization_id;
    let page_data = page_for(&state, user, "/events").await?;
    let repo = EventRepository::new(&state.db);
    let events = match repo.all_for_organization(organization_id, &options).await {
        // well-formed but unknown order or filter columns
        Err(RepoError::InvalidParameter(message)) => {
            notice = Some(message);
            repo.all_for_organization(organization_id, &PaginationRequestOptions::default())
                .await?
        }
        result => result?,
    };

    let content = events_panel(&events, notice.as_deref());
    Ok(respond(&hx, StatusCode::OK, "Events", &page_data, &content))
}
