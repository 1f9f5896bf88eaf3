//! Pagination, filtering, ordering and search options
//!
//! Listing endpoints accept `offset`, `limit`, `filter=<column>:<value>`,
//! `order_by=<column>[:asc|desc]` and `search=<text>` query parameters. They are
//! parsed into [`PaginationRequestOptions`], which the repositories translate into
//! bound SQL, and the results come back wrapped in a [`PaginationResponse`] carrying
//! the previous/next page descriptors and the filter facets.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page size used when the request does not specify one
pub const DEFAULT_LIMIT: i64 = 10;

/// Largest page size a caller may request
pub const MAX_LIMIT: i64 = 100;

/// Column used when the request does not specify an order
pub const DEFAULT_ORDER_COLUMN: &str = "id";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("invalid '{name}' parameter: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl PaginationError {
    fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        PaginationError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// SQL keyword for this direction
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SortDirection {
    type Err = PaginationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(PaginationError::invalid(
                "order_by",
                format!("unknown sort direction '{}'", s),
            )),
        }
    }
}

/// Single equality predicate, `column = value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub key: String,
    pub value: String,
}

impl FilterOption {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Parse `"<key>:<value>"`
    pub fn parse(raw: &str) -> Result<Self, PaginationError> {
        let parts: Vec<&str> = raw.split(':').collect();
        match parts.as_slice() {
            [key, value] if !key.is_empty() && !value.is_empty() => {
                Ok(FilterOption::new(*key, *value))
            }
            _ => Err(PaginationError::invalid(
                "filter",
                "expected the format '<column>:<value>'",
            )),
        }
    }

    fn to_query_value(&self) -> String {
        format!(
            "{}:{}",
            urlencoding::encode(&self.key),
            urlencoding::encode(&self.value)
        )
    }
}

impl std::fmt::Display for FilterOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.key, self.value)
    }
}

/// Ordering column and direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderOption {
    pub column: String,
    pub direction: SortDirection,
}

impl Default for OrderOption {
    fn default() -> Self {
        Self {
            column: DEFAULT_ORDER_COLUMN.to_string(),
            direction: SortDirection::Asc,
        }
    }
}

impl OrderOption {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    /// Parse `"<column>"` or `"<column>:<direction>"`; empty input yields the default.
    pub fn parse(raw: &str) -> Result<Self, PaginationError> {
        if raw.is_empty() {
            return Ok(OrderOption::default());
        }

        let parts: Vec<&str> = raw.split(':').collect();
        match parts.as_slice() {
            [column] if !column.is_empty() => Ok(OrderOption::new(*column, SortDirection::Asc)),
            [column, direction] if !column.is_empty() => {
                Ok(OrderOption::new(*column, direction.parse()?))
            }
            _ => Err(PaginationError::invalid(
                "order_by",
                "expected the format '<column>' or '<column>:<asc|desc>'",
            )),
        }
    }
}

impl std::fmt::Display for OrderOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.column, self.direction)
    }
}

/// Raw query parameters as they arrive on the request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationQuery {
    pub offset: Option<String>,
    pub limit: Option<String>,
    pub filter: Option<String>,
    pub order_by: Option<String>,
    pub search: Option<String>,
}

/// Parsed listing options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationRequestOptions {
    pub offset: i64,
    pub limit: i64,
    pub filter: Option<FilterOption>,
    pub order: OrderOption,
    pub search: Option<String>,
}

impl Default for PaginationRequestOptions {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
            filter: None,
            order: OrderOption::default(),
            search: None,
        }
    }
}

impl PaginationRequestOptions {
    /// Build options from raw query parameters, applying defaults for anything missing.
    pub fn from_query(query: &PaginationQuery) -> Result<Self, PaginationError> {
        let mut options = PaginationRequestOptions::default();

        if let Some(offset) = non_empty(&query.offset) {
            options.offset = offset
                .parse::<i64>()
                .map_err(|_| PaginationError::invalid("offset", "must be an integer"))?;
            if options.offset < 0 {
                return Err(PaginationError::invalid("offset", "must not be negative"));
            }
        }

        if let Some(limit) = non_empty(&query.limit) {
            let limit = limit
                .parse::<i64>()
                .map_err(|_| PaginationError::invalid("limit", "must be an integer"))?;
            if limit < 0 {
                return Err(PaginationError::invalid("limit", "must not be negative"));
            }
            if limit > MAX_LIMIT {
                return Err(PaginationError::invalid(
                    "limit",
                    format!("must not exceed {}", MAX_LIMIT),
                ));
            }
            // zero falls back to the default page size
            if limit > 0 {
                options.limit = limit;
            }
        }

        if let Some(filter) = non_empty(&query.filter) {
            options.filter = Some(FilterOption::parse(filter)?);
        }

        if let Some(order_by) = non_empty(&query.order_by) {
            options.order = OrderOption::parse(order_by)?;
        }

        options.search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(options)
    }

    /// Options for the following page, or `None` when this is the last page.
    pub fn next(&self, total: i64) -> Option<Self> {
        let offset = self.offset.checked_add(self.limit)?;
        if offset >= total {
            return None;
        }
        Some(Self {
            offset,
            ..self.clone()
        })
    }

    /// Options for the preceding page, or `None` when this is the first page.
    pub fn previous(&self, _total: i64) -> Option<Self> {
        let offset = self.offset - self.limit;
        if offset < 0 {
            return None;
        }
        Some(Self {
            offset,
            ..self.clone()
        })
    }

    /// Query string (with leading `?`) that reproduces these options.
    pub fn query_string(&self) -> String {
        let mut query = format!("?offset={}&limit={}", self.offset, self.limit);
        if let Some(filter) = &self.filter {
            query.push_str("&filter=");
            query.push_str(&filter.to_query_value());
        }
        query.push_str(&format!(
            "&order_by={}:{}",
            urlencoding::encode(&self.order.column),
            self.order.direction
        ));
        if let Some(search) = &self.search {
            query.push_str("&search=");
            query.push_str(&urlencoding::encode(search));
        }
        query
    }

    /// Link that sorts by `column`, toggling the direction if it is already the sort column.
    pub fn sort_link_for_column(&self, column: &str) -> String {
        let direction = if self.order.column == column {
            self.order.direction.reversed()
        } else {
            SortDirection::Asc
        };
        Self {
            order: OrderOption::new(column, direction),
            ..self.clone()
        }
        .query_string()
    }

    /// Link that filters on `column = value`; an empty column or value clears the filter.
    pub fn filter_link(&self, column: &str, value: &str) -> String {
        let filter = if column.is_empty() || value.is_empty() {
            None
        } else {
            Some(FilterOption::new(column, value))
        };
        Self {
            offset: 0,
            filter,
            ..self.clone()
        }
        .query_string()
    }

    /// Currently selected filter value for `column`, if any
    pub fn selected_filter_value(&self, column: &str) -> Option<&str> {
        self.filter
            .as_ref()
            .filter(|f| f.key == column)
            .map(|f| f.value.as_str())
    }
}

impl std::fmt::Display for PaginationRequestOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "offset: {} limit: {} filter: {} order_by: {} search: {}",
            self.offset,
            self.limit,
            self.filter
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            self.order,
            self.search.as_deref().unwrap_or_default()
        )
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Distinct values available for a filterable column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterFacet {
    pub property_name: String,
    pub values: Vec<String>,
    pub selected_value: Option<String>,
}

impl FilterFacet {
    pub fn new(
        property_name: impl Into<String>,
        values: Vec<String>,
        request: &PaginationRequestOptions,
    ) -> Self {
        let property_name = property_name.into();
        let selected_value = request
            .selected_filter_value(&property_name)
            .map(str::to_string);
        Self {
            property_name,
            values,
            selected_value,
        }
    }
}

/// One page of results plus navigation metadata
#[derive(Debug, Clone, Serialize)]
pub struct PaginationResponse<T> {
    pub data: T,
    pub request: PaginationRequestOptions,
    pub previous_page: Option<PaginationRequestOptions>,
    pub next_page: Option<PaginationRequestOptions>,
    pub filter_facets: Vec<FilterFacet>,
    pub start: i64,
    pub end: i64,
    pub total: i64,
}

impl<T> PaginationResponse<T> {
    pub fn new(
        data: T,
        request: PaginationRequestOptions,
        total: i64,
        filter_facets: Vec<FilterFacet>,
    ) -> Self {
        Self {
            previous_page: request.previous(total),
            next_page: request.next(total),
            start: request.offset.saturating_add(1),
            end: request.offset.saturating_add(request.limit).min(total),
            total,
            filter_facets,
            request,
            data,
        }
    }
}
