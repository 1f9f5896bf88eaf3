//! Shared paginated listing queries
//!
//! Every tenant-scoped listing goes through [`ListingTable`]: the tenant predicate
//! is always applied, values are always bound with `push_bind`, and column names
//! only reach the SQL text after being matched against the table's allow-list.

use sqlx::{sqlite::SqliteRow, FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::models::PaginationRequestOptions;

use super::RepoError;

/// How a table answers the `search` parameter
pub(crate) enum SearchSurface {
    /// FTS5 index whose rowid is the table id
    FullText { index: &'static str },
    /// Prefix `LIKE` over plain columns
    Prefix { columns: &'static [&'static str] },
}

/// Description of a tenant-scoped table that supports listing
pub(crate) struct ListingTable {
    pub table: &'static str,
    pub columns: &'static [&'static str],
    pub sortable: &'static [&'static str],
    pub filterable: &'static [&'static str],
    pub search: SearchSurface,
}

impl ListingTable {
    pub fn select_list(&self) -> String {
        self.columns.join(", ")
    }

    fn order_column(&self, column: &str) -> Result<&'static str, RepoError> {
        self.sortable
            .iter()
            .copied()
            .find(|c| *c == column)
            .ok_or_else(|| RepoError::invalid_parameter(format!("cannot order by '{}'", column)))
    }

    pub fn filter_column(&self, column: &str) -> Result<&'static str, RepoError> {
        self.filterable
            .iter()
            .copied()
            .find(|c| *c == column)
            .ok_or_else(|| RepoError::invalid_parameter(format!("cannot filter on '{}'", column)))
    }

    /// Tenant, filter and search predicates shared by the page and count queries.
    fn push_where(
        &self,
        builder: &mut QueryBuilder<'_, Sqlite>,
        organization_id: i64,
        options: &PaginationRequestOptions,
    ) -> Result<(), RepoError> {
        builder.push(" WHERE organization_id = ");
        builder.push_bind(organization_id);

        if let Some(filter) = &options.filter {
            let column = self.filter_column(&filter.key)?;
            builder.push(format!(" AND {} = ", column));
            builder.push_bind(filter.value.clone());
        }

        if let Some(search) = options.search.as_deref() {
            match &self.search {
                SearchSurface::FullText { index } => {
                    if let Some(expression) = fts_match_expression(search) {
                        builder.push(format!(
                            " AND id IN (SELECT rowid FROM {index} WHERE {index} MATCH "
                        ));
                        builder.push_bind(expression);
                        builder.push(")");
                    }
                }
                SearchSurface::Prefix { columns } => {
                    for token in search.split_whitespace() {
                        let pattern = format!("{}%", escape_like(token));
                        builder.push(" AND (");
                        for (i, column) in columns.iter().enumerate() {
                            if i > 0 {
                                builder.push(" OR ");
                            }
                            builder.push(format!("{} LIKE ", column));
                            builder.push_bind(pattern.clone());
                            builder.push(" ESCAPE '\\'");
                        }
                        builder.push(")");
                    }
                }
            }
        }

        Ok(())
    }

    /// Fetch one page of rows for a tenant together with the total matching count.
    pub async fn fetch_page<T>(
        &self,
        pool: &SqlitePool,
        organization_id: i64,
        options: &PaginationRequestOptions,
    ) -> Result<(Vec<T>, i64), RepoError>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let order_column = self.order_column(&options.order.column)?;

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM {}",
            self.select_list(),
            self.table
        ));
        self.push_where(&mut query, organization_id, options)?;
        query.push(format!(
            " ORDER BY {} {}",
            order_column,
            options.order.direction.as_sql()
        ));
        if order_column != "id" {
            query.push(", id ASC");
        }
        query.push(" LIMIT ");
        query.push_bind(options.limit);
        query.push(" OFFSET ");
        query.push_bind(options.offset);

        debug!(sql = query.sql(), options = %options, "Listing {}", self.table);

        let rows = query.build_query_as::<T>().fetch_all(pool).await?;
        let total = self.count(pool, organization_id, options).await?;

        Ok((rows, total))
    }

    /// Count rows matching the tenant, filter and search predicates, ignoring offset/limit.
    pub async fn count(
        &self,
        pool: &SqlitePool,
        organization_id: i64,
        options: &PaginationRequestOptions,
    ) -> Result<i64, RepoError> {
        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM {}", self.table));
        self.push_where(&mut query, organization_id, options)?;

        let total = query.build_query_scalar::<i64>().fetch_one(pool).await?;
        Ok(total)
    }

    /// Distinct non-empty values of a filterable column within a tenant, sorted.
    pub async fn distinct_values(
        &self,
        pool: &SqlitePool,
        column: &str,
        organization_id: i64,
    ) -> Result<Vec<String>, RepoError> {
        let column = self.filter_column(column)?;
        let sql = format!(
            "SELECT DISTINCT CAST({column} AS TEXT) FROM {table} \
             WHERE organization_id = ? AND {column} IS NOT NULL AND {column} != '' \
             ORDER BY 1",
            column = column,
            table = self.table
        );

        let values = sqlx::query_scalar::<_, String>(&sql)
            .bind(organization_id)
            .fetch_all(pool)
            .await?;
        Ok(values)
    }
}

/// Build an FTS5 expression in which every whitespace token must prefix-match.
///
/// Tokens are quoted so operator characters in user input stay literal. Tokens
/// without any alphanumeric character index to nothing and are skipped.
pub(crate) fn fts_match_expression(search: &str) -> Option<String> {
    let terms: Vec<String> = search
        .split_whitespace()
        .filter(|token| token.chars().any(char::is_alphanumeric))
        .map(|token| format!("\"{}\"*", token.replace('"', "\"\"")))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" AND "))
    }
}

fn escape_like(token: &str) -> String {
    let mut escaped = String::with_capacity(token.len());
    for c in token.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
