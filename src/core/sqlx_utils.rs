use chrono::{DateTime, FixedOffset};
use sqlx::{
    postgres::{PgArguments, PgRow},
    query::{Query, QueryAs},
    Postgres,
};

#[derive(Clone, Debug)]
pub enum SqlxBinds {
    String(String),
    Int(i32),
    DateTimeFixedOffset(DateTime<FixedOffset>),
}

pub fn binds_query(stmt: &str, binds: Vec<SqlxBinds>) -> Query<'_, Postgres, PgArguments> {
    let mut q: Query<'_, Postgres, PgArguments> = sqlx::query(stmt);
    for bind in binds.into_iter() {
        q = match bind {
            SqlxBinds::String(val) => q.bind(val),
            SqlxBinds::Int(val) => q.bind(val),
            SqlxBinds::DateTimeFixedOffset(val) => q.bind(val),
        };
    }
    q
}

pub fn binds_query_as<'a, T: for<'r> sqlx::FromRow<'r, PgRow>>(
    stmt: &'a str,
    binds: Vec<SqlxBinds>,
) -> QueryAs<'a, Postgres, T, PgArguments> {
    let mut q: QueryAs<'_, Postgres, T, PgArguments> = sqlx::query_as(stmt);
    for bind in binds.into_iter() {
        q = match bind {
            SqlxBinds::String(val) => q.bind(val),
            SqlxBinds::Int(val) => q.bind(val),
            SqlxBinds::DateTimeFixedOffset(val) => q.bind(val),
        };
    }
    q
}

pub fn query_builder(
    select: Option<String>,
    table_name: &str,
    wheres: &[String],
    order_by: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
) -> String {
    // Select
    let mut stmt = "SELECT ".to_string();
    if let Some(val) = select {
        stmt.push_str(&val);
    } else {
        stmt.push('*');
    }

    // From
    stmt.push_str(format!(" FROM {}", table_name).as_str());

    // Where
    if !wheres.is_empty() {
        stmt.push_str(" WHERE ");
        stmt.push_str(&wheres.join(" AND "));
    }

    // Order by
    if !order_by.is_empty() {
        stmt.push_str(" ORDER BY ");
        stmt.push_str(&order_by.join(", "));
    }

    if let Some(limit) = limit {
        stmt.push_str(format!(" LIMIT {}", limit).as_str());
    }
    if let Some(offset) = offset {
        stmt.push_str(format!(" OFFSET {}", offset).as_str());
    }
    stmt
}

/// Turns `page`/`page_size` into `(limit, offset)`, treating page 0 as page 1.
/// The offset is capped at Postgres' BIGINT range.
pub fn page_to_limit_offset(page: u32, page_size: u32) -> (u64, u64) {
    let page = u64::from(page.max(1));
    let offset = (page - 1)
        .saturating_mul(u64::from(page_size))
        .min(i64::MAX as u64);
    (u64::from(page_size), offset)
}

/// Turns a `count(id)` result into `(total, num_page)`, saturating at `u32::MAX`.
pub fn count_to_total_pages(count: i64, page_size: u32) -> (u32, u32) {
    let total = u32::try_from(count.max(0)).unwrap_or(u32::MAX);
    (total, total.div_ceil(page_size.max(1)))
}
