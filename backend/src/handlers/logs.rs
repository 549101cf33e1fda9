//! Bot log listing, filtering, analytics, and ingest.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use diesel::pg::Pg;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use tower_cookies::Cookies;

use shared::api::{CategoryStats, CreateLogRequest, LogEntry, LogListResponse, LogStats};

use crate::{
    error::ApiError,
    handlers::{fmt_ts, guards},
    models::{LogRow, NewLogRow},
    schema::logs,
    AppState,
};

diesel::define_sql_function! {
    fn lower(x: diesel::sql_types::Text) -> diesel::sql_types::Text;
}

pub const LEVELS: &[&str] = &["info", "warning", "error"];
pub const CATEGORIES: &[&str] = &["message", "command", "moderation", "system"];

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 500;

#[derive(Debug, Default, Deserialize)]
pub struct LogListQuery {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

fn filtered(query: &LogListQuery) -> logs::BoxedQuery<'static, Pg> {
    let mut q = logs::table.into_boxed();
    if let Some(level) = normalized(query.level.as_deref()) {
        q = q.filter(lower(logs::level).eq(level));
    }
    if let Some(category) = normalized(query.category.as_deref()) {
        q = q.filter(lower(logs::category).eq(category));
    }
    if let Some(search) = normalized(query.search.as_deref()) {
        q = q.filter(lower(logs::message).like(format!("%{}%", search)));
    }
    q
}

pub async fn list(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
    Query(query): Query<LogListQuery>,
) -> Result<Json<LogListResponse>, ApiError> {
    guards::require_role(&app_state, &cookies)?;

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = query.offset.unwrap_or(0).max(0);

    let mut conn = app_state.db_pool.get()?;

    let rows: Vec<LogRow> = filtered(&query)
        .order(logs::id.desc())
        .limit(limit)
        .offset(offset)
        .load(&mut conn)?;

    let total: i64 = filtered(&query).count().get_result(&mut conn)?;

    Ok(Json(LogListResponse {
        entries: rows.into_iter().map(to_entry).collect(),
        total,
    }))
}

pub async fn stats(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<Json<LogStats>, ApiError> {
    guards::require_role(&app_state, &cookies)?;

    let mut conn = app_state.db_pool.get()?;
    let count_level = |conn: &mut PgConnection, level: &str| -> Result<i64, diesel::result::Error> {
        logs::table
            .filter(lower(logs::level).eq(level))
            .count()
            .get_result(conn)
    };

    Ok(Json(LogStats {
        total: logs::table.count().get_result(&mut conn)?,
        error: count_level(&mut conn, "error")?,
        warning: count_level(&mut conn, "warning")?,
        info: count_level(&mut conn, "info")?,
    }))
}

pub async fn category_stats(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<Json<CategoryStats>, ApiError> {
    guards::require_role(&app_state, &cookies)?;

    let mut conn = app_state.db_pool.get()?;
    let count_category =
        |conn: &mut PgConnection, category: &str| -> Result<i64, diesel::result::Error> {
            logs::table
                .filter(lower(logs::category).eq(category))
                .count()
                .get_result(conn)
        };

    Ok(Json(CategoryStats {
        total: logs::table.count().get_result(&mut conn)?,
        message: count_category(&mut conn, "message")?,
        command: count_category(&mut conn, "command")?,
        moderation: count_category(&mut conn, "moderation")?,
        system: count_category(&mut conn, "system")?,
    }))
}

pub async fn create(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    cookies: Cookies,
    Json(body): Json<CreateLogRequest>,
) -> Result<(StatusCode, Json<LogEntry>), ApiError> {
    guards::require_bot_key_or_role(&app_state, &headers, &cookies)?;

    if body.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }
    let level = validate_choice(body.level.as_deref(), LEVELS, "info", "level")?;
    let category = validate_choice(body.category.as_deref(), CATEGORIES, "system", "category")?;

    let mut conn = app_state.db_pool.get()?;
    let row: LogRow = diesel::insert_into(logs::table)
        .values(NewLogRow {
            message: body.message,
            level,
            category,
        })
        .get_result(&mut conn)?;

    Ok((StatusCode::CREATED, Json(to_entry(row))))
}

fn to_entry(row: LogRow) -> LogEntry {
    LogEntry {
        id: row.id,
        message: row.message,
        level: row.level,
        category: row.category,
        created_at: fmt_ts(row.created_at),
    }
}

fn normalized(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Lowercase and check against the allowed set; absent values take the
/// default. Rejections name the offending field.
fn validate_choice(
    value: Option<&str>,
    allowed: &[&str],
    default: &str,
    field: &str,
) -> Result<String, ApiError> {
    match normalized(value) {
        None => Ok(default.to_string()),
        Some(v) if allowed.contains(&v.as_str()) => Ok(v),
        Some(v) => Err(ApiError::BadRequest(format!(
            "invalid {}: '{}' (expected one of {})",
            field,
            v,
            allowed.join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_normalize_case_and_whitespace() {
        assert_eq!(normalized(Some("  ERROR ")), Some("error".to_string()));
        assert_eq!(normalized(Some("   ")), None);
        assert_eq!(normalized(None), None);
    }

    #[test]
    fn level_defaults_when_absent() {
        assert_eq!(
            validate_choice(None, LEVELS, "info", "level").unwrap(),
            "info"
        );
        assert_eq!(
            validate_choice(Some("WARNING"), LEVELS, "info", "level").unwrap(),
            "warning"
        );
    }

    #[test]
    fn unknown_level_is_rejected_with_field_name() {
        let err = validate_choice(Some("fatal"), LEVELS, "info", "level").unwrap_err();
        assert!(err.to_string().contains("level"));
        assert!(err.to_string().contains("fatal"));
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert!(validate_choice(Some("voice"), CATEGORIES, "system", "category").is_err());
    }
}
