//! Moderation warn records: dashboard reads, bot or dashboard writes.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use diesel::prelude::*;
use std::sync::Arc;
use tower_cookies::Cookies;

use shared::api::{CreateWarnRequest, WarnEntry};

use crate::{
    error::ApiError,
    handlers::{fmt_ts, guards},
    models::{NewWarnRow, WarnRow},
    schema::warns,
    AppState,
};

pub async fn list(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<Json<Vec<WarnEntry>>, ApiError> {
    guards::require_role(&app_state, &cookies)?;

    let mut conn = app_state.db_pool.get()?;
    let rows: Vec<WarnRow> = warns::table.order(warns::id.asc()).load(&mut conn)?;

    Ok(Json(rows.into_iter().map(to_entry).collect()))
}

pub async fn create(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    cookies: Cookies,
    Json(body): Json<CreateWarnRequest>,
) -> Result<(StatusCode, Json<WarnEntry>), ApiError> {
    guards::require_bot_key_or_role(&app_state, &headers, &cookies)?;

    validate_snowflake(&body.user_id, "user_id")?;
    validate_snowflake(&body.moderator_id, "moderator_id")?;
    if body.reason.trim().is_empty() {
        return Err(ApiError::BadRequest("reason must not be empty".to_string()));
    }

    let mut conn = app_state.db_pool.get()?;
    let row: WarnRow = diesel::insert_into(warns::table)
        .values(NewWarnRow {
            user_id: body.user_id,
            moderator_id: body.moderator_id,
            reason: body.reason,
        })
        .get_result(&mut conn)?;

    Ok((StatusCode::CREATED, Json(to_entry(row))))
}

fn to_entry(row: WarnRow) -> WarnEntry {
    WarnEntry {
        id: row.id,
        user_id: row.user_id,
        moderator_id: row.moderator_id,
        reason: row.reason,
        created_at: fmt_ts(row.created_at),
    }
}

/// Snowflakes are decimal strings up to 20 digits.
pub fn validate_snowflake(value: &str, field: &str) -> Result<(), ApiError> {
    let ok = !value.is_empty() && value.len() <= 20 && value.bytes().all(|b| b.is_ascii_digit());
    if ok {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "invalid {}: expected a Discord snowflake",
            field
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snowflakes_are_decimal_strings() {
        assert!(validate_snowflake("934443300520345631", "user_id").is_ok());
        assert!(validate_snowflake("", "user_id").is_err());
        assert!(validate_snowflake("not-a-snowflake", "user_id").is_err());
        assert!(validate_snowflake("123456789012345678901", "user_id").is_err());
    }
}
