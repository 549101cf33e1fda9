//! Bot heartbeat, derived online status, and bot configuration.

use axum::{
    extract::State,
    http::HeaderMap,
    Json,
};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use std::sync::Arc;
use tower_cookies::Cookies;

use shared::api::{BotConfigResponse, BotStatusResponse, HeartbeatRequest, UpdateBotConfigRequest};

use crate::{
    error::ApiError,
    handlers::{fmt_ts, guards, warns::validate_snowflake},
    models::{BotConfigRow, BotStatusRow, NewBotStatusRow},
    schema::{bot_config, bot_status},
    AppState,
};

/// No heartbeat for this long means the bot is reported offline.
pub const HEARTBEAT_STALE_SECS: i64 = 60;

const DEFAULT_PREFIX: &str = ",";
const MAX_PREFIX_LEN: usize = 8;

/// Bot-only: refresh the singleton heartbeat row.
pub async fn heartbeat(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<HeartbeatRequest>,
) -> Result<Json<BotStatusResponse>, ApiError> {
    guards::require_bot_key(&app_state, &headers)?;

    if body.status.trim().is_empty() {
        return Err(ApiError::BadRequest("status must not be empty".to_string()));
    }

    let mut conn = app_state.db_pool.get()?;

    let existing: Option<BotStatusRow> = bot_status::table.first(&mut conn).optional()?;

    let row: BotStatusRow = match existing {
        Some(existing) => diesel::update(bot_status::table.find(existing.id))
            .set((
                bot_status::status.eq(body.status),
                bot_status::uptime.eq(body.uptime.or(existing.uptime)),
                bot_status::error_message.eq(body.error_message),
                bot_status::last_heartbeat.eq(diesel::dsl::now),
                bot_status::updated_at.eq(diesel::dsl::now),
            ))
            .get_result(&mut conn)?,
        None => diesel::insert_into(bot_status::table)
            .values(NewBotStatusRow {
                status: body.status,
                uptime: body.uptime,
                error_message: body.error_message,
            })
            .get_result(&mut conn)?,
    };

    Ok(Json(to_status_response(Some(row))))
}

/// Dashboard view of the bot's liveness.
pub async fn status(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<Json<BotStatusResponse>, ApiError> {
    guards::require_role(&app_state, &cookies)?;

    let mut conn = app_state.db_pool.get()?;
    let row: Option<BotStatusRow> = bot_status::table.first(&mut conn).optional()?;

    Ok(Json(to_status_response(row)))
}

pub async fn get_config(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    cookies: Cookies,
) -> Result<Json<BotConfigResponse>, ApiError> {
    guards::require_bot_key_or_role(&app_state, &headers, &cookies)?;

    let mut conn = app_state.db_pool.get()?;
    let row = load_or_create_config(&mut conn)?;

    Ok(Json(to_config_response(row)))
}

pub async fn update_config(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(body): Json<UpdateBotConfigRequest>,
) -> Result<Json<BotConfigResponse>, ApiError> {
    let authed = guards::require_role(&app_state, &cookies)?;

    if let Some(prefix) = body.prefix.as_deref() {
        validate_prefix(prefix)?;
    }
    if let Some(channels) = body.allowed_channels.as_deref() {
        for channel in channels {
            validate_snowflake(channel, "allowed_channels")?;
        }
    }

    let mut conn = app_state.db_pool.get()?;
    let existing = load_or_create_config(&mut conn)?;

    let row: BotConfigRow = diesel::update(bot_config::table.find(existing.id))
        .set((
            BotConfigChanges {
                prefix: body.prefix,
                disabled_commands: body.disabled_commands,
                allowed_channels: body.allowed_channels,
            },
            bot_config::updated_by.eq(Some(authed.user.discord_id)),
            bot_config::updated_at.eq(diesel::dsl::now),
        ))
        .get_result(&mut conn)?;

    Ok(Json(to_config_response(row)))
}

/// Partial update; `None` fields are left untouched.
#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::bot_config)]
struct BotConfigChanges {
    prefix: Option<String>,
    disabled_commands: Option<Vec<String>>,
    allowed_channels: Option<Vec<String>>,
}

fn load_or_create_config(conn: &mut PgConnection) -> Result<BotConfigRow, ApiError> {
    let existing: Option<BotConfigRow> = bot_config::table.first(conn).optional()?;
    match existing {
        Some(row) => Ok(row),
        None => Ok(diesel::insert_into(bot_config::table)
            .values((
                bot_config::prefix.eq(DEFAULT_PREFIX),
                bot_config::disabled_commands.eq(Vec::<String>::new()),
                bot_config::allowed_channels.eq(Vec::<String>::new()),
            ))
            .get_result(conn)?),
    }
}

fn to_status_response(row: Option<BotStatusRow>) -> BotStatusResponse {
    let now = chrono::Utc::now().naive_utc();
    match row {
        Some(row) => BotStatusResponse {
            online: is_online(row.last_heartbeat, now),
            status: row.status,
            uptime: row.uptime,
            error_message: row.error_message,
            last_heartbeat: Some(fmt_ts(row.last_heartbeat)),
            started_at: Some(fmt_ts(row.started_at)),
        },
        // No heartbeat ever received.
        None => BotStatusResponse {
            online: false,
            status: "unknown".to_string(),
            uptime: None,
            error_message: None,
            last_heartbeat: None,
            started_at: None,
        },
    }
}

fn to_config_response(row: BotConfigRow) -> BotConfigResponse {
    BotConfigResponse {
        prefix: row.prefix,
        disabled_commands: row.disabled_commands,
        allowed_channels: row.allowed_channels,
        updated_by: row.updated_by,
        updated_at: fmt_ts(row.updated_at),
    }
}

fn is_online(last_heartbeat: NaiveDateTime, now: NaiveDateTime) -> bool {
    (now - last_heartbeat).num_seconds() < HEARTBEAT_STALE_SECS
}

fn validate_prefix(prefix: &str) -> Result<(), ApiError> {
    if prefix.is_empty() || prefix.len() > MAX_PREFIX_LEN || prefix.chars().any(char::is_whitespace)
    {
        return Err(ApiError::BadRequest(format!(
            "invalid prefix: must be 1-{} characters with no whitespace",
            MAX_PREFIX_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn online_threshold_is_sixty_seconds() {
        let now = chrono::Utc::now().naive_utc();
        assert!(is_online(now, now));
        assert!(is_online(now - Duration::seconds(59), now));
        assert!(!is_online(now - Duration::seconds(60), now));
        assert!(!is_online(now - Duration::hours(2), now));
    }

    #[test]
    fn prefix_rules() {
        assert!(validate_prefix(",").is_ok());
        assert!(validate_prefix("!!").is_ok());
        assert!(validate_prefix("").is_err());
        assert!(validate_prefix("! ").is_err());
        assert!(validate_prefix("longprefix").is_err());
    }
}
