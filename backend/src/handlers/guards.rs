//! Per-route authorization tiers.
//!
//! Tiers build on each other: a valid session (401 otherwise), the Discord
//! role flag on top of that (403), and admin roster membership as its own
//! gate. The bot's shared-secret header is an independent trust path that
//! bypasses sessions entirely.

use axum::http::HeaderMap;
use chrono::{Duration, NaiveDateTime, Utc};
use diesel::prelude::*;
use tower_cookies::{cookie::SameSite, Cookie, Cookies};
use uuid::Uuid;

use shared::endpoints::{BOT_API_KEY_HEADER, SESSION_COOKIE_NAME};

use crate::{
    error::ApiError,
    models::{AuthSession, NewAuthSession, User},
    schema::{admin_users, auth_bypass_users, auth_sessions, users},
    AppState,
};

/// Fixed session lifetime; pushed out again on every authenticated request.
pub const SESSION_TTL_DAYS: i64 = 7;

/// A resolved session: the cookie's session row plus its user.
pub struct AuthedUser {
    pub session_id: Uuid,
    pub user: User,
}

/// Resolve the signed session cookie to a live session and its user.
///
/// Expired sessions are deleted on sight; live ones get their expiry pushed
/// out (touch on read). No Discord call happens here.
pub fn require_session(state: &AppState, cookies: &Cookies) -> Result<AuthedUser, ApiError> {
    let cookie = cookies
        .signed(&state.cookie_key)
        .get(SESSION_COOKIE_NAME)
        .ok_or(ApiError::Unauthorized)?;

    let session_id: Uuid = cookie.value().parse().map_err(|_| ApiError::Unauthorized)?;

    let mut conn = state.db_pool.get()?;

    let session: Option<AuthSession> = auth_sessions::table
        .find(session_id)
        .first(&mut conn)
        .optional()?;
    let Some(session) = session else {
        return Err(ApiError::Unauthorized);
    };

    let now = Utc::now().naive_utc();
    if session_expired(session.expires_at, now) {
        diesel::delete(auth_sessions::table.find(session_id)).execute(&mut conn)?;
        return Err(ApiError::Unauthorized);
    }

    diesel::update(auth_sessions::table.find(session_id))
        .set(auth_sessions::expires_at.eq(now + Duration::days(SESSION_TTL_DAYS)))
        .execute(&mut conn)?;

    let user: Option<User> = users::table
        .find(session.user_id)
        .first(&mut conn)
        .optional()?;
    let Some(user) = user else {
        // Session points at a deleted user; treat as no session.
        return Err(ApiError::Unauthorized);
    };

    Ok(AuthedUser { session_id, user })
}

/// Session plus the cached role flag from the last login.
pub fn require_role(state: &AppState, cookies: &Cookies) -> Result<AuthedUser, ApiError> {
    let authed = require_session(state, cookies)?;
    if !authed.user.has_required_role {
        tracing::info!(
            "role gate: user {} ({}) missing required role",
            authed.user.username,
            authed.user.discord_id
        );
        return Err(ApiError::MissingRole);
    }
    Ok(authed)
}

/// Session plus admin roster membership. Does not require the role flag;
/// the admin roster is its own trust decision.
pub fn require_admin(state: &AppState, cookies: &Cookies) -> Result<AuthedUser, ApiError> {
    let authed = require_session(state, cookies)?;
    let mut conn = state.db_pool.get()?;
    if !is_admin(state, &mut conn, &authed.user.discord_id)? {
        tracing::info!(
            "admin gate: user {} ({}) is not an admin",
            authed.user.username,
            authed.user.discord_id
        );
        return Err(ApiError::NotAdmin);
    }
    Ok(authed)
}

/// Service-credential trust path for the bot process.
pub fn require_bot_key(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let provided = headers
        .get(BOT_API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    if bot_key_matches(state.bot_api_key.as_deref(), provided) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

/// Either the bot's shared secret or a role-holding session.
///
/// Returns `None` for the bot path (no human user behind the request).
pub fn require_bot_key_or_role(
    state: &AppState,
    headers: &HeaderMap,
    cookies: &Cookies,
) -> Result<Option<AuthedUser>, ApiError> {
    if require_bot_key(state, headers).is_ok() {
        return Ok(None);
    }
    require_role(state, cookies).map(Some)
}

pub fn is_admin(
    state: &AppState,
    conn: &mut PgConnection,
    discord_id: &str,
) -> Result<bool, ApiError> {
    if state.default_admins.iter().any(|id| id == discord_id) {
        return Ok(true);
    }
    let found: i64 = admin_users::table
        .filter(admin_users::discord_id.eq(discord_id))
        .count()
        .get_result(conn)?;
    Ok(found > 0)
}

pub fn is_auth_bypassed(
    state: &AppState,
    conn: &mut PgConnection,
    discord_id: &str,
) -> Result<bool, ApiError> {
    if state.default_auth_bypass.iter().any(|id| id == discord_id) {
        return Ok(true);
    }
    let found: i64 = auth_bypass_users::table
        .filter(auth_bypass_users::discord_id.eq(discord_id))
        .count()
        .get_result(conn)?;
    Ok(found > 0)
}

/// Create a session row and return its id for the cookie.
pub fn create_session(conn: &mut PgConnection, user_id: Uuid) -> Result<Uuid, ApiError> {
    let session = NewAuthSession {
        id: Uuid::new_v4(),
        user_id,
        expires_at: Utc::now().naive_utc() + Duration::days(SESSION_TTL_DAYS),
    };
    diesel::insert_into(auth_sessions::table)
        .values(&session)
        .execute(conn)?;
    Ok(session.id)
}

pub fn set_session_cookie(state: &AppState, cookies: &Cookies, session_id: Uuid) {
    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, session_id.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(!state.dev_mode); // Don't require HTTPS in dev mode
    cookie.set_same_site(SameSite::Lax);
    cookies.signed(&state.cookie_key).add(cookie);
}

pub fn clear_session_cookie(state: &AppState, cookies: &Cookies) {
    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, "");
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(!state.dev_mode);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(tower_cookies::cookie::time::Duration::ZERO);
    cookies.signed(&state.cookie_key).add(cookie);
}

fn session_expired(expires_at: NaiveDateTime, now: NaiveDateTime) -> bool {
    expires_at <= now
}

fn bot_key_matches(configured: Option<&str>, provided: Option<&str>) -> bool {
    match (configured, provided) {
        (Some(configured), Some(provided)) => !configured.is_empty() && configured == provided,
        // No configured key means the service path is disabled outright.
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_boundary_is_exclusive() {
        let now = Utc::now().naive_utc();
        assert!(session_expired(now, now));
        assert!(session_expired(now - Duration::seconds(1), now));
        assert!(!session_expired(now + Duration::seconds(1), now));
    }

    #[test]
    fn bot_key_requires_configured_secret() {
        // Absent configuration fails every request, even an empty match.
        assert!(!bot_key_matches(None, Some("secret")));
        assert!(!bot_key_matches(None, None));
        assert!(!bot_key_matches(Some(""), Some("")));
    }

    #[test]
    fn bot_key_exact_match_only() {
        assert!(bot_key_matches(Some("s3cret"), Some("s3cret")));
        assert!(!bot_key_matches(Some("s3cret"), Some("s3cret ")));
        assert!(!bot_key_matches(Some("s3cret"), None));
    }
}
