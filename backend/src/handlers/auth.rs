//! Discord OAuth login, role verification, session lifecycle.
//!
//! The callback is the only place roles are verified. OAuth failures
//! redirect with `auth_failed` and write nothing; a failed role check still
//! creates the session (authenticated without role) and redirects with
//! `no_role`.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
    Json,
};
use diesel::prelude::*;
use oauth2::{AuthorizationCode, CsrfToken, Scope, TokenResponse};
use serde::Deserialize;
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::{error, info};

use shared::api::{AuthStatusResponse, SessionUser};
use shared::endpoints::AUTH_ERROR_ROUTE;

use crate::{
    error::ApiError,
    handlers::guards,
    models::{NewUser, User},
    schema::{auth_sessions, users},
    AppState,
};

pub async fn login(State(app_state): State<Arc<AppState>>) -> Result<Redirect, ApiError> {
    let client = app_state
        .oauth_client
        .as_ref()
        .ok_or(ApiError::NotConfigured)?;

    let (auth_url, _csrf_token) = client
        .authorize_url(CsrfToken::new_random)
        .add_scope(Scope::new("identify".to_string()))
        .add_scope(Scope::new("email".to_string()))
        .add_scope(Scope::new("guilds".to_string()))
        .url();

    Ok(Redirect::temporary(auth_url.as_str()))
}

#[derive(Debug, Deserialize)]
pub struct AuthCallbackQuery {
    /// Absent when Discord redirects back with an error instead of a code.
    code: Option<String>,
}

pub async fn callback(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
    Query(query): Query<AuthCallbackQuery>,
) -> Result<Redirect, ApiError> {
    let client = app_state
        .oauth_client
        .as_ref()
        .ok_or(ApiError::NotConfigured)?;

    let Some(code) = query.code else {
        info!("oauth callback without code (user denied or provider error)");
        return Ok(Redirect::temporary(&error_redirect("auth_failed")));
    };

    // Exchange code for tokens
    let token: oauth2::StandardTokenResponse<
        oauth2::EmptyExtraTokenFields,
        oauth2::basic::BasicTokenType,
    > = match client
        .exchange_code(AuthorizationCode::new(code))
        .request_async(oauth2::reqwest::async_http_client)
        .await
    {
        Ok(token) => token,
        Err(e) => {
            error!("oauth code exchange failed: {}", e);
            return Ok(Redirect::temporary(&error_redirect("auth_failed")));
        }
    };

    let access_token = token.access_token().secret().clone();
    let refresh_token = token.refresh_token().map(|t| t.secret().clone());

    let profile = match app_state.discord.fetch_profile(&access_token).await {
        Ok(profile) => profile,
        Err(e) => {
            error!("profile fetch failed: {}", e);
            return Ok(Redirect::temporary(&error_redirect("auth_failed")));
        }
    };

    info!("user authenticated: {} ({})", profile.username, profile.id);

    let mut conn = app_state.db_pool.get()?;

    // Bypass roster short-circuits the Discord role chain entirely.
    let has_required_role = if guards::is_auth_bypassed(&app_state, &mut conn, &profile.id)? {
        info!("role check bypassed for {}", profile.id);
        true
    } else {
        app_state
            .discord
            .verify_required_role(&access_token, &profile.id)
            .await
    };

    let new_user = NewUser {
        discord_id: profile.id.clone(),
        username: profile.username,
        discriminator: profile.discriminator,
        avatar: profile.avatar,
        email: profile.email,
        access_token: Some(access_token),
        refresh_token,
        has_required_role,
    };

    // One row per Discord ID: insert on first login, update after.
    let user: User = diesel::insert_into(users::table)
        .values(&new_user)
        .on_conflict(users::discord_id)
        .do_update()
        .set((&new_user, users::updated_at.eq(diesel::dsl::now)))
        .get_result(&mut conn)?;

    let session_id = guards::create_session(&mut conn, user.id)?;
    guards::set_session_cookie(&app_state, &cookies, session_id);

    info!(
        "login complete for {}: has_required_role={}",
        user.discord_id, user.has_required_role
    );

    Ok(Redirect::temporary(&post_login_redirect(has_required_role)))
}

pub async fn status(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<Json<AuthStatusResponse>, ApiError> {
    let configured = app_state.oauth_client.is_some();

    match guards::require_session(&app_state, &cookies) {
        Ok(authed) => Ok(Json(AuthStatusResponse {
            configured,
            authenticated: true,
            user: Some(user_projection(&authed.user)),
        })),
        Err(ApiError::Unauthorized) => Ok(Json(AuthStatusResponse {
            configured,
            authenticated: false,
            user: None,
        })),
        Err(e) => Err(e),
    }
}

pub async fn logout(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<StatusCode, ApiError> {
    if let Ok(authed) = guards::require_session(&app_state, &cookies) {
        let mut conn = app_state.db_pool.get()?;
        diesel::delete(auth_sessions::table.find(authed.session_id)).execute(&mut conn)?;
        info!("user {} logged out", authed.user.discord_id);
    }
    guards::clear_session_cookie(&app_state, &cookies);
    Ok(StatusCode::NO_CONTENT)
}

/// Dev-mode only: log in as the seeded test user without touching Discord.
pub async fn dev_login(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<Redirect, ApiError> {
    if !app_state.dev_mode {
        return Err(ApiError::NotFound);
    }

    let mut conn = app_state.db_pool.get()?;
    let user: User = users::table
        .filter(users::discord_id.eq(crate::DEV_USER_DISCORD_ID))
        .first(&mut conn)?;

    let session_id = guards::create_session(&mut conn, user.id)?;
    guards::set_session_cookie(&app_state, &cookies, session_id);

    info!("dev mode: auto-logged in as {}", user.username);
    Ok(Redirect::temporary("/"))
}

pub fn user_projection(user: &User) -> SessionUser {
    SessionUser {
        id: user.id,
        discord_id: user.discord_id.clone(),
        username: user.username.clone(),
        discriminator: user.discriminator.clone(),
        avatar: user.avatar.clone(),
        email: user.email.clone(),
        has_required_role: user.has_required_role,
    }
}

fn post_login_redirect(has_required_role: bool) -> String {
    if has_required_role {
        "/".to_string()
    } else {
        error_redirect("no_role")
    }
}

fn error_redirect(reason: &str) -> String {
    format!("{}?reason={}", AUTH_ERROR_ROUTE, reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_holder_lands_on_app_root() {
        assert_eq!(post_login_redirect(true), "/");
    }

    #[test]
    fn missing_role_redirects_with_marker() {
        assert_eq!(post_login_redirect(false), "/auth/error?reason=no_role");
    }

    #[test]
    fn oauth_failure_marker() {
        assert_eq!(error_redirect("auth_failed"), "/auth/error?reason=auth_failed");
    }
}
