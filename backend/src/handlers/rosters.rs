//! Admin and auth-bypass rosters, admin-gated.
//!
//! Both rosters merge a configured default list (irremovable, surfaced with
//! `is_default: true`) with database rows added from the dashboard.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::sync::Arc;
use tower_cookies::Cookies;

use shared::api::{AddRosterRequest, RosterEntry};

use crate::{
    error::ApiError,
    handlers::{fmt_ts, guards, warns::validate_snowflake},
    models::{AdminUserRow, AuthBypassUserRow, NewAdminUserRow, NewAuthBypassUserRow},
    schema::{admin_users, auth_bypass_users},
    AppState,
};

fn merge_roster(
    defaults: &[String],
    stored: impl IntoIterator<Item = (String, String, NaiveDateTime)>,
) -> Vec<RosterEntry> {
    let mut entries: Vec<RosterEntry> = defaults
        .iter()
        .map(|id| RosterEntry {
            discord_id: id.clone(),
            added_by: "default".to_string(),
            added_at: None,
            is_default: true,
        })
        .collect();

    for (discord_id, added_by, added_at) in stored {
        // A default id that was also inserted shows up once, as default.
        if defaults.iter().any(|d| *d == discord_id) {
            continue;
        }
        entries.push(RosterEntry {
            discord_id,
            added_by,
            added_at: Some(fmt_ts(added_at)),
            is_default: false,
        });
    }

    entries
}

fn already_listed(e: DieselError) -> ApiError {
    match e {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            ApiError::BadRequest("that user is already on the roster".to_string())
        }
        e => e.into(),
    }
}

// ============================================================================
// Admins
// ============================================================================

pub async fn list_admins(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<Json<Vec<RosterEntry>>, ApiError> {
    guards::require_admin(&app_state, &cookies)?;

    let mut conn = app_state.db_pool.get()?;
    let rows: Vec<AdminUserRow> = admin_users::table
        .order(admin_users::added_at.asc())
        .load(&mut conn)?;

    Ok(Json(merge_roster(
        &app_state.default_admins,
        rows.into_iter().map(|r| (r.discord_id, r.added_by, r.added_at)),
    )))
}

pub async fn add_admin(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(body): Json<AddRosterRequest>,
) -> Result<(StatusCode, Json<RosterEntry>), ApiError> {
    let authed = guards::require_admin(&app_state, &cookies)?;
    validate_snowflake(&body.discord_id, "discord_id")?;

    if app_state.default_admins.iter().any(|d| *d == body.discord_id) {
        return Err(ApiError::BadRequest(
            "that user is already a default admin".to_string(),
        ));
    }

    let mut conn = app_state.db_pool.get()?;
    let row: AdminUserRow = diesel::insert_into(admin_users::table)
        .values(NewAdminUserRow {
            discord_id: body.discord_id,
            added_by: authed.user.discord_id,
        })
        .get_result(&mut conn)
        .map_err(already_listed)?;

    Ok((
        StatusCode::CREATED,
        Json(RosterEntry {
            discord_id: row.discord_id,
            added_by: row.added_by,
            added_at: Some(fmt_ts(row.added_at)),
            is_default: false,
        }),
    ))
}

pub async fn remove_admin(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
    Path(discord_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    guards::require_admin(&app_state, &cookies)?;

    if app_state.default_admins.iter().any(|d| *d == discord_id) {
        return Err(ApiError::BadRequest(
            "default admins cannot be removed".to_string(),
        ));
    }

    let mut conn = app_state.db_pool.get()?;
    let deleted = diesel::delete(admin_users::table.filter(admin_users::discord_id.eq(&discord_id)))
        .execute(&mut conn)?;

    if deleted == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Auth bypass
// ============================================================================

pub async fn list_bypass(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<Json<Vec<RosterEntry>>, ApiError> {
    guards::require_admin(&app_state, &cookies)?;

    let mut conn = app_state.db_pool.get()?;
    let rows: Vec<AuthBypassUserRow> = auth_bypass_users::table
        .order(auth_bypass_users::added_at.asc())
        .load(&mut conn)?;

    Ok(Json(merge_roster(
        &app_state.default_auth_bypass,
        rows.into_iter().map(|r| (r.discord_id, r.added_by, r.added_at)),
    )))
}

pub async fn add_bypass(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(body): Json<AddRosterRequest>,
) -> Result<(StatusCode, Json<RosterEntry>), ApiError> {
    let authed = guards::require_admin(&app_state, &cookies)?;
    validate_snowflake(&body.discord_id, "discord_id")?;

    if app_state
        .default_auth_bypass
        .iter()
        .any(|d| *d == body.discord_id)
    {
        return Err(ApiError::BadRequest(
            "that user is already bypassed by default".to_string(),
        ));
    }

    let mut conn = app_state.db_pool.get()?;
    let row: AuthBypassUserRow = diesel::insert_into(auth_bypass_users::table)
        .values(NewAuthBypassUserRow {
            discord_id: body.discord_id,
            added_by: authed.user.discord_id,
        })
        .get_result(&mut conn)
        .map_err(already_listed)?;

    Ok((
        StatusCode::CREATED,
        Json(RosterEntry {
            discord_id: row.discord_id,
            added_by: row.added_by,
            added_at: Some(fmt_ts(row.added_at)),
            is_default: false,
        }),
    ))
}

pub async fn remove_bypass(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
    Path(discord_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    guards::require_admin(&app_state, &cookies)?;

    if app_state
        .default_auth_bypass
        .iter()
        .any(|d| *d == discord_id)
    {
        return Err(ApiError::BadRequest(
            "default bypass entries cannot be removed".to_string(),
        ));
    }

    let mut conn = app_state.db_pool.get()?;
    let deleted = diesel::delete(
        auth_bypass_users::table.filter(auth_bypass_users::discord_id.eq(&discord_id)),
    )
    .execute(&mut conn)?;

    if deleted == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn defaults_lead_and_duplicates_collapse() {
        let defaults = vec!["100".to_string(), "200".to_string()];
        let now = Utc::now().naive_utc();
        let stored = vec![
            ("200".to_string(), "100".to_string(), now),
            ("300".to_string(), "100".to_string(), now),
        ];

        let merged = merge_roster(&defaults, stored);
        assert_eq!(merged.len(), 3);
        assert!(merged[0].is_default && merged[1].is_default);
        assert_eq!(merged[2].discord_id, "300");
        assert!(!merged[2].is_default);
        // "200" appears once, flagged as default.
        assert_eq!(
            merged.iter().filter(|e| e.discord_id == "200").count(),
            1
        );
    }

    #[test]
    fn empty_defaults_and_rows() {
        let stored: Vec<(String, String, NaiveDateTime)> = Vec::new();
        assert!(merge_roster(&[], stored).is_empty());
    }
}
