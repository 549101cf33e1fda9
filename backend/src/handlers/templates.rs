//! Message embed templates built in the dashboard, consumed by the bot.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::sync::Arc;
use tower_cookies::Cookies;
use uuid::Uuid;

use shared::api::{CreateTemplateRequest, EmbedTemplateResponse, UpdateTemplateRequest};

use crate::{
    error::ApiError,
    handlers::{fmt_ts, guards},
    models::{EmbedTemplateRow, NewEmbedTemplateRow},
    schema::embed_templates,
    AppState,
};

const MAX_NAME_LEN: usize = 255;

pub async fn list(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<Json<Vec<EmbedTemplateResponse>>, ApiError> {
    guards::require_role(&app_state, &cookies)?;

    let mut conn = app_state.db_pool.get()?;
    let rows: Vec<EmbedTemplateRow> = embed_templates::table
        .order(embed_templates::name.asc())
        .load(&mut conn)?;

    Ok(Json(rows.into_iter().map(to_response).collect()))
}

pub async fn get(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
    Path(id): Path<Uuid>,
) -> Result<Json<EmbedTemplateResponse>, ApiError> {
    guards::require_role(&app_state, &cookies)?;

    let mut conn = app_state.db_pool.get()?;
    let row: Option<EmbedTemplateRow> = embed_templates::table
        .find(id)
        .first(&mut conn)
        .optional()?;

    row.map(to_response).map(Json).ok_or(ApiError::NotFound)
}

pub async fn create(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(body): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<EmbedTemplateResponse>), ApiError> {
    let authed = guards::require_role(&app_state, &cookies)?;

    validate_name(&body.name)?;
    validate_embed(&body.embed)?;

    let mut conn = app_state.db_pool.get()?;
    let row: EmbedTemplateRow = diesel::insert_into(embed_templates::table)
        .values(NewEmbedTemplateRow {
            name: body.name,
            description: body.description,
            embed: body.embed,
            created_by: authed.user.discord_id,
        })
        .get_result(&mut conn)
        .map_err(name_conflict)?;

    Ok((StatusCode::CREATED, Json(to_response(row))))
}

pub async fn update(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateTemplateRequest>,
) -> Result<Json<EmbedTemplateResponse>, ApiError> {
    guards::require_role(&app_state, &cookies)?;

    if let Some(name) = body.name.as_deref() {
        validate_name(name)?;
    }
    if let Some(embed) = body.embed.as_ref() {
        validate_embed(embed)?;
    }

    let mut conn = app_state.db_pool.get()?;
    let row: EmbedTemplateRow = diesel::update(embed_templates::table.find(id))
        .set((
            TemplateChanges {
                name: body.name,
                description: body.description,
                embed: body.embed,
            },
            embed_templates::updated_at.eq(diesel::dsl::now),
        ))
        .get_result(&mut conn)
        .optional()
        .map_err(name_conflict)?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(to_response(row)))
}

pub async fn delete(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    guards::require_role(&app_state, &cookies)?;

    let mut conn = app_state.db_pool.get()?;
    let deleted = diesel::delete(embed_templates::table.find(id)).execute(&mut conn)?;

    if deleted == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::embed_templates)]
struct TemplateChanges {
    name: Option<String>,
    description: Option<String>,
    embed: Option<serde_json::Value>,
}

fn to_response(row: EmbedTemplateRow) -> EmbedTemplateResponse {
    EmbedTemplateResponse {
        id: row.id,
        name: row.name,
        description: row.description,
        embed: row.embed,
        created_by: row.created_by,
        created_at: fmt_ts(row.created_at),
        updated_at: fmt_ts(row.updated_at),
    }
}

fn name_conflict(e: DieselError) -> ApiError {
    match e {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            ApiError::BadRequest("a template with that name already exists".to_string())
        }
        e => e.into(),
    }
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() || name.len() > MAX_NAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "invalid name: must be 1-{} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

/// The builder serializes a single embed as a JSON object.
fn validate_embed(embed: &serde_json::Value) -> Result<(), ApiError> {
    if !embed.is_object() {
        return Err(ApiError::BadRequest(
            "invalid embed: expected a JSON object".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_must_be_an_object() {
        assert!(validate_embed(&serde_json::json!({"title": "hi"})).is_ok());
        assert!(validate_embed(&serde_json::json!([1, 2])).is_err());
        assert!(validate_embed(&serde_json::json!("text")).is_err());
        assert!(validate_embed(&serde_json::Value::Null).is_err());
    }

    #[test]
    fn name_length_limits() {
        assert!(validate_name("welcome").is_ok());
        assert!(validate_name("  ").is_err());
        assert!(validate_name(&"x".repeat(256)).is_err());
    }

    #[test]
    fn unique_violation_becomes_bad_request() {
        let err = name_conflict(DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key".to_string()),
        ));
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
