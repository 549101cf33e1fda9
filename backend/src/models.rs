use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub discord_id: String,
    pub username: String,
    pub discriminator: Option<String>,
    pub avatar: Option<String>,
    pub email: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub has_required_role: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Insert shape for the login upsert. Also the update changeset, so a
/// profile field Discord stopped returning is cleared rather than kept.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::users)]
#[diesel(treat_none_as_null = true)]
pub struct NewUser {
    pub discord_id: String,
    pub username: String,
    pub discriminator: Option<String>,
    pub avatar: Option<String>,
    pub email: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub has_required_role: bool,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::auth_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AuthSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::auth_sessions)]
pub struct NewAuthSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub expires_at: NaiveDateTime,
}

#[derive(Debug, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LogRow {
    pub id: i32,
    pub message: String,
    pub level: String,
    pub category: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::logs)]
pub struct NewLogRow {
    pub message: String,
    pub level: String,
    pub category: String,
}

#[derive(Debug, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::warns)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WarnRow {
    pub id: i32,
    pub user_id: String,
    pub moderator_id: String,
    pub reason: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::warns)]
pub struct NewWarnRow {
    pub user_id: String,
    pub moderator_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::bot_status)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BotStatusRow {
    pub id: i32,
    pub status: String,
    pub uptime: Option<String>,
    pub error_message: Option<String>,
    pub last_heartbeat: NaiveDateTime,
    pub started_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::bot_status)]
pub struct NewBotStatusRow {
    pub status: String,
    pub uptime: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::bot_config)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BotConfigRow {
    pub id: i32,
    pub prefix: String,
    pub disabled_commands: Vec<String>,
    pub allowed_channels: Vec<String>,
    pub updated_by: Option<String>,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::embed_templates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EmbedTemplateRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub embed: serde_json::Value,
    pub created_by: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::embed_templates)]
pub struct NewEmbedTemplateRow {
    pub name: String,
    pub description: Option<String>,
    pub embed: serde_json::Value,
    pub created_by: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::admin_users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AdminUserRow {
    pub id: i32,
    pub discord_id: String,
    pub added_by: String,
    pub added_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::admin_users)]
pub struct NewAdminUserRow {
    pub discord_id: String,
    pub added_by: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::auth_bypass_users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AuthBypassUserRow {
    pub id: i32,
    pub discord_id: String,
    pub added_by: String,
    pub added_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::auth_bypass_users)]
pub struct NewAuthBypassUserRow {
    pub discord_id: String,
    pub added_by: String,
}
