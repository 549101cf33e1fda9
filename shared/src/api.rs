//! Request and response bodies for the dashboard HTTP API.
//!
//! Timestamps cross the wire as RFC 3339 strings so the frontend never
//! needs chrono.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Auth
// ============================================================================

/// Reduced user projection returned to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub discord_id: String,
    pub username: String,
    pub discriminator: Option<String>,
    pub avatar: Option<String>,
    pub email: Option<String>,
    pub has_required_role: bool,
}

/// Response for the auth status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthStatusResponse {
    /// Whether Discord OAuth credentials are configured at all.
    pub configured: bool,
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
}

/// JSON body attached to every error status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

// ============================================================================
// Logs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i32,
    pub message: String,
    pub level: String,
    pub category: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogListResponse {
    pub entries: Vec<LogEntry>,
    /// Total rows matching the filter, ignoring limit/offset.
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateLogRequest {
    pub message: String,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Per-level totals for the analytics cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogStats {
    pub total: i64,
    pub error: i64,
    pub warning: i64,
    pub info: i64,
}

/// Per-category totals for the analytics cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub total: i64,
    pub message: i64,
    pub command: i64,
    pub moderation: i64,
    pub system: i64,
}

// ============================================================================
// Warns
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarnEntry {
    pub id: i32,
    /// Snowflake of the warned member.
    pub user_id: String,
    /// Snowflake of the moderator who issued the warn.
    pub moderator_id: String,
    pub reason: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateWarnRequest {
    pub user_id: String,
    pub moderator_id: String,
    pub reason: String,
}

// ============================================================================
// Bot status / config
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatRequest {
    pub status: String,
    #[serde(default)]
    pub uptime: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotStatusResponse {
    /// Derived from heartbeat staleness, never stored.
    pub online: bool,
    pub status: String,
    pub uptime: Option<String>,
    pub error_message: Option<String>,
    pub last_heartbeat: Option<String>,
    pub started_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotConfigResponse {
    pub prefix: String,
    pub disabled_commands: Vec<String>,
    pub allowed_channels: Vec<String>,
    pub updated_by: Option<String>,
    pub updated_at: String,
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateBotConfigRequest {
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub disabled_commands: Option<Vec<String>>,
    #[serde(default)]
    pub allowed_channels: Option<Vec<String>>,
}

// ============================================================================
// Embed templates
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedTemplateResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// The embed payload exactly as the builder serialized it.
    pub embed: serde_json::Value,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTemplateRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub embed: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateTemplateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub embed: Option<serde_json::Value>,
}

// ============================================================================
// Admin / auth-bypass rosters
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub discord_id: String,
    /// Snowflake of whoever added this entry, or "default" for built-ins.
    pub added_by: String,
    pub added_at: Option<String>,
    /// Default entries come from server configuration and cannot be removed.
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddRosterRequest {
    pub discord_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_status_omits_absent_user() {
        let resp = AuthStatusResponse {
            configured: true,
            authenticated: false,
            user: None,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(!json.contains("user"));

        let parsed: AuthStatusResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, resp);
    }

    #[test]
    fn auth_status_with_user() {
        let json = r#"{
            "configured": true,
            "authenticated": true,
            "user": {
                "id": "550e8400-e29b-41d4-a716-446655440000",
                "discord_id": "934443300520345631",
                "username": "mod",
                "discriminator": null,
                "avatar": null,
                "email": "mod@example.com",
                "has_required_role": true
            }
        }"#;
        let parsed: AuthStatusResponse = serde_json::from_str(json).unwrap();
        let user = parsed.user.unwrap();
        assert!(user.has_required_role);
        assert_eq!(user.discord_id, "934443300520345631");
    }

    #[test]
    fn create_log_defaults_level_and_category() {
        let parsed: CreateLogRequest =
            serde_json::from_str(r#"{"message": "bot started"}"#).unwrap();
        assert_eq!(parsed.message, "bot started");
        assert!(parsed.level.is_none());
        assert!(parsed.category.is_none());
    }

    #[test]
    fn update_config_partial_fields() {
        let parsed: UpdateBotConfigRequest =
            serde_json::from_str(r#"{"disabled_commands": ["meme"]}"#).unwrap();
        assert!(parsed.prefix.is_none());
        assert_eq!(parsed.disabled_commands.as_deref(), Some(&["meme".to_string()][..]));
        assert!(parsed.allowed_channels.is_none());
    }

    #[test]
    fn template_embed_round_trips_arbitrary_json() {
        let req = CreateTemplateRequest {
            name: "welcome".to_string(),
            description: None,
            embed: serde_json::json!({
                "title": "Welcome!",
                "color": 5814783,
                "fields": [{"name": "Rules", "value": "#rules"}]
            }),
        };
        let json = serde_json::to_string(&req).unwrap();
        let parsed: CreateTemplateRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.embed["fields"][0]["name"], "Rules");
    }
}
