//! Endpoint paths and wire constants shared between backend, bot, and SPA.

/// Redirects to the Discord authorize URL.
pub const AUTH_LOGIN: &str = "/api/auth/discord";
/// OAuth callback target registered with Discord.
pub const AUTH_CALLBACK: &str = "/api/auth/discord/callback";
/// Reports OAuth configuration and the caller's session state.
pub const AUTH_STATUS: &str = "/api/auth/status";
/// Destroys the caller's session.
pub const AUTH_LOGOUT: &str = "/api/auth/logout";
/// Dev-mode only login that bypasses OAuth.
pub const AUTH_DEV_LOGIN: &str = "/api/auth/dev-login";

pub const LOGS: &str = "/api/logs";
pub const LOGS_STATS: &str = "/api/logs/stats";
pub const LOGS_CATEGORIES: &str = "/api/logs/categories";

pub const WARNS: &str = "/api/warns";

pub const BOT_HEARTBEAT: &str = "/api/bot/heartbeat";
pub const BOT_STATUS: &str = "/api/bot/status";
pub const BOT_CONFIG: &str = "/api/bot/config";

pub const TEMPLATES: &str = "/api/templates";
pub const TEMPLATE_BY_ID: &str = "/api/templates/:id";

pub const ADMINS: &str = "/api/admins";
pub const ADMIN_BY_ID: &str = "/api/admins/:discord_id";

pub const AUTH_BYPASS: &str = "/api/auth-bypass";
pub const AUTH_BYPASS_BY_ID: &str = "/api/auth-bypass/:discord_id";

/// Header carrying the bot's shared-secret credential.
pub const BOT_API_KEY_HEADER: &str = "x-bot-api-key";

/// Name of the signed session cookie.
pub const SESSION_COOKIE_NAME: &str = "gb_session";

/// Client route the callback redirects to on auth failures, with a
/// `reason` query parameter (`auth_failed` or `no_role`).
pub const AUTH_ERROR_ROUTE: &str = "/auth/error";
