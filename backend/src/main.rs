mod db;
mod discord;
mod error;
mod handlers;
mod models;
mod rate_limit;
mod schema;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use clap::Parser;
use oauth2::{basic::BasicClient, AuthUrl, ClientId, ClientSecret, RedirectUrl, TokenUrl};
use sha2::{Digest, Sha512};
use std::{env, net::SocketAddr, num::NonZeroU32, sync::Arc};
use tower_cookies::{CookieManagerLayer, Key};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shared::endpoints;

use crate::db::DbPool;
use crate::discord::DiscordApi;
use crate::rate_limit::IpRateLimiter;

/// Discord id of the seeded dev-mode user.
pub const DEV_USER_DISCORD_ID: &str = "000000000000000000";

const DISCORD_AUTH_URL: &str = "https://discord.com/api/oauth2/authorize";
const DISCORD_TOKEN_URL: &str = "https://discord.com/api/oauth2/token";
const DEFAULT_CALLBACK_URL: &str = "http://localhost:5000/api/auth/discord/callback";

#[derive(Parser, Debug, Clone)]
#[command(name = "guildboard-backend")]
#[command(about = "Guildboard dashboard backend server")]
struct Args {
    /// Enable development mode (bypasses OAuth, creates test user)
    #[arg(long)]
    dev_mode: bool,

    /// Path to the built SPA bundle to serve
    #[arg(long, default_value = "client/dist")]
    frontend_dist: String,
}

pub struct AppState {
    pub dev_mode: bool,
    pub db_pool: DbPool,
    pub cookie_key: Key,
    pub oauth_client: Option<BasicClient>,
    pub discord: DiscordApi,
    pub bot_api_key: Option<String>,
    pub default_admins: Vec<String>,
    pub default_auth_bypass: Vec<String>,
    pub rate_limiter: IpRateLimiter,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if args.dev_mode {
        tracing::warn!("DEV MODE ENABLED - OAuth is bypassed, test user will be used");
    }

    dotenvy::dotenv().ok();

    let pool = db::create_pool()?;
    let applied = db::run_migrations(&pool)?;
    for migration in &applied {
        tracing::info!("applied migration {}", migration);
    }

    let client_id = env_opt("DISCORD_CLIENT_ID");
    let client_secret = env_opt("DISCORD_CLIENT_SECRET");
    let callback_url =
        env_opt("DISCORD_CALLBACK_URL").unwrap_or_else(|| DEFAULT_CALLBACK_URL.to_string());
    let guild_id = env_opt("DISCORD_GUILD_ID");
    let required_role_id = env_opt("REQUIRED_ROLE_ID");
    let bot_token = env_opt("DISCORD_TOKEN");
    let bot_api_key = env_opt("BOT_API_KEY");
    let session_secret = env_opt("SESSION_SECRET");

    tracing::info!("auth configuration:");
    tracing::info!("- DISCORD_CLIENT_ID: {}", set_or_missing(&client_id));
    tracing::info!("- DISCORD_CLIENT_SECRET: {}", set_or_missing(&client_secret));
    tracing::info!("- DISCORD_GUILD_ID: {}", set_or_missing(&guild_id));
    tracing::info!("- REQUIRED_ROLE_ID: {}", set_or_missing(&required_role_id));
    tracing::info!("- DISCORD_TOKEN (bot): {}", set_or_missing(&bot_token));
    tracing::info!("- BOT_API_KEY: {}", set_or_missing(&bot_api_key));
    tracing::info!("- DISCORD_CALLBACK_URL: {}", callback_url);

    let session_secret = match session_secret {
        Some(secret) => secret,
        None => {
            tracing::warn!("SESSION_SECRET not set, using insecure default");
            "guildboard-session-secret-change-in-production".to_string()
        }
    };
    let cookie_key = derive_cookie_key(&session_secret);

    // Missing client credentials disable the whole OAuth flow; the status
    // endpoint reports configured=false and login returns 503.
    let oauth_client = match (client_id, client_secret) {
        (Some(id), Some(secret)) => Some(
            BasicClient::new(
                ClientId::new(id),
                Some(ClientSecret::new(secret)),
                AuthUrl::new(DISCORD_AUTH_URL.to_string())?,
                Some(TokenUrl::new(DISCORD_TOKEN_URL.to_string())?),
            )
            .set_redirect_uri(RedirectUrl::new(callback_url)?),
        ),
        _ => {
            tracing::warn!(
                "Discord OAuth not configured; set DISCORD_CLIENT_ID and DISCORD_CLIENT_SECRET"
            );
            None
        }
    };

    let discord = DiscordApi::new(bot_token, guild_id, required_role_id);

    if args.dev_mode {
        seed_dev_user(&pool)?;
    }

    let app_state = Arc::new(AppState {
        dev_mode: args.dev_mode,
        db_pool: pool,
        cookie_key,
        oauth_client,
        discord,
        bot_api_key,
        default_admins: parse_id_list(&env::var("DASHBOARD_ADMIN_IDS").unwrap_or_default()),
        default_auth_bypass: parse_id_list(&env::var("AUTH_BYPASS_IDS").unwrap_or_default()),
        rate_limiter: rate_limit::build_limiter(
            NonZeroU32::new(rate_limit::REQUESTS_PER_MINUTE).expect("nonzero rate limit"),
        ),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .route("/", get(|| async { "Guildboard Backend" }))
        // Auth
        .route(endpoints::AUTH_LOGIN, get(handlers::auth::login))
        .route(endpoints::AUTH_CALLBACK, get(handlers::auth::callback))
        .route(endpoints::AUTH_STATUS, get(handlers::auth::status))
        .route(endpoints::AUTH_LOGOUT, post(handlers::auth::logout))
        .route(endpoints::AUTH_DEV_LOGIN, get(handlers::auth::dev_login))
        // Logs
        .route(
            endpoints::LOGS,
            get(handlers::logs::list).post(handlers::logs::create),
        )
        .route(endpoints::LOGS_STATS, get(handlers::logs::stats))
        .route(endpoints::LOGS_CATEGORIES, get(handlers::logs::category_stats))
        // Warns
        .route(
            endpoints::WARNS,
            get(handlers::warns::list).post(handlers::warns::create),
        )
        // Bot service endpoints
        .route(endpoints::BOT_HEARTBEAT, post(handlers::bot::heartbeat))
        .route(endpoints::BOT_STATUS, get(handlers::bot::status))
        .route(
            endpoints::BOT_CONFIG,
            get(handlers::bot::get_config).put(handlers::bot::update_config),
        )
        // Embed templates
        .route(
            endpoints::TEMPLATES,
            get(handlers::templates::list).post(handlers::templates::create),
        )
        .route(
            endpoints::TEMPLATE_BY_ID,
            get(handlers::templates::get)
                .put(handlers::templates::update)
                .delete(handlers::templates::delete),
        )
        // Rosters
        .route(
            endpoints::ADMINS,
            get(handlers::rosters::list_admins).post(handlers::rosters::add_admin),
        )
        .route(endpoints::ADMIN_BY_ID, delete(handlers::rosters::remove_admin))
        .route(
            endpoints::AUTH_BYPASS,
            get(handlers::rosters::list_bypass).post(handlers::rosters::add_bypass),
        )
        .route(
            endpoints::AUTH_BYPASS_BY_ID,
            delete(handlers::rosters::remove_bypass),
        )
        .with_state(app_state.clone());

    if std::path::Path::new(&args.frontend_dist).exists() {
        tracing::info!("serving frontend from: {}", args.frontend_dist);
        app = app.nest_service("/app", ServeDir::new(&args.frontend_dist));
    } else {
        tracing::warn!("frontend dist not found at: {}", args.frontend_dist);
    }

    let app = app
        .layer(CookieManagerLayer::new())
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            rate_limit::ip_rate_limit,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "5000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Create the dev-mode test user if it doesn't exist yet.
fn seed_dev_user(pool: &DbPool) -> anyhow::Result<()> {
    use diesel::prelude::*;
    use models::NewUser;
    use schema::users::dsl::*;

    let mut conn = pool.get()?;
    let existing = users
        .filter(discord_id.eq(DEV_USER_DISCORD_ID))
        .first::<models::User>(&mut conn)
        .optional()?;

    if existing.is_none() {
        diesel::insert_into(users)
            .values(NewUser {
                discord_id: DEV_USER_DISCORD_ID.to_string(),
                username: "dev-user".to_string(),
                discriminator: None,
                avatar: None,
                email: Some("dev@localhost".to_string()),
                access_token: None,
                refresh_token: None,
                has_required_role: true,
            })
            .execute(&mut conn)?;

        tracing::info!("created dev test user");
    }

    Ok(())
}

/// Signed-cookie key from the session secret. Sha512 gives the 64 bytes
/// `Key::derive_from` wants regardless of the secret's length.
fn derive_cookie_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::derive_from(&digest)
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn set_or_missing(value: &Option<String>) -> &'static str {
    if value.is_some() {
        "set"
    } else {
        "MISSING"
    }
}

fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_list_parsing_handles_whitespace_and_empties() {
        assert_eq!(
            parse_id_list("123, 456 ,,789"),
            vec!["123", "456", "789"]
        );
        assert!(parse_id_list("").is_empty());
        assert!(parse_id_list(" , ").is_empty());
    }

    #[test]
    fn cookie_key_is_deterministic_per_secret() {
        let a = derive_cookie_key("secret-one");
        let b = derive_cookie_key("secret-one");
        let c = derive_cookie_key("secret-two");
        assert_eq!(a.master(), b.master());
        assert_ne!(a.master(), c.master());
    }
}
