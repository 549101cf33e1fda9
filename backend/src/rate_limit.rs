//! Per-IP request throttling.
//!
//! 100 requests per minute per client IP. Bot-facing routes presenting a
//! valid service credential skip the limiter so a chatty bot cannot starve
//! itself of heartbeats.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter};
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::warn;

use shared::api::ErrorBody;
use shared::endpoints;

use crate::{handlers::guards, AppState};

pub const REQUESTS_PER_MINUTE: u32 = 100;

pub type IpRateLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

pub fn build_limiter(per_minute: NonZeroU32) -> IpRateLimiter {
    RateLimiter::keyed(Quota::per_minute(per_minute))
}

pub async fn ip_rate_limit(
    State(app_state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    let bot_bypass = is_bot_route(req.method(), req.uri().path())
        && guards::require_bot_key(&app_state, req.headers()).is_ok();

    if !bot_bypass && app_state.rate_limiter.check_key(&addr.ip()).is_err() {
        warn!("rate limit exceeded for {}", addr.ip());
        let mut resp = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorBody {
                message: format!(
                    "You have exceeded the rate limit of {} requests per minute. \
                     Please wait before making more requests.",
                    REQUESTS_PER_MINUTE
                ),
            }),
        )
            .into_response();
        resp.headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from_static("60"));
        return resp;
    }

    next.run(req).await
}

/// Routes the bot process calls on its own schedule.
fn is_bot_route(method: &Method, path: &str) -> bool {
    match *method {
        Method::POST => {
            path == endpoints::LOGS || path == endpoints::WARNS || path == endpoints::BOT_HEARTBEAT
        }
        Method::GET => path == endpoints::BOT_CONFIG,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bot_routes_cover_writes_and_config_read() {
        assert!(is_bot_route(&Method::POST, "/api/logs"));
        assert!(is_bot_route(&Method::POST, "/api/warns"));
        assert!(is_bot_route(&Method::POST, "/api/bot/heartbeat"));
        assert!(is_bot_route(&Method::GET, "/api/bot/config"));

        assert!(!is_bot_route(&Method::GET, "/api/logs"));
        assert!(!is_bot_route(&Method::PUT, "/api/bot/config"));
        assert!(!is_bot_route(&Method::POST, "/api/templates"));
    }

    #[test]
    fn limiter_blocks_after_quota_per_key() {
        let limiter = build_limiter(NonZeroU32::new(3).unwrap());
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();

        for _ in 0..3 {
            assert!(limiter.check_key(&a).is_ok());
        }
        assert!(limiter.check_key(&a).is_err());
        // Quota is tracked per client address.
        assert!(limiter.check_key(&b).is_ok());
    }
}
