//! API error taxonomy.
//!
//! Three distinct rejection reasons on protected routes: no valid session
//! (401), valid session without the Discord role (403), and valid session
//! without admin membership (403 with its own message). Role-check failures
//! during login are not errors at all; they resolve to a false flag in the
//! auth flow.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared::api::ErrorBody;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized - please log in")]
    Unauthorized,

    #[error("Forbidden - you don't have the required Discord role")]
    MissingRole,

    #[error("Forbidden - admin access required")]
    NotAdmin,

    #[error("{0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,

    #[error("Discord OAuth is not configured")]
    NotConfigured,

    #[error("Database error")]
    Database(#[from] diesel::result::Error),

    #[error("Database connection error")]
    Pool(#[from] diesel::r2d2::PoolError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::MissingRole | ApiError::NotAdmin => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Database(diesel::result::Error::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Pool(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("internal error: {:?}", self);
        }

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Session-store failures propagate as server errors without
            // leaking driver details to the client.
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthenticated_and_unauthorized_are_distinct() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::MissingRole.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotAdmin.status(), StatusCode::FORBIDDEN);
        // Same status for the two forbidden cases, but different messages.
        assert_ne!(
            ApiError::MissingRole.to_string(),
            ApiError::NotAdmin.to_string()
        );
    }

    #[test]
    fn missing_row_maps_to_not_found() {
        let err = ApiError::from(diesel::result::Error::NotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unconfigured_oauth_is_service_unavailable() {
        assert_eq!(
            ApiError::NotConfigured.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
