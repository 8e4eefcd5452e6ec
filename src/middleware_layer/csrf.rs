use axum::{
    body::Body,
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use redis::AsyncCommands;
use tower_cookies::Cookies;

use crate::{error::AppError, state::AppState};

/// A middleware that verifies the CSRF double-submit token on mutating
/// requests: the `csrf_token` cookie must match the `x-csrf-token` header
/// and still be present in Redis.
pub async fn verify_csrf(
    State(mut state): State<AppState>,
    cookies: Cookies,
    req: Request<Body>,
    next: Next,
) -> Response {
    if matches!(*req.method(), Method::GET | Method::HEAD | Method::OPTIONS) {
        return next.run(req).await;
    }

    let Some(cookie_token) = cookies.get("csrf_token").map(|c| c.value().to_string()) else {
        tracing::warn!("❌ CSRF: missing csrf_token cookie");
        return AppError::Authentication("Missing CSRF token cookie".to_string()).into_response();
    };

    let header_token = req
        .headers()
        .get("x-csrf-token")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let Some(header_token) = header_token else {
        tracing::warn!("❌ CSRF: missing x-csrf-token header");
        return AppError::Authentication("Missing CSRF token header".to_string()).into_response();
    };

    if cookie_token != header_token {
        tracing::warn!("❌ CSRF: token mismatch");
        return AppError::Authentication("CSRF token mismatch".to_string()).into_response();
    }

    let known: Result<Option<String>, _> = state
        .redis
        .get(format!("csrf:{}", cookie_token))
        .await;

    match known {
        Ok(Some(_)) => next.run(req).await,
        Ok(None) => {
            tracing::warn!("❌ CSRF: token expired or unknown");
            AppError::Authentication("CSRF token expired or invalid".to_string()).into_response()
        }
        Err(e) => {
            tracing::error!("❌ CSRF: Redis error: {}", e);
            AppError::Authentication("CSRF validation error".to_string()).into_response()
        }
    }
}
