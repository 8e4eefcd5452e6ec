use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sonic_rs::JsonValueTrait;
use std::net::SocketAddr;

use crate::{error::AppError, state::AppState};

/// Registrations allowed per IP within the window.
const REGISTER_LIMIT: i32 = 3;
/// The registration window in seconds (12 hours).
const REGISTER_WINDOW_SECS: i64 = 43200;

/// Login attempts allowed per IP+email within the window.
const LOGIN_LIMIT: i32 = 5;
/// The login window in seconds (15 minutes).
const LOGIN_WINDOW_SECS: i64 = 900;

/// Extracts the real IP address from the request extensions.
fn extract_real_ip(req: &Request<Body>) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Increments a Redis counter with an expiry, returning the count before
/// the increment. Redis failures degrade to "not limited" rather than
/// rejecting traffic.
async fn bump_counter(state: &AppState, key: &str, window_secs: i64) -> i32 {
    let mut redis = state.redis.clone();

    let count: Option<i32> = redis::cmd("GET")
        .arg(key)
        .query_async(&mut redis)
        .await
        .unwrap_or(None);

    let _: () = redis::cmd("INCR")
        .arg(key)
        .query_async(&mut redis)
        .await
        .unwrap_or(());
    let _: () = redis::cmd("EXPIRE")
        .arg(key)
        .arg(window_secs)
        .query_async(&mut redis)
        .await
        .unwrap_or(());

    count.unwrap_or(0)
}

async fn remaining_minutes(state: &AppState, key: &str) -> i32 {
    let ttl: Option<i32> = redis::cmd("TTL")
        .arg(key)
        .query_async(&mut state.redis.clone())
        .await
        .unwrap_or(None);
    ttl.unwrap_or(0) / 60
}

/// A middleware that rate limits company registration per source IP.
pub async fn rate_limit_register(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = extract_real_ip(&req);
    let key = format!("rate_limit:register:{}", ip);

    if bump_counter(&state, &key, REGISTER_WINDOW_SECS).await >= REGISTER_LIMIT {
        let minutes = remaining_minutes(&state, &key).await;
        return AppError::RateLimitExceeded(format!(
            "Registration limit exceeded. Try again in {} minutes",
            minutes
        ))
        .into_response();
    }

    next.run(req).await
}

/// A middleware that rate limits login attempts per source IP and target
/// email, so one address cannot be brute-forced from a single host.
pub async fn rate_limit_login(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = extract_real_ip(&req);

    // The email lives in the JSON body; buffer it and hand the request
    // back to the router afterwards.
    let (parts, body) = req.into_parts();
    let body_bytes = match axum::body::to_bytes(body, 64 * 1024).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return AppError::Validation("Request body too large".to_string()).into_response();
        }
    };

    let email = sonic_rs::from_slice::<sonic_rs::Value>(&body_bytes)
        .ok()
        .and_then(|json| json.get("email").and_then(|v| v.as_str()).map(|s| s.to_lowercase()))
        .unwrap_or_else(|| "unknown".to_string());

    let key = format!("rate_limit:login:{}:{}", ip, email);

    if bump_counter(&state, &key, LOGIN_WINDOW_SECS).await >= LOGIN_LIMIT {
        let minutes = remaining_minutes(&state, &key).await;
        return AppError::RateLimitExceeded(format!(
            "Too many login attempts. Try again in {} minutes",
            minutes
        ))
        .into_response();
    }

    let req = Request::from_parts(parts, Body::from(body_bytes));
    next.run(req).await
}
