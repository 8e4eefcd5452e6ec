use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    middleware_layer::tenant::ResolvedTenant,
    models::session::Session,
    repositories::tenant as tenant_repo,
    state::AppState,
};

use redis::AsyncCommands;

/// Extracts the session token from the request cookies.
fn extract_session_token(cookies: &Cookies) -> Option<Uuid> {
    cookies
        .get("session_id")
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

/// A middleware that requires a valid session scoped to the resolved
/// tenant.
///
/// Rejections are uniformly 403 so a caller cannot distinguish "no such
/// tenant" from "session belongs to another tenant".
pub async fn require_auth(
    State(mut state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let session_id = extract_session_token(&cookies).ok_or_else(|| {
        tracing::warn!("❌ No session_id cookie found");
        StatusCode::FORBIDDEN
    })?;

    let session_json: String = state
        .redis
        .get(format!("session:{}", session_id))
        .await
        .map_err(|e| {
            tracing::warn!("❌ Redis error or session not found: {}", e);
            StatusCode::FORBIDDEN
        })?;

    let session: Session = sonic_rs::from_str(&session_json).map_err(|e| {
        tracing::warn!("❌ Invalid session JSON: {}", e);
        StatusCode::FORBIDDEN
    })?;

    if chrono::Utc::now() > session.expires_at {
        tracing::warn!("❌ Session expired for user: {}", session.user_id);

        let _: () = state
            .redis
            .del(format!("session:{}", session_id))
            .await
            .unwrap_or(());

        return Err(StatusCode::FORBIDDEN);
    }

    // The subdomain the request arrived on must agree with the session's
    // tenant. Root-context requests (local development) fall back to the
    // session's own tenant domain.
    let subdomain = request
        .extensions()
        .get::<ResolvedTenant>()
        .map(|t| t.0.clone())
        .unwrap_or_else(|| session.tenant_domain.clone());

    let tenant = tenant_repo::find_by_subdomain(&state.db, &subdomain)
        .await
        .map_err(|e| {
            tracing::error!("❌ Tenant lookup failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or_else(|| {
            tracing::warn!("❌ No active tenant for subdomain: {}", subdomain);
            StatusCode::FORBIDDEN
        })?;

    if tenant.id != session.tenant_id {
        tracing::warn!(
            "❌ Session tenant {} does not match request tenant {}",
            session.tenant_id,
            tenant.id
        );
        return Err(StatusCode::FORBIDDEN);
    }

    tracing::debug!("✅ User authenticated: {} ({})", session.user_id, tenant.subdomain);

    request.extensions_mut().insert(session);
    request.extensions_mut().insert(tenant);

    Ok(next.run(request).await)
}
