use axum::{
    body::Body,
    extract::State,
    http::{Request, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use http::header::{HeaderValue, HOST};
use tower_cookies::Cookies;

use crate::{
    state::AppState,
    tenancy::resolver::{self, Action, ResolverConfig},
};

/// The forwarded header downstream handlers read the tenant subdomain from.
pub const TENANT_HEADER: &str = "x-tenant-domain";

/// The tenant subdomain resolved from the request hostname. Inserted as a
/// request extension by [`resolve_tenant`]; consumed by the auth middleware
/// to enforce session/tenant agreement.
#[derive(Debug, Clone)]
pub struct ResolvedTenant(pub String);

/// A middleware that classifies each request by hostname and applies the
/// resolver's decision: redirect, rewrite into the tenant namespace, or
/// pass through.
///
/// The resolver itself is pure; this layer only inspects cookie *presence*
/// and never validates the session (that is `require_auth`'s job).
pub async fn resolve_tenant(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let host = request
        .headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let path = request.uri().path().to_string();
    let session_present = cookies.get("session_id").is_some();

    let config = ResolverConfig::from(&state.config);

    match resolver::resolve(&host, &path, session_present, &config) {
        Action::PassThrough => next.run(request).await,

        Action::Redirect { location } => {
            tracing::debug!("➡️ Redirecting {}{} to {}", host, path, location);
            Redirect::temporary(&location).into_response()
        }

        Action::Rewrite { path: new_path, subdomain } => {
            if new_path != path {
                tracing::debug!("🔀 Rewriting {} to {} for tenant {}", path, new_path, subdomain);
                if let Some(uri) = rebuild_uri(request.uri(), &new_path) {
                    *request.uri_mut() = uri;
                }
            }

            if let Ok(value) = HeaderValue::from_str(&subdomain) {
                request.headers_mut().insert(TENANT_HEADER, value);
            }
            request.extensions_mut().insert(ResolvedTenant(subdomain));

            next.run(request).await
        }
    }
}

/// Rebuilds a request URI with a new path, keeping the query string.
fn rebuild_uri(uri: &Uri, new_path: &str) -> Option<Uri> {
    let path_and_query = match uri.query() {
        Some(query) => format!("{}?{}", new_path, query),
        None => new_path.to_string(),
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query.parse().ok()?);
    Uri::from_parts(parts).ok()
}
