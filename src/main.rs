use jemallocator::Jemalloc;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use axum::{
    Router,
    routing::{get, patch, post},
    middleware::from_fn_with_state,
};

use http::{HeaderName, HeaderValue, Method, header};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_cookies::CookieManagerLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::{
    trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, DefaultOnFailure},
    cors::{AllowOrigin, CorsLayer},
};

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod state;
mod db;

mod tenancy {
    pub mod resolver;
}

mod crypto {
    pub mod csrf;
}

mod models {
    pub mod tenant;
    pub mod session;
    pub mod employee;
    pub mod leave;
    pub mod recruitment;
    pub mod email_settings;
}

mod repositories {
    pub mod tenant;
    pub mod employee;
    pub mod leave;
    pub mod recruitment;
    pub mod email_settings;
}

mod services {
    pub mod auth;
    pub mod leave;
    pub mod employees;
    pub mod recruitment;
    pub mod email_settings;
}

mod handlers {
    pub mod auth;
    pub mod dashboard;
    pub mod leave;
    pub mod employees;
    pub mod recruitment;
    pub mod email_settings;
}

mod middleware_layer {
    pub mod tenant;
    pub mod auth;
    pub mod csrf;
    pub mod rate_limit;
}

mod validation {
    pub mod auth;
    pub mod leave;
}

use config::Config;
use state::AppState;

/// Builds a CORS layer that accepts the root domain and any of its tenant
/// subdomains, plus the local SPA dev server.
fn cors_layer(root_domain: &str) -> CorsLayer {
    let root_domain = root_domain.to_string();

    let origin_ok = move |origin: &HeaderValue| {
        let Ok(origin) = origin.to_str() else {
            return false;
        };
        let Some(host) = origin
            .strip_prefix("https://")
            .or_else(|| origin.strip_prefix("http://"))
        else {
            return false;
        };
        let host = host.rsplit_once(':').map(|(h, _)| h).unwrap_or(host);

        host == root_domain
            || host.ends_with(&format!(".{}", root_domain))
            || host == "localhost"
            || host == "127.0.0.1"
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _| origin_ok(origin)))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::COOKIE,
            HeaderName::from_static("x-csrf-token"),
        ])
        .allow_credentials(true)
        .expose_headers([HeaderName::from_static("x-csrf-token")])
        .max_age(Duration::from_secs(86400))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded (root domain: {})", config.root_domain);

    let state = AppState::new(&config).await?;
    tracing::info!("✅ AppState initialized");

    let protected_governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(50)
            .burst_size(200)
            .use_headers()
            .finish()
            .unwrap(),
    );

    let register_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::rate_limit::rate_limit_register,
        ))
        .with_state(state.clone());

    let login_routes = Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::rate_limit::rate_limit_login,
        ))
        .with_state(state.clone());

    // Public surface: the root-domain job board and password recovery.
    let public_routes = Router::new()
        .route("/api/jobs", get(handlers::recruitment::list_public))
        .route("/api/jobs/{posting_id}", get(handlers::recruitment::get_public))
        .route("/api/jobs/{posting_id}/apply", post(handlers::recruitment::apply))
        .route(
            "/api/auth/forgot-password",
            post(handlers::auth::forgot_password),
        )
        .route(
            "/api/auth/reset-password",
            post(handlers::auth::reset_password),
        )
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/{subdomain}/dashboard", get(handlers::dashboard::summary))
        .route(
            "/api/employees",
            get(handlers::employees::list).post(handlers::employees::create),
        )
        .route(
            "/api/employees/{employee_id}",
            get(handlers::employees::get)
                .put(handlers::employees::update)
                .delete(handlers::employees::deactivate),
        )
        .route(
            "/api/leave-requests",
            get(handlers::leave::list_requests).post(handlers::leave::create_request),
        )
        .route(
            "/api/leave-requests/{request_id}/status",
            patch(handlers::leave::update_status),
        )
        .route(
            "/api/leave-requests/{request_id}/cancel",
            patch(handlers::leave::cancel),
        )
        .route(
            "/api/leave-types",
            get(handlers::leave::list_types).post(handlers::leave::create_type),
        )
        .route("/api/leave-balances", get(handlers::leave::list_balances))
        .route(
            "/api/job-postings",
            get(handlers::recruitment::list_postings).post(handlers::recruitment::create_posting),
        )
        .route(
            "/api/job-postings/{posting_id}",
            get(handlers::recruitment::get_posting).put(handlers::recruitment::update_posting),
        )
        .route(
            "/api/job-postings/{posting_id}/candidates",
            get(handlers::recruitment::list_candidates),
        )
        .route(
            "/api/candidates/{candidate_id}/stage",
            patch(handlers::recruitment::update_candidate_stage),
        )
        .route(
            "/api/settings/email",
            get(handlers::email_settings::get).put(handlers::email_settings::save),
        )
        .layer(tower_governor::GovernorLayer::new(
            protected_governor_conf.clone(),
        ))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::csrf::verify_csrf,
        ))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::auth::require_auth,
        ))
        .with_state(state.clone());

    let app = Router::new()
        .merge(register_routes)
        .merge(login_routes)
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true))
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware_layer::tenant::resolve_tenant,
        ))
        .layer(CookieManagerLayer::new())
        .layer(cors_layer(&config.root_domain));

    // Postings past their closing date are closed in the background, so
    // the public board never advertises stale openings for long.
    let maintenance_state = state.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            match repositories::recruitment::close_expired_postings(&maintenance_state.db).await {
                Ok(0) => {}
                Ok(closed) => {
                    tracing::info!("🧹 Closed {} expired job posting(s)", closed);
                }
                Err(e) => {
                    tracing::error!("❌ Posting maintenance failed: {}", e);
                }
            }
        }
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
