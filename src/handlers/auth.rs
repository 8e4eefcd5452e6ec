use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use tower_cookies::{Cookie, Cookies};
use tower_cookies::cookie::time::Duration;
use uuid::Uuid;
use serde::{Deserialize, Serialize};
use chrono::Utc;

use crate::{
    error::{AppError, Result},
    middleware_layer::tenant::ResolvedTenant,
    models::{employee::Employee, session::Session, tenant::Tenant},
    repositories::{employee as employee_repo, tenant as tenant_repo},
    services::auth as auth_service,
    state::AppState,
    validation::auth::*,
};

use redis::AsyncCommands;

/// The request payload for company registration.
#[derive(Deserialize, Debug)]
pub struct RegisterRequest {
    pub company_name: String,
    pub subdomain: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// The request payload for login. `company` is only consulted when the
/// request arrives on the root domain (local development, e2e tests);
/// on a tenant subdomain the resolved hostname wins.
#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub company: Option<String>,
}

/// The request payload for starting a password reset.
#[derive(Deserialize, Debug)]
pub struct ForgotPasswordRequest {
    pub email: String,
    pub company: Option<String>,
}

/// The request payload for completing a password reset.
#[derive(Deserialize, Debug)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// The response payload for authentication-related requests.
#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
}

/// What a password-reset token resolves to in Redis.
#[derive(Serialize, Deserialize)]
struct ResetTokenPayload {
    tenant_id: Uuid,
    employee_id: Uuid,
}

/// Creates a secure cookie with the given name, value, and max age.
fn create_secure_cookie(name: String, value: String, max_age_days: i64) -> Cookie<'static> {
    let mut cookie = Cookie::new(name.clone(), value);

    let is_production = std::env::var("APP_ENV")
        .unwrap_or_else(|_| "development".to_string()) == "production";

    // The CSRF cookie must stay readable by the SPA for the double-submit
    // header.
    if name != "csrf_token" {
        cookie.set_http_only(true);
    }

    if is_production {
        cookie.set_secure(true);
    }

    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_max_age(Duration::seconds(max_age_days * 86400));
    cookie.set_path("/");

    cookie
}

/// Stores a fresh session and CSRF token in Redis and sets both cookies.
async fn establish_session(
    state: &mut AppState,
    cookies: &Cookies,
    employee: &Employee,
    tenant: &Tenant,
) -> Result<()> {
    let session_id = Uuid::new_v4();

    let session = Session {
        user_id: employee.id,
        tenant_id: tenant.id,
        tenant_domain: tenant.subdomain.clone(),
        role: employee.role,
        created_at: Utc::now(),
        expires_at: Utc::now() + chrono::Duration::days(state.config.session_duration_days),
    };

    let session_json = sonic_rs::to_string(&session)
        .map_err(|e| AppError::Internal(format!("Session serialization failed: {}", e)))?;

    let expiration_seconds = (state.config.session_duration_days * 86400) as u64;
    let _: () = state
        .redis
        .set_ex(format!("session:{}", session_id), &session_json, expiration_seconds)
        .await?;

    cookies.add(create_secure_cookie(
        "session_id".to_string(),
        session_id.to_string(),
        state.config.session_duration_days,
    ));

    let csrf_token = crate::crypto::csrf::generate_csrf_token()?;
    let _: () = state
        .redis
        .set_ex(format!("csrf:{}", csrf_token), "valid", 86400)
        .await?;
    cookies.add(create_secure_cookie("csrf_token".to_string(), csrf_token, 1));

    tracing::info!("✅ Session established for employee {}", employee.id);
    Ok(())
}

/// Handles company registration: creates the tenant, its admin account,
/// and logs the admin straight in.
#[axum::debug_handler]
pub async fn register(
    State(mut state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response> {
    tracing::info!("📝 Registration attempt for subdomain: {}", payload.subdomain);
    validate_name(&payload.company_name, "Company name")?;
    validate_subdomain(&payload.subdomain)?;
    validate_name(&payload.first_name, "First name")?;
    validate_name(&payload.last_name, "Last name")?;
    validate_email(&payload.email)?;
    validate_password(&payload.password)?;

    let (tenant, admin) = auth_service::register_company(
        &state,
        payload.company_name.trim(),
        &payload.subdomain,
        payload.first_name.trim(),
        payload.last_name.trim(),
        &payload.email,
        &payload.password,
    )
    .await?;

    establish_session(&mut state, &cookies, &admin, &tenant).await?;

    let body = sonic_rs::to_string(&sonic_rs::json!({
        "message": "Registration successful. Welcome!",
        "tenant": {
            "id": tenant.id.to_string(),
            "name": tenant.name,
            "subdomain": tenant.subdomain,
        },
    }))
    .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((StatusCode::CREATED, body).into_response())
}

/// Handles employee login, scoped to the tenant the request arrived on.
#[axum::debug_handler]
pub async fn login(
    State(mut state): State<AppState>,
    resolved: Option<Extension<ResolvedTenant>>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    validate_email(&payload.email)?;

    let subdomain = match (&resolved, &payload.company) {
        (Some(Extension(ResolvedTenant(subdomain))), _) => subdomain.clone(),
        (None, Some(company)) => company.to_lowercase(),
        (None, None) => {
            return Err(AppError::Validation(
                "Log in from your company subdomain, or provide 'company'".to_string(),
            ));
        }
    };

    let tenant = tenant_repo::find_by_subdomain(&state.db, &subdomain)
        .await?
        .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

    let employee = auth_service::authenticate(&state, &tenant, &payload.email, payload.password.as_str()).await?;

    establish_session(&mut state, &cookies, &employee, &tenant).await?;

    let body = sonic_rs::to_string(&sonic_rs::json!({
        "message": "Login successful",
        "user": {
            "id": employee.id.to_string(),
            "first_name": employee.first_name,
            "last_name": employee.last_name,
            "role": employee.role,
        },
        "tenant": tenant.subdomain,
    }))
    .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((StatusCode::OK, body).into_response())
}

/// Handles logout: destroys the Redis session and clears both cookies.
#[axum::debug_handler]
pub async fn logout(
    State(mut state): State<AppState>,
    cookies: Cookies,
) -> Result<Response> {
    if let Some(cookie) = cookies.get("session_id") {
        let _: () = state
            .redis
            .del(format!("session:{}", cookie.value()))
            .await
            .unwrap_or(());
    }
    if let Some(cookie) = cookies.get("csrf_token") {
        let _: () = state
            .redis
            .del(format!("csrf:{}", cookie.value()))
            .await
            .unwrap_or(());
    }

    let mut session_cookie = Cookie::new("session_id", "");
    session_cookie.set_path("/");
    cookies.remove(session_cookie);
    let mut csrf_cookie = Cookie::new("csrf_token", "");
    csrf_cookie.set_path("/");
    cookies.remove(csrf_cookie);

    Ok((
        StatusCode::OK,
        Json(AuthResponse {
            success: true,
            message: "Logged out".to_string(),
        }),
    )
        .into_response())
}

/// Returns the acting session, for the client shell.
#[axum::debug_handler]
pub async fn me(
    Extension(session): Extension<Session>,
    Extension(tenant): Extension<Tenant>,
) -> Result<Response> {
    let body = sonic_rs::to_string(&sonic_rs::json!({
        "user_id": session.user_id.to_string(),
        "role": session.role,
        "tenant": {
            "id": tenant.id.to_string(),
            "name": tenant.name,
            "subdomain": tenant.subdomain,
        },
        "expires_at": session.expires_at.to_rfc3339(),
    }))
    .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((StatusCode::OK, body).into_response())
}

/// Starts a password reset. Always answers 200 so the endpoint cannot be
/// used to probe which emails exist.
#[axum::debug_handler]
pub async fn forgot_password(
    State(mut state): State<AppState>,
    resolved: Option<Extension<ResolvedTenant>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Response> {
    let subdomain = match (&resolved, &payload.company) {
        (Some(Extension(ResolvedTenant(subdomain))), _) => Some(subdomain.clone()),
        (None, Some(company)) => Some(company.to_lowercase()),
        (None, None) => None,
    };

    if let Some(subdomain) = subdomain {
        if let Some(tenant) = tenant_repo::find_by_subdomain(&state.db, &subdomain).await? {
            if let Some(employee) =
                employee_repo::find_by_email(&state.db, tenant.id, &payload.email).await?
            {
                let token = crate::crypto::csrf::generate_reset_token()?;
                let token_payload = sonic_rs::to_string(&ResetTokenPayload {
                    tenant_id: tenant.id,
                    employee_id: employee.id,
                })
                .map_err(|e| AppError::Internal(e.to_string()))?;

                let _: () = state
                    .redis
                    .set_ex(format!("password_reset:{}", token), token_payload, 3600)
                    .await?;

                // Delivery happens in the tenant's configured mailer,
                // outside this service.
                tracing::info!("📧 Password reset token issued for employee {}", employee.id);
            }
        }
    }

    Ok((
        StatusCode::OK,
        Json(AuthResponse {
            success: true,
            message: "If the account exists, a reset email has been sent".to_string(),
        }),
    )
        .into_response())
}

/// Completes a password reset by consuming a token.
#[axum::debug_handler]
pub async fn reset_password(
    State(mut state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Response> {
    validate_password(&payload.new_password)?;

    let key = format!("password_reset:{}", payload.token);
    let token_json: Option<String> = state.redis.get(&key).await?;
    let token_json = token_json
        .ok_or_else(|| AppError::Authentication("Invalid or expired reset token".to_string()))?;

    let token: ResetTokenPayload = sonic_rs::from_str(&token_json)
        .map_err(|e| AppError::Internal(format!("Corrupt reset token payload: {}", e)))?;

    let password_hash = auth_service::hash_password(&payload.new_password)?;
    employee_repo::update_password(&state.db, token.tenant_id, token.employee_id, &password_hash)
        .await?;

    let _: () = state.redis.del(&key).await.unwrap_or(());

    Ok((
        StatusCode::OK,
        Json(AuthResponse {
            success: true,
            message: "Password updated. You can now log in.".to_string(),
        }),
    )
        .into_response())
}
