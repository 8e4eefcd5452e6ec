use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    models::email_settings::EmailSettings,
    models::session::Session,
    services::email_settings as settings_service,
    state::AppState,
};

/// The request payload for saving SMTP settings.
#[derive(Deserialize)]
pub struct SaveSettingsRequest {
    pub smtp_host: String,
    pub smtp_port: i32,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_address: String,
    pub from_name: String,
    #[serde(default = "default_use_tls")]
    pub use_tls: bool,
}

fn default_use_tls() -> bool {
    true
}

fn settings_json(settings: &EmailSettings) -> sonic_rs::Value {
    sonic_rs::json!({
        "smtp_host": settings.smtp_host,
        "smtp_port": settings.smtp_port,
        "smtp_username": settings.smtp_username,
        // The stored password never leaves the server.
        "smtp_password": "********",
        "from_address": settings.from_address,
        "from_name": settings.from_name,
        "use_tls": settings.use_tls,
        "updated_at": settings.updated_at.to_rfc3339(),
    })
}

/// Fetches the tenant's SMTP settings (admin only), password masked.
#[axum::debug_handler]
pub async fn get(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Response> {
    let settings = settings_service::get(&state, &session).await?;

    let body = match settings {
        Some(ref settings) => sonic_rs::to_string(&settings_json(settings)),
        None => sonic_rs::to_string(&sonic_rs::json!({ "configured": false })),
    }
    .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((StatusCode::OK, body).into_response())
}

/// Creates or replaces the tenant's SMTP settings (admin only).
#[axum::debug_handler]
pub async fn save(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<SaveSettingsRequest>,
) -> Result<Response> {
    let settings = settings_service::save(
        &state,
        &session,
        &settings_service::SettingsInput {
            smtp_host: &req.smtp_host,
            smtp_port: req.smtp_port,
            smtp_username: &req.smtp_username,
            smtp_password: &req.smtp_password,
            from_address: &req.from_address,
            from_name: &req.from_name,
            use_tls: req.use_tls,
        },
    )
    .await?;

    let body = sonic_rs::to_string(&settings_json(&settings))
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok((StatusCode::OK, body).into_response())
}
