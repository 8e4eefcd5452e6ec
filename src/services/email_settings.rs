use crate::{
    error::{AppError, Result},
    models::{email_settings::EmailSettings, session::{Role, Session}},
    repositories::email_settings as settings_repo,
    state::AppState,
    validation,
};

pub use settings_repo::SettingsInput;

/// Fetches the tenant's SMTP configuration. Admin only.
pub async fn get(state: &AppState, session: &Session) -> Result<Option<EmailSettings>> {
    if session.role != Role::Admin {
        return Err(AppError::Unauthorized);
    }
    settings_repo::get(&state.db, session.tenant_id).await
}

/// Creates or replaces the tenant's SMTP configuration. Admin only.
pub async fn save(state: &AppState, session: &Session, input: &SettingsInput<'_>) -> Result<EmailSettings> {
    if session.role != Role::Admin {
        return Err(AppError::Unauthorized);
    }

    validation::auth::validate_name(input.smtp_host, "SMTP host")?;
    validation::auth::validate_email(input.from_address)?;
    if input.smtp_port <= 0 || input.smtp_port > 65535 {
        return Err(AppError::Validation(
            "SMTP port must be between 1 and 65535".to_string(),
        ));
    }

    let settings = settings_repo::upsert(&state.db, session.tenant_id, input).await?;
    tracing::info!("✅ Email settings saved for tenant {}", session.tenant_id);
    Ok(settings)
}
