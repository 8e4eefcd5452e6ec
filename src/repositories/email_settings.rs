use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::{error::Result, models::email_settings::EmailSettings};

const SETTINGS_COLUMNS: &str = "tenant_id, smtp_host, smtp_port, smtp_username, smtp_password, \
     from_address, from_name, use_tls, updated_at";

/// Fetches a tenant's SMTP configuration.
pub async fn get(pool: &Pool, tenant_id: Uuid) -> Result<Option<EmailSettings>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &format!("SELECT {SETTINGS_COLUMNS} FROM email_settings WHERE tenant_id = $1"),
            &[&tenant_id],
        )
        .await?;
    Ok(row.as_ref().map(EmailSettings::from))
}

/// Fields accepted when saving SMTP configuration.
pub struct SettingsInput<'a> {
    pub smtp_host: &'a str,
    pub smtp_port: i32,
    pub smtp_username: &'a str,
    pub smtp_password: &'a str,
    pub from_address: &'a str,
    pub from_name: &'a str,
    pub use_tls: bool,
}

/// Creates or replaces a tenant's SMTP configuration.
pub async fn upsert(pool: &Pool, tenant_id: Uuid, input: &SettingsInput<'_>) -> Result<EmailSettings> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            &format!(
                r#"
                INSERT INTO email_settings
                    (tenant_id, smtp_host, smtp_port, smtp_username, smtp_password,
                     from_address, from_name, use_tls)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (tenant_id) DO UPDATE
                SET smtp_host = EXCLUDED.smtp_host,
                    smtp_port = EXCLUDED.smtp_port,
                    smtp_username = EXCLUDED.smtp_username,
                    smtp_password = EXCLUDED.smtp_password,
                    from_address = EXCLUDED.from_address,
                    from_name = EXCLUDED.from_name,
                    use_tls = EXCLUDED.use_tls,
                    updated_at = NOW()
                RETURNING {SETTINGS_COLUMNS}
                "#
            ),
            &[
                &tenant_id,
                &input.smtp_host,
                &input.smtp_port,
                &input.smtp_username,
                &input.smtp_password,
                &input.from_address,
                &input.from_name,
                &input.use_tls,
            ],
        )
        .await?;
    Ok(EmailSettings::from(&row))
}
