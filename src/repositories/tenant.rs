use deadpool_postgres::Pool;
use tokio_postgres::Transaction;
use tokio_postgres::error::SqlState;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::tenant::Tenant,
};

fn is_unique_violation(e: &tokio_postgres::Error) -> bool {
    e.code() == Some(&SqlState::UNIQUE_VIOLATION)
}

/// Creates a new tenant inside the registration transaction.
pub async fn create(tx: &Transaction<'_>, id: Uuid, name: &str, subdomain: &str) -> Result<Tenant> {
    let row = tx
        .query_one(
            r#"
            INSERT INTO tenants (id, name, subdomain, status)
            VALUES ($1, $2, $3, 'active')
            RETURNING id, name, subdomain, status, created_at, updated_at
            "#,
            &[&id, &name, &subdomain],
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Subdomain is already taken".to_string())
            } else {
                AppError::from(e)
            }
        })?;
    Ok(Tenant::from(&row))
}

/// Finds an active tenant by its subdomain label.
pub async fn find_by_subdomain(pool: &Pool, subdomain: &str) -> Result<Option<Tenant>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT id, name, subdomain, status, created_at, updated_at
            FROM tenants
            WHERE subdomain = $1 AND status = 'active'
            "#,
            &[&subdomain],
        )
        .await?;
    Ok(row.as_ref().map(Tenant::from))
}
