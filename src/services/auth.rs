use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder,
};
use rand::RngCore;
use rand::rngs::OsRng;
use uuid::Uuid;
use zeroize::Zeroize;

use crate::error::{AppError, Result};
use crate::models::{employee::Employee, session::Role, tenant::Tenant};
use crate::repositories::{employee as employee_repo, leave as leave_repo, tenant as tenant_repo};
use crate::state::AppState;

/// The memory cost for Argon2 in MB.
const ARGON2_MEMORY_MB: u32 = 19;
/// The number of iterations for Argon2.
const ARGON2_ITERATIONS: u32 = 3;
/// The parallelism factor for Argon2.
const ARGON2_PARALLELISM: u32 = 6;

/// Hashes a password using Argon2id.
///
/// # Arguments
///
/// * `password` - The password to hash.
///
/// # Returns
///
/// A `Result` containing the hashed password.
pub fn hash_password(password: &str) -> Result<String> {
    let mut password_bytes = password.as_bytes().to_vec();

    let mut salt_bytes = [0u8; 16];
    OsRng.fill_bytes(&mut salt_bytes);

    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AppError::Internal(format!("Salt encoding error: {}", e)))?;

    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        ParamsBuilder::new()
            .m_cost(ARGON2_MEMORY_MB * 1024)
            .t_cost(ARGON2_ITERATIONS)
            .p_cost(ARGON2_PARALLELISM)
            .build()
            .map_err(|e| AppError::Internal(format!("Argon2 params: {}", e)))?,
    );

    let password_hash = argon2
        .hash_password(&password_bytes, &salt)
        .map_err(|e| AppError::Internal(format!("Argon2 hash error: {}", e)))?
        .to_string();

    password_bytes.zeroize();
    tracing::debug!("Password hashed successfully with Argon2");
    Ok(password_hash)
}

/// Verifies a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let mut password_bytes = password.as_bytes().to_vec();
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Hash parse error: {}", e)))?;
    let argon2 = Argon2::default();
    let result = argon2.verify_password(&password_bytes, &parsed_hash).is_ok();

    password_bytes.zeroize();
    Ok(result)
}

/// Registers a new company: the tenant, its admin employee, the default
/// leave types, and the admin's balances, all in one transaction.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `company_name` - The company's display name.
/// * `subdomain` - The requested subdomain label (already validated).
/// * `admin_first_name` / `admin_last_name` - The admin's name.
/// * `email` - The admin's email address.
/// * `password` - The admin's password.
pub async fn register_company(
    state: &AppState,
    company_name: &str,
    subdomain: &str,
    admin_first_name: &str,
    admin_last_name: &str,
    email: &str,
    password: &str,
) -> Result<(Tenant, Employee)> {
    if state.config.reserved_subdomains.contains(subdomain) {
        return Err(AppError::Validation(
            "This subdomain is reserved".to_string(),
        ));
    }

    let password_hash = hash_password(password)?;

    let mut client = state.db.get().await?;
    let tx = client.transaction().await?;

    let tenant = tenant_repo::create(&tx, Uuid::new_v4(), company_name, subdomain).await?;
    leave_repo::seed_default_types(&tx, tenant.id).await?;

    let admin = employee_repo::create(
        &tx,
        &employee_repo::NewEmployee {
            id: Uuid::new_v4(),
            tenant_id: tenant.id,
            first_name: admin_first_name,
            last_name: admin_last_name,
            email,
            password_hash: &password_hash,
            role: Role::Admin,
            position: None,
            department: None,
            hire_date: None,
        },
    )
    .await?;
    leave_repo::seed_balances_for_employee(&tx, tenant.id, admin.id).await?;

    tx.commit().await?;

    tracing::info!("✅ Tenant registered: {} ({})", tenant.subdomain, tenant.id);
    Ok((tenant, admin))
}

/// Authenticates an employee within a tenant.
///
/// The failure message is identical for an unknown email and a wrong
/// password, so login cannot be used to probe tenant membership.
pub async fn authenticate(
    state: &AppState,
    tenant: &Tenant,
    email: &str,
    password: &str,
) -> Result<Employee> {
    tracing::debug!("🔐 Authenticating {} on tenant {}", email, tenant.subdomain);

    let employee = employee_repo::find_by_email(&state.db, tenant.id, email)
        .await?
        .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

    if !verify_password(password, &employee.password)? {
        return Err(AppError::Authentication(
            "Invalid email or password".to_string(),
        ));
    }

    tracing::info!("✅ Employee authenticated: {}", employee.id);
    Ok(employee)
}
