use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{employee::Employee, session::{Role, Session}},
    repositories::{employee as employee_repo, leave as leave_repo},
    services::auth as auth_service,
    state::AppState,
    validation,
};

/// Fields for creating an employee.
pub struct CreateEmployee<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: Role,
    pub position: Option<&'a str>,
    pub department: Option<&'a str>,
    pub hire_date: Option<NaiveDate>,
}

/// Creates an employee and seeds their leave balances atomically.
/// Admin only.
pub async fn create(state: &AppState, session: &Session, input: CreateEmployee<'_>) -> Result<Employee> {
    if session.role != Role::Admin {
        return Err(AppError::Unauthorized);
    }

    validation::auth::validate_name(input.first_name, "First name")?;
    validation::auth::validate_name(input.last_name, "Last name")?;
    validation::auth::validate_email(input.email)?;
    validation::auth::validate_password(input.password)?;

    let password_hash = auth_service::hash_password(input.password)?;

    let mut client = state.db.get().await?;
    let tx = client.transaction().await?;

    let employee = employee_repo::create(
        &tx,
        &employee_repo::NewEmployee {
            id: Uuid::new_v4(),
            tenant_id: session.tenant_id,
            first_name: input.first_name.trim(),
            last_name: input.last_name.trim(),
            email: input.email,
            password_hash: &password_hash,
            role: input.role,
            position: input.position,
            department: input.department,
            hire_date: input.hire_date,
        },
    )
    .await?;
    leave_repo::seed_balances_for_employee(&tx, session.tenant_id, employee.id).await?;

    tx.commit().await?;

    tracing::info!("✅ Employee {} created in tenant {}", employee.id, session.tenant_id);
    Ok(employee)
}

/// Lists all employees of the session's tenant.
pub async fn list(state: &AppState, session: &Session) -> Result<Vec<Employee>> {
    employee_repo::list(&state.db, session.tenant_id).await
}

/// Fetches one employee of the session's tenant.
pub async fn get(state: &AppState, session: &Session, id: Uuid) -> Result<Employee> {
    employee_repo::find_by_id(&state.db, session.tenant_id, id)
        .await?
        .ok_or(AppError::NotFound)
}

/// Applies a partial update to an employee. Admin only.
pub async fn update(
    state: &AppState,
    session: &Session,
    id: Uuid,
    update: &employee_repo::EmployeeUpdate<'_>,
) -> Result<Employee> {
    if session.role != Role::Admin {
        return Err(AppError::Unauthorized);
    }

    if let Some(first_name) = update.first_name {
        validation::auth::validate_name(first_name, "First name")?;
    }
    if let Some(last_name) = update.last_name {
        validation::auth::validate_name(last_name, "Last name")?;
    }

    employee_repo::update(&state.db, session.tenant_id, id, update)
        .await?
        .ok_or(AppError::NotFound)
}

/// Deactivates (soft-deletes) an employee. Admin only; admins cannot
/// deactivate themselves.
pub async fn deactivate(state: &AppState, session: &Session, id: Uuid) -> Result<()> {
    if session.role != Role::Admin {
        return Err(AppError::Unauthorized);
    }
    if id == session.user_id {
        return Err(AppError::Validation(
            "You cannot deactivate your own account".to_string(),
        ));
    }

    if employee_repo::deactivate(&state.db, session.tenant_id, id).await? {
        tracing::info!("✅ Employee {} deactivated", id);
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}
