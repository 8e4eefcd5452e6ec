use chrono::NaiveDate;
use deadpool_postgres::Pool;
use tokio_postgres::Transaction;
use tokio_postgres::error::SqlState;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{employee::Employee, session::Role},
};

const EMPLOYEE_COLUMNS: &str = "id, tenant_id, first_name, last_name, email, password, role, \
     position, department, hire_date, is_active, created_at, updated_at";

fn is_unique_violation(e: &tokio_postgres::Error) -> bool {
    e.code() == Some(&SqlState::UNIQUE_VIOLATION)
}

/// Fields accepted when creating an employee.
pub struct NewEmployee<'a> {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub position: Option<&'a str>,
    pub department: Option<&'a str>,
    pub hire_date: Option<NaiveDate>,
}

/// Inserts a new employee. Runs inside a transaction so the caller can seed
/// leave balances atomically with the insert.
pub async fn create(tx: &Transaction<'_>, employee: &NewEmployee<'_>) -> Result<Employee> {
    let row = tx
        .query_one(
            &format!(
                r#"
                INSERT INTO employees
                    (id, tenant_id, first_name, last_name, email, password, role,
                     position, department, hire_date)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                RETURNING {EMPLOYEE_COLUMNS}
                "#
            ),
            &[
                &employee.id,
                &employee.tenant_id,
                &employee.first_name,
                &employee.last_name,
                &employee.email,
                &employee.password_hash,
                &employee.role,
                &employee.position,
                &employee.department,
                &employee.hire_date,
            ],
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("An employee with this email already exists".to_string())
            } else {
                AppError::from(e)
            }
        })?;
    Ok(Employee::from(&row))
}

/// Finds an active employee by email within a tenant. Used for login.
pub async fn find_by_email(pool: &Pool, tenant_id: Uuid, email: &str) -> Result<Option<Employee>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &format!(
                "SELECT {EMPLOYEE_COLUMNS} FROM employees \
                 WHERE tenant_id = $1 AND email = $2 AND is_active = true"
            ),
            &[&tenant_id, &email],
        )
        .await?;
    Ok(row.as_ref().map(Employee::from))
}

/// Finds an employee by id within a tenant.
pub async fn find_by_id(pool: &Pool, tenant_id: Uuid, id: Uuid) -> Result<Option<Employee>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &format!(
                "SELECT {EMPLOYEE_COLUMNS} FROM employees \
                 WHERE tenant_id = $1 AND id = $2"
            ),
            &[&tenant_id, &id],
        )
        .await?;
    Ok(row.as_ref().map(Employee::from))
}

/// Lists all employees of a tenant, active first, alphabetically.
pub async fn list(pool: &Pool, tenant_id: Uuid) -> Result<Vec<Employee>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            &format!(
                "SELECT {EMPLOYEE_COLUMNS} FROM employees \
                 WHERE tenant_id = $1 \
                 ORDER BY is_active DESC, last_name ASC, first_name ASC"
            ),
            &[&tenant_id],
        )
        .await?;
    Ok(rows.iter().map(Employee::from).collect())
}

/// Fields accepted when updating an employee. `None` leaves the column
/// untouched.
pub struct EmployeeUpdate<'a> {
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub role: Option<Role>,
    pub position: Option<&'a str>,
    pub department: Option<&'a str>,
    pub hire_date: Option<NaiveDate>,
}

/// Applies a partial update to an employee within a tenant.
pub async fn update(
    pool: &Pool,
    tenant_id: Uuid,
    id: Uuid,
    update: &EmployeeUpdate<'_>,
) -> Result<Option<Employee>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &format!(
                r#"
                UPDATE employees
                SET first_name = COALESCE($3, first_name),
                    last_name = COALESCE($4, last_name),
                    role = COALESCE($5, role),
                    position = COALESCE($6, position),
                    department = COALESCE($7, department),
                    hire_date = COALESCE($8, hire_date),
                    updated_at = NOW()
                WHERE tenant_id = $1 AND id = $2
                RETURNING {EMPLOYEE_COLUMNS}
                "#
            ),
            &[
                &tenant_id,
                &id,
                &update.first_name,
                &update.last_name,
                &update.role,
                &update.position,
                &update.department,
                &update.hire_date,
            ],
        )
        .await?;
    Ok(row.as_ref().map(Employee::from))
}

/// Replaces an employee's password hash. Used by the reset flow.
pub async fn update_password(
    pool: &Pool,
    tenant_id: Uuid,
    id: Uuid,
    password_hash: &str,
) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            "UPDATE employees SET password = $3, updated_at = NOW() \
             WHERE tenant_id = $1 AND id = $2",
            &[&tenant_id, &id, &password_hash],
        )
        .await?;
    Ok(())
}

/// Soft-deletes an employee. Returns whether a row was affected.
pub async fn deactivate(pool: &Pool, tenant_id: Uuid, id: Uuid) -> Result<bool> {
    let client = pool.get().await?;
    let affected = client
        .execute(
            "UPDATE employees SET is_active = false, updated_at = NOW() \
             WHERE tenant_id = $1 AND id = $2 AND is_active = true",
            &[&tenant_id, &id],
        )
        .await?;
    Ok(affected > 0)
}

/// Counts active employees of a tenant.
pub async fn count_active(pool: &Pool, tenant_id: Uuid) -> Result<i64> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            "SELECT COUNT(*) FROM employees WHERE tenant_id = $1 AND is_active = true",
            &[&tenant_id],
        )
        .await?;
    Ok(row.get(0))
}
