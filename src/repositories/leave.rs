use chrono::NaiveDate;
use deadpool_postgres::Pool;
use tokio_postgres::Row;
use tokio_postgres::Transaction;
use tokio_postgres::types::ToSql;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::leave::{LeaveBalance, LeaveRequest, LeaveStatus, LeaveType},
};

const REQUEST_COLUMNS: &str = "id, tenant_id, employee_id, leave_type_id, start_date, end_date, \
     reason, status, request_date, approver_id, approval_date, comments";

/// A helper function to map a `tokio_postgres::Row` to a `LeaveRequest`.
fn row_to_request(row: &Row) -> Result<LeaveRequest> {
    Ok(LeaveRequest {
        id: row.try_get("id").map_err(|_| AppError::MissingData("id".to_string()))?,
        tenant_id: row.try_get("tenant_id").map_err(|_| AppError::MissingData("tenant_id".to_string()))?,
        employee_id: row.try_get("employee_id").map_err(|_| AppError::MissingData("employee_id".to_string()))?,
        leave_type_id: row.try_get("leave_type_id").map_err(|_| AppError::MissingData("leave_type_id".to_string()))?,
        start_date: row.try_get("start_date").map_err(|_| AppError::MissingData("start_date".to_string()))?,
        end_date: row.try_get("end_date").map_err(|_| AppError::MissingData("end_date".to_string()))?,
        reason: row.try_get("reason").map_err(|_| AppError::MissingData("reason".to_string()))?,
        status: row.try_get("status").map_err(|_| AppError::MissingData("status".to_string()))?,
        request_date: row.try_get("request_date").map_err(|_| AppError::MissingData("request_date".to_string()))?,
        approver_id: row.try_get("approver_id").map_err(|_| AppError::MissingData("approver_id".to_string()))?,
        approval_date: row.try_get("approval_date").map_err(|_| AppError::MissingData("approval_date".to_string()))?,
        comments: row.try_get("comments").map_err(|_| AppError::MissingData("comments".to_string()))?,
    })
}

/// Lists the leave types of a tenant.
pub async fn list_types(pool: &Pool, tenant_id: Uuid) -> Result<Vec<LeaveType>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            r#"
            SELECT id, tenant_id, name, requires_approval, default_balance, accrual_rate, created_at
            FROM leave_types
            WHERE tenant_id = $1
            ORDER BY name ASC
            "#,
            &[&tenant_id],
        )
        .await?;
    Ok(rows.iter().map(LeaveType::from).collect())
}

/// Creates a leave type and seeds the matching balance for every existing
/// employee of the tenant, atomically.
pub async fn create_type(
    pool: &Pool,
    tenant_id: Uuid,
    name: &str,
    requires_approval: bool,
    default_balance: f64,
    accrual_rate: f64,
) -> Result<LeaveType> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let id = Uuid::new_v4();
    let row = tx
        .query_one(
            r#"
            INSERT INTO leave_types (id, tenant_id, name, requires_approval, default_balance, accrual_rate)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, tenant_id, name, requires_approval, default_balance, accrual_rate, created_at
            "#,
            &[&id, &tenant_id, &name, &requires_approval, &default_balance, &accrual_rate],
        )
        .await?;

    tx.execute(
        r#"
        INSERT INTO leave_balances (tenant_id, employee_id, leave_type_id, balance)
        SELECT tenant_id, id, $2, $3
        FROM employees
        WHERE tenant_id = $1
        ON CONFLICT (tenant_id, employee_id, leave_type_id) DO NOTHING
        "#,
        &[&tenant_id, &id, &default_balance],
    )
    .await?;

    tx.commit().await?;
    Ok(LeaveType::from(&row))
}

/// Seeds leave balances for a newly created employee, one per leave type of
/// the tenant, at each type's default balance. Runs inside the employee
/// creation transaction.
pub async fn seed_balances_for_employee(
    tx: &Transaction<'_>,
    tenant_id: Uuid,
    employee_id: Uuid,
) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO leave_balances (tenant_id, employee_id, leave_type_id, balance)
        SELECT tenant_id, $2, id, default_balance
        FROM leave_types
        WHERE tenant_id = $1
        ON CONFLICT (tenant_id, employee_id, leave_type_id) DO NOTHING
        "#,
        &[&tenant_id, &employee_id],
    )
    .await?;
    Ok(())
}

/// Inserts the default leave types for a freshly registered tenant.
pub async fn seed_default_types(tx: &Transaction<'_>, tenant_id: Uuid) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO leave_types (id, tenant_id, name, requires_approval, default_balance, accrual_rate)
        VALUES
            ($1, $3, 'Annual Leave', true, 25, 2.0),
            ($2, $3, 'Sick Leave', false, 10, 0.0)
        "#,
        &[&Uuid::new_v4(), &Uuid::new_v4(), &tenant_id],
    )
    .await?;
    Ok(())
}

/// Atomically checks the employee's balance and inserts a new `Pending`
/// request. The balance row is locked with `FOR UPDATE` so two concurrent
/// requests cannot both pass the check against the same remaining days.
pub async fn create_request_atomic(
    pool: &Pool,
    tenant_id: Uuid,
    employee_id: Uuid,
    leave_type_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: &str,
) -> Result<LeaveRequest> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let leave_type = tx
        .query_opt(
            "SELECT requires_approval FROM leave_types WHERE tenant_id = $1 AND id = $2",
            &[&tenant_id, &leave_type_id],
        )
        .await?
        .ok_or(AppError::NotFound)?;
    let requires_approval: bool = leave_type.get("requires_approval");

    let requested_days = (end_date - start_date).num_days() + 1;

    if requires_approval {
        let balance_row = tx
            .query_opt(
                r#"
                SELECT balance FROM leave_balances
                WHERE tenant_id = $1 AND employee_id = $2 AND leave_type_id = $3
                FOR UPDATE
                "#,
                &[&tenant_id, &employee_id, &leave_type_id],
            )
            .await?;
        let balance: f64 = balance_row.map(|row| row.get("balance")).unwrap_or(0.0);

        if balance < requested_days as f64 {
            return Err(AppError::InsufficientBalance(format!(
                "Requested {} day(s) but only {} remaining",
                requested_days, balance
            )));
        }
    }

    let row = tx
        .query_one(
            &format!(
                r#"
                INSERT INTO leave_requests
                    (id, tenant_id, employee_id, leave_type_id, start_date, end_date, reason, status)
                VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending')
                RETURNING {REQUEST_COLUMNS}
                "#
            ),
            &[
                &Uuid::new_v4(),
                &tenant_id,
                &employee_id,
                &leave_type_id,
                &start_date,
                &end_date,
                &reason,
            ],
        )
        .await?;

    tx.commit().await?;
    row_to_request(&row)
}

/// Lists leave requests of a tenant, newest first, optionally filtered by
/// employee and status. The query never crosses the tenant boundary.
pub async fn list_requests(
    pool: &Pool,
    tenant_id: Uuid,
    employee_id: Option<Uuid>,
    status: Option<LeaveStatus>,
) -> Result<Vec<LeaveRequest>> {
    let client = pool.get().await?;

    let mut conditions = vec!["tenant_id = $1".to_string()];
    let mut params: Vec<&(dyn ToSql + Sync)> = vec![&tenant_id];

    if let Some(ref employee_id) = employee_id {
        params.push(employee_id);
        conditions.push(format!("employee_id = ${}", params.len()));
    }
    if let Some(ref status) = status {
        params.push(status);
        conditions.push(format!("status = ${}", params.len()));
    }

    let query = format!(
        "SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE {} ORDER BY request_date DESC",
        conditions.join(" AND ")
    );

    let rows = client.query(&query, &params).await?;
    rows.iter().map(row_to_request).collect()
}

/// Finds a leave request within a tenant.
pub async fn find_request(pool: &Pool, tenant_id: Uuid, id: Uuid) -> Result<Option<LeaveRequest>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &format!(
                "SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE tenant_id = $1 AND id = $2"
            ),
            &[&tenant_id, &id],
        )
        .await?;
    row.as_ref().map(row_to_request).transpose()
}

/// Transitions a `Pending` request to `Approved` or `Rejected` with a
/// conditional update, recording the approver. An approval decrements the
/// employee's balance in the same transaction.
///
/// Zero rows affected means the request was not `Pending` at write time:
/// the follow-up lookup distinguishes `NotFound` from `InvalidState`, so a
/// concurrent second approval fails cleanly instead of overwriting.
pub async fn update_status_if_pending(
    pool: &Pool,
    tenant_id: Uuid,
    request_id: Uuid,
    new_status: LeaveStatus,
    approver_id: Uuid,
    comments: Option<&str>,
) -> Result<LeaveRequest> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let row = tx
        .query_opt(
            &format!(
                r#"
                UPDATE leave_requests
                SET status = $3, approver_id = $4, approval_date = NOW(), comments = $5
                WHERE tenant_id = $1 AND id = $2 AND status = 'pending'
                RETURNING {REQUEST_COLUMNS}
                "#
            ),
            &[&tenant_id, &request_id, &new_status, &approver_id, &comments],
        )
        .await?;

    let Some(row) = row else {
        let current = tx
            .query_opt(
                "SELECT status FROM leave_requests WHERE tenant_id = $1 AND id = $2",
                &[&tenant_id, &request_id],
            )
            .await?;
        return match current {
            Some(row) => {
                let status: LeaveStatus = row.get("status");
                Err(AppError::InvalidState(format!(
                    "Request is already {}",
                    status.as_str()
                )))
            }
            None => Err(AppError::NotFound),
        };
    };

    let request = row_to_request(&row)?;

    // The creation-time check ran against the balance as it was then; other
    // requests may have been approved since. The debit is guarded so two
    // individually-affordable approvals cannot drive the balance negative:
    // zero rows here rolls the whole approval back.
    if new_status == LeaveStatus::Approved {
        let days = request.requested_days() as f64;
        let affected = tx
            .execute(
                r#"
                UPDATE leave_balances
                SET balance = balance - $4, last_updated = NOW()
                WHERE tenant_id = $1 AND employee_id = $2 AND leave_type_id = $3
                  AND balance >= $4
                "#,
                &[
                    &tenant_id,
                    &request.employee_id,
                    &request.leave_type_id,
                    &days,
                ],
            )
            .await?;

        if affected == 0 {
            return Err(AppError::InsufficientBalance(format!(
                "Approving {} day(s) would overdraw the remaining balance",
                days
            )));
        }
    }

    tx.commit().await?;
    Ok(request)
}

/// Cancels a request with a conditional update on `Pending`. The ownership
/// check happens in the service before this call; a zero-row result here
/// means the request left `Pending` concurrently.
pub async fn cancel_if_pending(pool: &Pool, tenant_id: Uuid, request_id: Uuid) -> Result<LeaveRequest> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &format!(
                r#"
                UPDATE leave_requests
                SET status = 'cancelled'
                WHERE tenant_id = $1 AND id = $2 AND status = 'pending'
                RETURNING {REQUEST_COLUMNS}
                "#
            ),
            &[&tenant_id, &request_id],
        )
        .await?;

    match row {
        Some(row) => row_to_request(&row),
        None => Err(AppError::InvalidState(
            "Request is no longer pending".to_string(),
        )),
    }
}

/// Lists the leave balances of one employee within a tenant.
pub async fn list_balances(pool: &Pool, tenant_id: Uuid, employee_id: Uuid) -> Result<Vec<LeaveBalance>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            r#"
            SELECT tenant_id, employee_id, leave_type_id, balance, last_updated
            FROM leave_balances
            WHERE tenant_id = $1 AND employee_id = $2
            ORDER BY leave_type_id
            "#,
            &[&tenant_id, &employee_id],
        )
        .await?;
    Ok(rows.iter().map(LeaveBalance::from).collect())
}

/// Counts pending leave requests of a tenant.
pub async fn count_pending(pool: &Pool, tenant_id: Uuid) -> Result<i64> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            "SELECT COUNT(*) FROM leave_requests WHERE tenant_id = $1 AND status = 'pending'",
            &[&tenant_id],
        )
        .await?;
    Ok(row.get(0))
}
