use std::time::{SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;
use serde_json::json;

// Shared test context. The whole suite is gated on E2E_BASE_URL so it can
// live in the tree without a running stack. Point it at a locally running
// server backed by Postgres and Redis (E2E_BASE_URL=http://localhost:3000);
// local hosts serve the full API surface, so no Host override is needed and
// the session's own tenant scopes each request.
struct TestContext {
    client: reqwest::Client,
    base_url: String,
    csrf_token: String,
}

static BASE_URL: Lazy<Option<String>> = Lazy::new(|| std::env::var("E2E_BASE_URL").ok());

impl TestContext {
    fn new() -> Option<Self> {
        let base_url = BASE_URL.clone()?;
        Some(Self {
            client: reqwest::Client::builder()
                .cookie_store(true)
                .build()
                .unwrap(),
            base_url,
            csrf_token: String::new(),
        })
    }

    fn get_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    fn capture_csrf(&mut self, response: &reqwest::Response) {
        for cookie in response.cookies() {
            if cookie.name() == "csrf_token" {
                self.csrf_token = cookie.value().to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    async fn register_company(context: &mut TestContext, subdomain: &str) -> Value {
        let response = context
            .client
            .post(format!("{}/api/auth/register", context.base_url))
            .json(&json!({
                "company_name": "Test Company",
                "subdomain": subdomain,
                "first_name": "Ada",
                "last_name": "Admin",
                "email": format!("admin@{}.test", subdomain),
                "password": "SecurePass123!@#"
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 201, "Registration failed");
        context.capture_csrf(&response);
        response.json().await.unwrap()
    }

    #[tokio::test]
    async fn test_company_registration_and_login() {
        let Some(mut context) = TestContext::new() else {
            return;
        };
        let subdomain = format!("acme{}", TestContext::get_timestamp());

        let reg_body = register_company(&mut context, &subdomain).await;
        assert_eq!(reg_body["tenant"]["subdomain"], subdomain.as_str());

        // A fresh client has to log in; the root domain needs the company
        // named in the payload.
        let login_context = TestContext::new().unwrap();
        let login_response = login_context
            .client
            .post(format!("{}/api/auth/login", login_context.base_url))
            .json(&json!({
                "email": format!("admin@{}.test", subdomain),
                "password": "SecurePass123!@#",
                "company": subdomain
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(login_response.status().as_u16(), 200, "Login failed");

        // Wrong password is indistinguishable from an unknown account.
        let bad_login = login_context
            .client
            .post(format!("{}/api/auth/login", login_context.base_url))
            .json(&json!({
                "email": format!("admin@{}.test", subdomain),
                "password": "not-the-password",
                "company": subdomain
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(bad_login.status().as_u16(), 401);

        // The subdomain is now taken.
        let duplicate = login_context
            .client
            .post(format!("{}/api/auth/register", login_context.base_url))
            .json(&json!({
                "company_name": "Copycat Inc",
                "subdomain": subdomain,
                "first_name": "Bob",
                "last_name": "Builder",
                "email": "bob@copycat.test",
                "password": "SecurePass123!@#"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(duplicate.status().as_u16(), 409);
    }

    #[tokio::test]
    async fn test_reserved_subdomain_is_rejected() {
        let Some(context) = TestContext::new() else {
            return;
        };

        let response = context
            .client
            .post(format!("{}/api/auth/register", context.base_url))
            .json(&json!({
                "company_name": "Sneaky Corp",
                "subdomain": "www",
                "first_name": "Eve",
                "last_name": "Edge",
                "email": "eve@sneaky.test",
                "password": "SecurePass123!@#"
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 400);
    }

    #[tokio::test]
    async fn test_leave_request_lifecycle() {
        let Some(mut context) = TestContext::new() else {
            return;
        };
        let subdomain = format!("leaveco{}", TestContext::get_timestamp());
        register_company(&mut context, &subdomain).await;

        // Registration seeds the default leave types.
        let types_response = context
            .client
            .get(format!("{}/api/leave-types", context.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(types_response.status().as_u16(), 200);
        let types: Value = types_response.json().await.unwrap();
        let annual = types
            .as_array()
            .unwrap()
            .iter()
            .find(|t| t["name"] == "Annual Leave")
            .expect("default annual leave type missing");
        let leave_type_id = annual["id"].as_str().unwrap().to_string();

        // Step 1: submit a request.
        let create_response = context
            .client
            .post(format!("{}/api/leave-requests", context.base_url))
            .header("x-csrf-token", &context.csrf_token)
            .json(&json!({
                "leave_type_id": leave_type_id,
                "start_date": "2026-09-07",
                "end_date": "2026-09-11",
                "reason": "Family holiday in the mountains"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(create_response.status().as_u16(), 201, "Create failed");
        let request: Value = create_response.json().await.unwrap();
        assert_eq!(request["status"], "pending");
        let request_id = request["id"].as_str().unwrap().to_string();

        // Step 2: approve it.
        let approve_response = context
            .client
            .patch(format!(
                "{}/api/leave-requests/{}/status",
                context.base_url, request_id
            ))
            .header("x-csrf-token", &context.csrf_token)
            .json(&json!({ "status": "approved", "comments": "Enjoy!" }))
            .send()
            .await
            .unwrap();
        assert_eq!(approve_response.status().as_u16(), 200, "Approve failed");
        let approved: Value = approve_response.json().await.unwrap();
        assert_eq!(approved["status"], "approved");

        // Step 3: a second decision hits a terminal state.
        let again_response = context
            .client
            .patch(format!(
                "{}/api/leave-requests/{}/status",
                context.base_url, request_id
            ))
            .header("x-csrf-token", &context.csrf_token)
            .json(&json!({ "status": "rejected" }))
            .send()
            .await
            .unwrap();
        assert_eq!(again_response.status().as_u16(), 409);

        // Step 4: so does cancelling after approval.
        let cancel_response = context
            .client
            .patch(format!(
                "{}/api/leave-requests/{}/cancel",
                context.base_url, request_id
            ))
            .header("x-csrf-token", &context.csrf_token)
            .send()
            .await
            .unwrap();
        assert_eq!(cancel_response.status().as_u16(), 409);

        // The approval debited the balance.
        let balances_response = context
            .client
            .get(format!("{}/api/leave-balances", context.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(balances_response.status().as_u16(), 200);
        let balances: Value = balances_response.json().await.unwrap();
        let annual_balance = balances
            .as_array()
            .unwrap()
            .iter()
            .find(|b| b["leave_type_id"] == annual["id"])
            .expect("annual balance missing");
        assert_eq!(annual_balance["balance"].as_f64().unwrap(), 20.0);
    }

    #[tokio::test]
    async fn test_approval_cannot_overdraw_balance() {
        let Some(mut context) = TestContext::new() else {
            return;
        };
        let subdomain = format!("drawco{}", TestContext::get_timestamp());
        register_company(&mut context, &subdomain).await;

        // A small allotment: both requests below fit it individually, but
        // not together.
        let leave_type: Value = context
            .client
            .post(format!("{}/api/leave-types", context.base_url))
            .header("x-csrf-token", &context.csrf_token)
            .json(&json!({
                "name": "Project Days",
                "requires_approval": true,
                "default_balance": 3.0
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let leave_type_id = leave_type["id"].as_str().unwrap().to_string();

        let mut request_ids = Vec::new();
        for (start, end) in [("2026-11-02", "2026-11-03"), ("2026-11-09", "2026-11-10")] {
            let response = context
                .client
                .post(format!("{}/api/leave-requests", context.base_url))
                .header("x-csrf-token", &context.csrf_token)
                .json(&json!({
                    "leave_type_id": leave_type_id,
                    "start_date": start,
                    "end_date": end,
                    "reason": "Working on the side project"
                }))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status().as_u16(), 201);
            let request: Value = response.json().await.unwrap();
            request_ids.push(request["id"].as_str().unwrap().to_string());
        }

        // First approval fits (3 - 2 = 1 remaining).
        let first = context
            .client
            .patch(format!(
                "{}/api/leave-requests/{}/status",
                context.base_url, request_ids[0]
            ))
            .header("x-csrf-token", &context.csrf_token)
            .json(&json!({ "status": "approved" }))
            .send()
            .await
            .unwrap();
        assert_eq!(first.status().as_u16(), 200);

        // The second request passed its creation-time check against the
        // undebited balance; approving it now would overdraw.
        let second = context
            .client
            .patch(format!(
                "{}/api/leave-requests/{}/status",
                context.base_url, request_ids[1]
            ))
            .header("x-csrf-token", &context.csrf_token)
            .json(&json!({ "status": "approved" }))
            .send()
            .await
            .unwrap();
        assert_eq!(second.status().as_u16(), 422);

        // The failed approval left the request pending and the balance
        // untouched.
        let balances: Value = context
            .client
            .get(format!("{}/api/leave-balances", context.base_url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let remaining = balances
            .as_array()
            .unwrap()
            .iter()
            .find(|b| b["leave_type_id"] == leave_type["id"])
            .expect("project days balance missing");
        assert_eq!(remaining["balance"].as_f64().unwrap(), 1.0);
    }

    #[tokio::test]
    async fn test_pending_request_can_be_cancelled() {
        let Some(mut context) = TestContext::new() else {
            return;
        };
        let subdomain = format!("cancelco{}", TestContext::get_timestamp());
        register_company(&mut context, &subdomain).await;

        let types: Value = context
            .client
            .get(format!("{}/api/leave-types", context.base_url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let leave_type_id = types.as_array().unwrap()[0]["id"]
            .as_str()
            .unwrap()
            .to_string();

        let request: Value = context
            .client
            .post(format!("{}/api/leave-requests", context.base_url))
            .header("x-csrf-token", &context.csrf_token)
            .json(&json!({
                "leave_type_id": leave_type_id,
                "start_date": "2026-10-01",
                "end_date": "2026-10-02",
                "reason": "Moving apartments"
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let request_id = request["id"].as_str().unwrap().to_string();

        let cancel_response = context
            .client
            .patch(format!(
                "{}/api/leave-requests/{}/cancel",
                context.base_url, request_id
            ))
            .header("x-csrf-token", &context.csrf_token)
            .send()
            .await
            .unwrap();
        assert_eq!(cancel_response.status().as_u16(), 200);
        let cancelled: Value = cancel_response.json().await.unwrap();
        assert_eq!(cancelled["status"], "cancelled");
    }

    #[tokio::test]
    async fn test_mutating_request_without_csrf_header_is_rejected() {
        let Some(mut context) = TestContext::new() else {
            return;
        };
        let subdomain = format!("csrfco{}", TestContext::get_timestamp());
        register_company(&mut context, &subdomain).await;

        let response = context
            .client
            .post(format!("{}/api/employees", context.base_url))
            .json(&json!({
                "first_name": "No",
                "last_name": "Token",
                "email": format!("no.token@{}.test", subdomain),
                "password": "SecurePass123!@#"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 401);
    }

    #[tokio::test]
    async fn test_employee_crud_and_role_enforcement() {
        let Some(mut context) = TestContext::new() else {
            return;
        };
        let subdomain = format!("crewco{}", TestContext::get_timestamp());
        register_company(&mut context, &subdomain).await;

        let email = format!("worker@{}.test", subdomain);
        let create_response = context
            .client
            .post(format!("{}/api/employees", context.base_url))
            .header("x-csrf-token", &context.csrf_token)
            .json(&json!({
                "first_name": "Wendy",
                "last_name": "Worker",
                "email": email,
                "password": "SecurePass123!@#",
                "role": "employee",
                "position": "Technician"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(create_response.status().as_u16(), 201);
        let employee: Value = create_response.json().await.unwrap();
        let employee_id = employee["id"].as_str().unwrap().to_string();
        assert!(employee.get("password").is_none(), "password leaked");

        // The new account can log in but cannot manage staff.
        let mut worker = TestContext::new().unwrap();
        let login_response = worker
            .client
            .post(format!("{}/api/auth/login", worker.base_url))
            .json(&json!({
                "email": email,
                "password": "SecurePass123!@#",
                "company": subdomain
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(login_response.status().as_u16(), 200);
        worker.capture_csrf(&login_response);

        let forbidden = worker
            .client
            .delete(format!(
                "{}/api/employees/{}",
                worker.base_url, employee_id
            ))
            .header("x-csrf-token", &worker.csrf_token)
            .send()
            .await
            .unwrap();
        assert_eq!(forbidden.status().as_u16(), 403);

        // The admin updates and then deactivates the account.
        let update_response = context
            .client
            .put(format!("{}/api/employees/{}", context.base_url, employee_id))
            .header("x-csrf-token", &context.csrf_token)
            .json(&json!({ "department": "Field Ops" }))
            .send()
            .await
            .unwrap();
        assert_eq!(update_response.status().as_u16(), 200);
        let updated: Value = update_response.json().await.unwrap();
        assert_eq!(updated["department"], "Field Ops");

        let delete_response = context
            .client
            .delete(format!(
                "{}/api/employees/{}",
                context.base_url, employee_id
            ))
            .header("x-csrf-token", &context.csrf_token)
            .send()
            .await
            .unwrap();
        assert_eq!(delete_response.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn test_public_job_board_flow() {
        let Some(mut context) = TestContext::new() else {
            return;
        };
        let subdomain = format!("hireco{}", TestContext::get_timestamp());
        register_company(&mut context, &subdomain).await;

        let posting: Value = context
            .client
            .post(format!("{}/api/job-postings", context.base_url))
            .header("x-csrf-token", &context.csrf_token)
            .json(&json!({
                "title": "Backend Engineer",
                "description": "Build the systems behind the staff portal.",
                "location": "Remote",
                "status": "open"
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let posting_id = posting["id"].as_str().unwrap().to_string();

        // Anonymous visitors see the open posting on the board.
        let anonymous = reqwest::Client::new();
        let board: Value = anonymous
            .get(format!("{}/api/jobs", context.base_url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(
            board["jobs"]
                .as_array()
                .unwrap()
                .iter()
                .any(|j| j["id"] == posting_id.as_str()),
            "open posting not on the public board"
        );

        let apply_response = anonymous
            .post(format!("{}/api/jobs/{}/apply", context.base_url, posting_id))
            .json(&json!({
                "name": "Casey Candidate",
                "email": "casey@applicants.test",
                "phone": "+1-555-0100"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(apply_response.status().as_u16(), 201);

        // The tenant sees the application in its pipeline.
        let candidates: Value = context
            .client
            .get(format!(
                "{}/api/job-postings/{}/candidates",
                context.base_url, posting_id
            ))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(candidates["count"].as_u64().unwrap(), 1);
        assert_eq!(candidates["candidates"][0]["stage"], "applied");

        // Closing the posting takes it off the board.
        let close_response = context
            .client
            .put(format!(
                "{}/api/job-postings/{}",
                context.base_url, posting_id
            ))
            .header("x-csrf-token", &context.csrf_token)
            .json(&json!({
                "title": "Backend Engineer",
                "description": "Build the systems behind the staff portal.",
                "location": "Remote",
                "status": "closed"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(close_response.status().as_u16(), 200);

        let closed_public = anonymous
            .get(format!("{}/api/jobs/{}", context.base_url, posting_id))
            .send()
            .await
            .unwrap();
        assert_eq!(closed_public.status().as_u16(), 404);
    }
}
