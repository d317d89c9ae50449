use serde::Serialize;

use bon_common::bill::Bill;
use bon_common::identity::{BillId, UserId};
use bon_common::user::User;
use bon_node::api::{CreateUserRequest, PayBillResponse};


/// Install a test-friendly subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .try_init();
}

#[derive(Serialize)]
struct CreateBillBody<'a> {
    user_id: UserId,
    amount: i64,
    due_date: &'a str,
}

/// Thin HTTP client for the `/api/v1` surface.
pub struct Client {
    base_url: String,
    http: reqwest::Client,
}

impl Client {
    pub fn new(base_url: String) -> Self {
        Client {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> reqwest::Response {
        self.http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .unwrap_or_else(|e| panic!("POST {path} failed: {e}"))
    }

    pub async fn post_raw(&self, path: &str, body: &'static str) -> reqwest::Response {
        self.http
            .post(self.url(path))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .unwrap_or_else(|e| panic!("POST {path} failed: {e}"))
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.http
            .get(self.url(path))
            .send()
            .await
            .unwrap_or_else(|e| panic!("GET {path} failed: {e}"))
    }

    /// Create a user, asserting `201 Created`.
    pub async fn create_user(&self, name: &str) -> User {
        let resp = self
            .post_json(
                "/api/v1/users",
                &CreateUserRequest {
                    name: name.to_string(),
                },
            )
            .await;
        assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
        resp.json().await.expect("Invalid user JSON")
    }

    /// Create a bill, asserting `201 Created`.
    pub async fn create_bill(&self, user_id: UserId, amount: i64, due_date: &str) -> Bill {
        let resp = self
            .post_json(
                "/api/v1/bills",
                &CreateBillBody {
                    user_id,
                    amount,
                    due_date,
                },
            )
            .await;
        assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
        resp.json().await.expect("Invalid bill JSON")
    }

    /// Pay a bill without interpreting the response.
    pub async fn pay_bill_raw(&self, bill_id: &str) -> reqwest::Response {
        self.http
            .post(self.url(&format!("/api/v1/bills/{bill_id}/pay")))
            .send()
            .await
            .unwrap_or_else(|e| panic!("pay {bill_id} failed: {e}"))
    }

    /// Pay a bill, asserting `200 OK`.
    pub async fn pay_bill(&self, bill_id: BillId) -> PayBillResponse {
        let resp = self.pay_bill_raw(&bill_id.to_string()).await;
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        resp.json().await.expect("Invalid payment JSON")
    }
}

/// RFC 3339 due date `days` from now.
pub fn due_in_days(days: i64) -> String {
    (chrono::Utc::now() + chrono::Duration::days(days)).to_rfc3339()
}
