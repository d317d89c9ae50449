use bon_common::bill::BillStatus;
use bon_common::identity::UserId;
use bon_node::api::{ErrorResponse, HealthResponse};
use bon_node_integration::due_in_days;
use bon_node_integration::harness::TestNode;
use reqwest::StatusCode;

/// Health endpoint reports the backing store.
#[tokio::test]
async fn health_reports_store() {
    let node = TestNode::start().await;
    let resp = node.client.get("/health").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let health: HealthResponse = resp.json().await.unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.store, "memory");
    node.stop().await;
}

/// Created users and bills come back with store-assigned ids and defaults.
#[tokio::test]
async fn create_user_and_bill() {
    let node = TestNode::start().await;
    let user = node.client.create_user("Alice").await;
    assert_eq!(user.name, "Alice");

    let bill = node.client.create_bill(user.id, 4200, "2024-01-10").await;
    assert_eq!(bill.user_id, user.id);
    assert_eq!(bill.amount, 4200);
    assert_eq!(bill.status, BillStatus::Unpaid);
    assert_eq!(bill.payment_date, None);
    assert_eq!(bill.due_date.date_naive().to_string(), "2024-01-10");
}

/// Three on-time payments: only the third response carries a reward message,
/// and a reward row exists for the user.
#[tokio::test]
async fn third_on_time_payment_earns_reward() {
    let node = TestNode::start().await;
    let user = node.client.create_user("Bob").await;

    let mut responses = Vec::new();
    for _ in 0..3 {
        let bill = node.client.create_bill(user.id, 1000, &due_in_days(7)).await;
        responses.push(node.client.pay_bill(bill.id).await);
    }

    for resp in &responses {
        assert_eq!(resp.status, "success");
        assert_eq!(resp.bill.status, BillStatus::PaidOnTime);
        assert!(resp.bill.payment_date.is_some());
    }
    assert!(responses[0].reward_message.is_none());
    assert!(responses[1].reward_message.is_none());
    let message = responses[2].reward_message.as_deref().unwrap();
    assert!(!message.is_empty());

    assert_eq!(node.store.rewards_for(user.id).len(), 1);
}

/// Bills due in the past are paid late and never build a streak.
#[tokio::test]
async fn late_payments_earn_nothing() {
    let node = TestNode::start().await;
    let user = node.client.create_user("Carol").await;

    for _ in 0..3 {
        let bill = node.client.create_bill(user.id, 1000, "2024-01-10").await;
        let resp = node.client.pay_bill(bill.id).await;
        assert_eq!(resp.bill.status, BillStatus::PaidLate);
        assert!(resp.reward_message.is_none());
    }
    assert!(node.store.rewards_for(user.id).is_empty());
}

/// Paying a bill twice conflicts and leaves the store untouched.
#[tokio::test]
async fn paying_twice_conflicts() {
    let node = TestNode::start().await;
    let user = node.client.create_user("Dan").await;
    let bill = node.client.create_bill(user.id, 1000, &due_in_days(1)).await;
    node.client.pay_bill(bill.id).await;

    let writes = node.store.write_count();
    let resp = node.client.pay_bill_raw(&bill.id.to_string()).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let err: ErrorResponse = resp.json().await.unwrap();
    assert!(err.error.contains("already been paid"));
    assert_eq!(node.store.write_count(), writes);
}

/// Unknown bill id is a 404 with no state change.
#[tokio::test]
async fn unknown_bill_is_not_found() {
    let node = TestNode::start().await;
    let writes = node.store.write_count();
    let resp = node.client.pay_bill_raw("999").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(node.store.write_count(), writes);
}

#[tokio::test]
async fn malformed_input_is_bad_request() {
    let node = TestNode::start().await;

    let resp = node.client.pay_bill_raw("abc").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: ErrorResponse = resp.json().await.unwrap();
    assert_eq!(err.error, "invalid bill ID");

    let resp = node.client.post_raw("/api/v1/users", "{not json").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: ErrorResponse = resp.json().await.unwrap();
    assert_eq!(err.error, "invalid request body");

    let resp = node
        .client
        .post_raw(
            "/api/v1/bills",
            r#"{"user_id": 1, "amount": 10, "due_date": "next tuesday"}"#,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

/// A bill for a user that does not exist is rejected by the foreign key.
#[tokio::test]
async fn bill_for_unknown_user_is_not_found() {
    let node = TestNode::start().await;
    let resp = node
        .client
        .post_json(
            "/api/v1/bills",
            &serde_json::json!({
                "user_id": UserId(77),
                "amount": 10,
                "due_date": "2024-01-10",
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
