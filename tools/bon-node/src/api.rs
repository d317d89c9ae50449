use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use bon_common::bill::{deserialize_due_date, Bill};
use bon_common::identity::{BillId, UserId};
use bon_common::user::User;

use crate::error::ServiceError;
use crate::service::RewardService;
use crate::store::Store;

type AppState<S> = Arc<RewardService<S>>;

// ─── API types ───────────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct PayBillResponse {
    pub status: String,
    pub bill: Bill,
    pub reward_message: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct CreateBillRequest {
    pub user_id: UserId,
    pub amount: i64,
    #[serde(deserialize_with = "deserialize_due_date")]
    pub due_date: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::InvalidState(_) => StatusCode::CONFLICT,
            ServiceError::Store(e) => {
                tracing::error!(error = %e, "store failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        // Store details stay in the logs.
        let error = match &self {
            ServiceError::Store(_) => "internal error".to_string(),
            other => other.to_string(),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

fn invalid_body(rejection: JsonRejection) -> ServiceError {
    tracing::debug!(error = %rejection, "rejected request body");
    ServiceError::Validation("invalid request body".to_string())
}

// ─── Handlers ───────────────────────────────────────────────────────────────

async fn pay_bill_handler<S: Store>(
    State(service): State<AppState<S>>,
    Path(raw_id): Path<String>,
) -> Result<Json<PayBillResponse>, ServiceError> {
    let bill_id = raw_id
        .parse::<i64>()
        .map(BillId)
        .map_err(|_| ServiceError::Validation("invalid bill ID".to_string()))?;

    let outcome = service.pay_bill(bill_id).await.inspect_err(|e| {
        tracing::warn!(%bill_id, error = %e, "payment rejected");
    })?;

    Ok(Json(PayBillResponse {
        status: "success".to_string(),
        bill: outcome.bill,
        reward_message: outcome.reward_message,
    }))
}

async fn create_user_handler<S: Store>(
    State(service): State<AppState<S>>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ServiceError> {
    let Json(req) = body.map_err(invalid_body)?;
    let user = service.create_user(req.name).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn create_bill_handler<S: Store>(
    State(service): State<AppState<S>>,
    body: Result<Json<CreateBillRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Bill>), ServiceError> {
    let Json(req) = body.map_err(invalid_body)?;
    let bill = service
        .create_bill(req.user_id, req.amount, req.due_date)
        .await?;
    Ok((StatusCode::CREATED, Json(bill)))
}

async fn health_handler<S: Store>(State(service): State<AppState<S>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        store: service.store().backend_name().to_string(),
    })
}

// ─── Router ─────────────────────────────────────────────────────────────────

/// Full HTTP surface: `/api/v1` routes plus `/health`, with request tracing,
/// panic recovery and permissive CORS.
pub fn router<S: Store>(service: RewardService<S>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let api = Router::new()
        .route("/bills/{bill_id}/pay", post(pay_bill_handler::<S>))
        .route("/users", post(create_user_handler::<S>))
        .route("/bills", post(create_bill_handler::<S>));

    Router::new()
        .nest("/api/v1", api)
        .route("/health", get(health_handler::<S>))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(service))
}
