use bon_common::bill::ParseBillStatusError;
use bon_common::identity::{BillId, UserId};

/// Failures raised by a [`Store`](crate::store::Store) implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("failed to build connection pool: {0}")]
    PoolBuild(#[from] deadpool_postgres::BuildError),

    /// Foreign key on `user_id` rejected the write.
    #[error("user {0} does not exist")]
    UnknownUser(UserId),

    #[error("corrupt row: {0}")]
    Corrupt(#[from] ParseBillStatusError),
}

/// Errors surfaced by the payment and reward service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("bill {0} has already been paid")]
    InvalidState(BillId),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn bill_not_found(id: BillId) -> Self {
        ServiceError::NotFound {
            entity: "bill",
            id: id.0,
        }
    }

    pub fn user_not_found(id: UserId) -> Self {
        ServiceError::NotFound {
            entity: "user",
            id: id.0,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
