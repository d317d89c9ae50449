//! Persistence capability consumed by the payment and reward service.
//!
//! The service never holds state between requests; everything durable goes
//! through a [`Store`]. Two implementations ship with the node:
//!
//! - [`PgStore`] — PostgreSQL through a `deadpool-postgres` pool
//! - [`MemoryStore`] — concurrent in-process maps, used for tests and
//!   for running without a database

mod memory;
mod postgres;

use std::future::Future;

use bon_common::bill::{Bill, NewBill};
use bon_common::identity::{BillId, UserId};
use bon_common::reward::{NewReward, Reward};
use bon_common::user::{NewUser, User};

use crate::error::StoreError;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Operations the service needs from durable storage.
///
/// Each call is a discrete statement; no call spans another, so a
/// read followed by a write is not atomic.
pub trait Store: Send + Sync + 'static {
    fn get_bill(&self, id: BillId) -> impl Future<Output = StoreResult<Option<Bill>>> + Send;

    /// Overwrite `payment_date` and `status` of the bill with `bill.id`.
    fn update_bill(&self, bill: &Bill) -> impl Future<Output = StoreResult<()>> + Send;

    /// Up to `limit` paid bills of `user`, most recent payment first.
    /// Unpaid bills are never returned.
    fn last_paid_bills(
        &self,
        user: UserId,
        limit: usize,
    ) -> impl Future<Output = StoreResult<Vec<Bill>>> + Send;

    fn create_reward(&self, reward: NewReward) -> impl Future<Output = StoreResult<Reward>> + Send;

    fn create_user(&self, user: NewUser) -> impl Future<Output = StoreResult<User>> + Send;

    /// Fails with [`StoreError::UnknownUser`] if the owner does not exist.
    fn create_bill(&self, bill: NewBill) -> impl Future<Output = StoreResult<Bill>> + Send;

    /// Short label for logs and the health endpoint.
    fn backend_name(&self) -> &'static str;
}
