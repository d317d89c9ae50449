//! Bill payment and on-time streak rewards.
//!
//! Paying a bill stamps it with the payment time, classifies it against the
//! due date, persists it, and then evaluates the owner's streak. The payment
//! is the durable fact; reward evaluation is best-effort and its failures are
//! only logged.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use bon_common::bill::{Bill, BillStatus, NewBill};
use bon_common::identity::{BillId, UserId};
use bon_common::reward::NewReward;
use bon_common::user::{NewUser, User};

use crate::error::{ServiceError, ServiceResult, StoreError};
use crate::store::{Store, StoreResult};

/// Consecutive on-time payments needed to earn a reward.
pub const REQUIRED_ON_TIME_PAYMENTS: usize = 3;

/// What every reward currently is.
pub const REWARD_DESCRIPTION: &str = "$10 Amazon Gift Card";

/// Result of a successful payment.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentOutcome {
    pub bill: Bill,
    pub reward_message: Option<String>,
}

/// Payment processor and reward evaluator over an injected [`Store`].
pub struct RewardService<S> {
    store: Arc<S>,
}

impl<S> Clone for RewardService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> RewardService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Pay `bill_id` now.
    pub async fn pay_bill(&self, bill_id: BillId) -> ServiceResult<PaymentOutcome> {
        self.pay_bill_at(bill_id, Utc::now()).await
    }

    /// Pay `bill_id` as of `paid_at`. A reward earned by this payment is
    /// stamped with `paid_at` too, which is the current time via [`Self::pay_bill`].
    ///
    /// Read, check and write are separate store calls with no transaction
    /// around them: two concurrent payments of the same bill can both see it
    /// unpaid and both succeed.
    // TODO: run the read-check-write inside a store transaction (SELECT ... FOR UPDATE on Postgres).
    pub async fn pay_bill_at(
        &self,
        bill_id: BillId,
        paid_at: DateTime<Utc>,
    ) -> ServiceResult<PaymentOutcome> {
        let mut bill = self
            .store
            .get_bill(bill_id)
            .await?
            .ok_or_else(|| ServiceError::bill_not_found(bill_id))?;

        let status = bill
            .pay(paid_at)
            .map_err(|already| ServiceError::InvalidState(already.bill))?;

        self.store.update_bill(&bill).await?;
        tracing::info!(bill_id = %bill.id, user_id = %bill.user_id, %status, "bill paid");

        let reward_message = match self.evaluate_reward(bill.user_id, paid_at).await {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(user_id = %bill.user_id, error = %e, "reward check failed");
                None
            }
        };

        Ok(PaymentOutcome {
            bill,
            reward_message,
        })
    }

    /// Issue a reward to `user` if their last paid bills form an on-time
    /// streak. Returns the congratulation message when one was issued.
    ///
    /// The same trailing window is checked on every call, so a streak that
    /// stays qualifying earns again on each evaluation.
    pub async fn check_for_reward(&self, user: UserId) -> StoreResult<Option<String>> {
        self.evaluate_reward(user, Utc::now()).await
    }

    async fn evaluate_reward(
        &self,
        user: UserId,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<String>> {
        let last_bills = self
            .store
            .last_paid_bills(user, REQUIRED_ON_TIME_PAYMENTS)
            .await?;

        if last_bills.len() < REQUIRED_ON_TIME_PAYMENTS {
            tracing::info!(
                user_id = %user,
                paid = last_bills.len(),
                "not eligible for reward yet"
            );
            return Ok(None);
        }

        if let Some(late) = last_bills
            .iter()
            .find(|b| b.status != BillStatus::PaidOnTime)
        {
            tracing::info!(user_id = %user, bill_id = %late.id, "streak broken by late payment");
            return Ok(None);
        }

        let reward = self
            .store
            .create_reward(NewReward {
                user_id: user,
                description: REWARD_DESCRIPTION.to_string(),
                issued_at: now,
            })
            .await?;
        tracing::info!(user_id = %user, reward_id = %reward.id, "reward issued");

        Ok(Some(format!(
            "Congratulations! You've earned a {REWARD_DESCRIPTION}."
        )))
    }

    pub async fn create_user(&self, name: String) -> ServiceResult<User> {
        let user = self
            .store
            .create_user(NewUser {
                name,
                created_at: Utc::now(),
            })
            .await?;
        tracing::info!(user_id = %user.id, "user created");
        Ok(user)
    }

    pub async fn create_bill(
        &self,
        user_id: UserId,
        amount: i64,
        due_date: DateTime<Utc>,
    ) -> ServiceResult<Bill> {
        let bill = self
            .store
            .create_bill(NewBill {
                user_id,
                amount,
                due_date,
            })
            .await
            .map_err(|e| match e {
                StoreError::UnknownUser(id) => ServiceError::user_not_found(id),
                other => ServiceError::Store(other),
            })?;
        tracing::info!(bill_id = %bill.id, %user_id, "bill created");
        Ok(bill)
    }
}
