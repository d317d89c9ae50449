use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use dashmap::DashMap;

use bon_common::bill::{Bill, NewBill};
use bon_common::identity::{BillId, RewardId, UserId};
use bon_common::reward::{NewReward, Reward};
use bon_common::user::{NewUser, User};

use super::{Store, StoreResult};
use crate::error::StoreError;

/// In-process store backed by concurrent maps.
///
/// Ids start at 1 and are handed out monotonically per table, like a
/// database sequence. The `user_id` foreign key is enforced on bill and
/// reward inserts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<UserId, User>,
    bills: DashMap<BillId, Bill>,
    rewards: DashMap<RewardId, Reward>,
    next_user: AtomicI64,
    next_bill: AtomicI64,
    next_reward: AtomicI64,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewards issued to `user`, oldest first.
    pub fn rewards_for(&self, user: UserId) -> Vec<Reward> {
        let mut rewards: Vec<Reward> = self
            .rewards
            .iter()
            .filter(|r| r.user_id == user)
            .map(|r| r.value().clone())
            .collect();
        rewards.sort_by_key(|r| r.id);
        rewards
    }

    /// Number of successful mutating calls since creation.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn next_id(counter: &AtomicI64) -> i64 {
        counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    fn ensure_user(&self, user: UserId) -> StoreResult<()> {
        if self.users.contains_key(&user) {
            Ok(())
        } else {
            Err(StoreError::UnknownUser(user))
        }
    }
}

impl Store for MemoryStore {
    async fn get_bill(&self, id: BillId) -> StoreResult<Option<Bill>> {
        Ok(self.bills.get(&id).map(|b| b.value().clone()))
    }

    async fn update_bill(&self, bill: &Bill) -> StoreResult<()> {
        // An UPDATE matching no row is not an error.
        if let Some(mut stored) = self.bills.get_mut(&bill.id) {
            stored.payment_date = bill.payment_date;
            stored.status = bill.status;
        }
        self.record_write();
        Ok(())
    }

    async fn last_paid_bills(&self, user: UserId, limit: usize) -> StoreResult<Vec<Bill>> {
        let mut paid: Vec<Bill> = self
            .bills
            .iter()
            .filter(|b| b.user_id == user && b.status.is_paid())
            .map(|b| b.value().clone())
            .collect();
        paid.sort_by(|a, b| {
            b.payment_date
                .cmp(&a.payment_date)
                .then_with(|| b.id.cmp(&a.id))
        });
        paid.truncate(limit);
        Ok(paid)
    }

    async fn create_reward(&self, reward: NewReward) -> StoreResult<Reward> {
        self.ensure_user(reward.user_id)?;
        let id = RewardId(Self::next_id(&self.next_reward));
        let reward = reward.into_reward(id);
        self.rewards.insert(id, reward.clone());
        self.record_write();
        Ok(reward)
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let id = UserId(Self::next_id(&self.next_user));
        let user = user.into_user(id);
        self.users.insert(id, user.clone());
        self.record_write();
        Ok(user)
    }

    async fn create_bill(&self, bill: NewBill) -> StoreResult<Bill> {
        self.ensure_user(bill.user_id)?;
        let id = BillId(Self::next_id(&self.next_bill));
        let bill = bill.into_bill(id);
        self.bills.insert(id, bill.clone());
        self.record_write();
        Ok(bill)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
