use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{RewardId, UserId};

/// An incentive issued to a user. Append-only: never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub id: RewardId,
    pub user_id: UserId,
    pub description: String,
    pub issued_at: DateTime<Utc>,
}

/// A reward that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReward {
    pub user_id: UserId,
    pub description: String,
    pub issued_at: DateTime<Utc>,
}

impl NewReward {
    pub fn into_reward(self, id: RewardId) -> Reward {
        Reward {
            id,
            user_id: self.user_id,
            description: self.description,
            issued_at: self.issued_at,
        }
    }
}
