use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::UserId;

/// A bill payer. Created once and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A user that has not been persisted yet; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            name: self.name,
            created_at: self.created_at,
        }
    }
}
