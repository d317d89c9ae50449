use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::identity::{BillId, UserId};

/// Lifecycle state of a bill. Only moves forward, out of `Unpaid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillStatus {
    Unpaid,
    PaidOnTime,
    PaidLate,
}

impl BillStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BillStatus::Unpaid => "UNPAID",
            BillStatus::PaidOnTime => "PAID_ON_TIME",
            BillStatus::PaidLate => "PAID_LATE",
        }
    }

    /// Status a bill takes when paid at `paid_at`. Paying exactly at the due
    /// instant still counts as on time.
    pub fn for_payment(paid_at: DateTime<Utc>, due_date: DateTime<Utc>) -> BillStatus {
        if paid_at > due_date {
            BillStatus::PaidLate
        } else {
            BillStatus::PaidOnTime
        }
    }

    pub fn is_paid(self) -> bool {
        self != BillStatus::Unpaid
    }

    /// Returns true if transitioning from self to `next` is valid.
    pub fn can_transition_to(self, next: BillStatus) -> bool {
        matches!(
            (self, next),
            (BillStatus::Unpaid, BillStatus::PaidOnTime) | (BillStatus::Unpaid, BillStatus::PaidLate)
        )
    }
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised status text read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseBillStatusError(pub String);

impl fmt::Display for ParseBillStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown bill status '{}'", self.0)
    }
}

impl std::error::Error for ParseBillStatusError {}

impl FromStr for BillStatus {
    type Err = ParseBillStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNPAID" => Ok(BillStatus::Unpaid),
            "PAID_ON_TIME" => Ok(BillStatus::PaidOnTime),
            "PAID_LATE" => Ok(BillStatus::PaidLate),
            other => Err(ParseBillStatusError(other.to_string())),
        }
    }
}

/// Attempt to pay a bill that already left `Unpaid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlreadyPaid {
    pub bill: BillId,
    pub status: BillStatus,
}

impl fmt::Display for AlreadyPaid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bill {} has already been paid ({})", self.bill, self.status)
    }
}

impl std::error::Error for AlreadyPaid {}

/// A bill owed by exactly one user.
///
/// `payment_date` is set if and only if `status` is not `Unpaid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: BillId,
    pub user_id: UserId,
    /// Amount in minor currency units.
    pub amount: i64,
    pub due_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<DateTime<Utc>>,
    pub status: BillStatus,
}

impl Bill {
    /// Stamp the bill paid at `paid_at` and classify it against the due date.
    /// Leaves the bill untouched if it was already paid.
    pub fn pay(&mut self, paid_at: DateTime<Utc>) -> Result<BillStatus, AlreadyPaid> {
        let next = BillStatus::for_payment(paid_at, self.due_date);
        if !self.status.can_transition_to(next) {
            return Err(AlreadyPaid {
                bill: self.id,
                status: self.status,
            });
        }
        self.payment_date = Some(paid_at);
        self.status = next;
        Ok(next)
    }
}

/// A bill that has not been persisted yet. Always starts `Unpaid`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBill {
    pub user_id: UserId,
    pub amount: i64,
    pub due_date: DateTime<Utc>,
}

impl NewBill {
    pub fn into_bill(self, id: BillId) -> Bill {
        Bill {
            id,
            user_id: self.user_id,
            amount: self.amount,
            due_date: self.due_date,
            payment_date: None,
            status: BillStatus::Unpaid,
        }
    }
}

/// Parse a due date given either as RFC 3339 or as a bare `YYYY-MM-DD`.
/// A bare date means the last microsecond of that UTC day.
pub fn parse_due_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_micro_opt(23, 59, 59, 999_999))
        .map(|dt| dt.and_utc())
}

/// Serde adapter for [`parse_due_date`].
pub fn deserialize_due_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_due_date(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!(
            "invalid due date '{raw}': expected RFC 3339 or YYYY-MM-DD"
        ))
    })
}
