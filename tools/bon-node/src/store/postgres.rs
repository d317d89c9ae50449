use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::error::SqlState;
use tokio_postgres::{NoTls, Row};

use bon_common::bill::{Bill, BillStatus, NewBill};
use bon_common::identity::{BillId, RewardId, UserId};
use bon_common::reward::{NewReward, Reward};
use bon_common::user::{NewUser, User};

use super::{Store, StoreResult};
use crate::error::StoreError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id          BIGSERIAL PRIMARY KEY,
    name        TEXT NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS bills (
    id           BIGSERIAL PRIMARY KEY,
    user_id      BIGINT NOT NULL REFERENCES users(id),
    amount       BIGINT NOT NULL,
    due_date     TIMESTAMPTZ NOT NULL,
    payment_date TIMESTAMPTZ,
    status       TEXT NOT NULL,
    CHECK ((status = 'UNPAID') = (payment_date IS NULL))
);

CREATE INDEX IF NOT EXISTS bills_user_payment_idx
    ON bills (user_id, payment_date DESC);

CREATE TABLE IF NOT EXISTS rewards (
    id          BIGSERIAL PRIMARY KEY,
    user_id     BIGINT NOT NULL REFERENCES users(id),
    description TEXT NOT NULL,
    issued_at   TIMESTAMPTZ NOT NULL
);
";

const BILL_COLUMNS: &str = "id, user_id, amount, due_date, payment_date, status";

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    /// Build a pool for `database_url` and make sure the tables exist.
    pub async fn connect(database_url: &str, pool_size: usize) -> StoreResult<Self> {
        let pg_config: tokio_postgres::Config = database_url.parse()?;
        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let pool = Pool::builder(manager).max_size(pool_size).build()?;

        let store = PgStore { pool };
        store.create_tables().await?;
        Ok(store)
    }

    async fn create_tables(&self) -> StoreResult<()> {
        let client = self.pool.get().await?;
        client.batch_execute(SCHEMA).await?;
        tracing::debug!("schema ready");
        Ok(())
    }
}

fn bill_from_row(row: &Row) -> StoreResult<Bill> {
    let status: String = row.try_get("status")?;
    Ok(Bill {
        id: BillId(row.try_get("id")?),
        user_id: UserId(row.try_get("user_id")?),
        amount: row.try_get("amount")?,
        due_date: row.try_get("due_date")?,
        payment_date: row.try_get("payment_date")?,
        status: status.parse::<BillStatus>()?,
    })
}

/// Map a foreign key violation on `user_id` to [`StoreError::UnknownUser`].
fn map_insert_error(err: tokio_postgres::Error, user: UserId) -> StoreError {
    if err.code() == Some(&SqlState::FOREIGN_KEY_VIOLATION) {
        StoreError::UnknownUser(user)
    } else {
        StoreError::Postgres(err)
    }
}

impl Store for PgStore {
    async fn get_bill(&self, id: BillId) -> StoreResult<Option<Bill>> {
        let client = self.pool.get().await?;
        let query = format!("SELECT {BILL_COLUMNS} FROM bills WHERE id = $1");
        let row = client.query_opt(&query, &[&id.0]).await?;
        row.as_ref().map(bill_from_row).transpose()
    }

    async fn update_bill(&self, bill: &Bill) -> StoreResult<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                "UPDATE bills SET payment_date = $1, status = $2 WHERE id = $3",
                &[&bill.payment_date, &bill.status.as_str(), &bill.id.0],
            )
            .await?;
        Ok(())
    }

    async fn last_paid_bills(&self, user: UserId, limit: usize) -> StoreResult<Vec<Bill>> {
        let client = self.pool.get().await?;
        let query = format!(
            "SELECT {BILL_COLUMNS} FROM bills \
             WHERE user_id = $1 AND status <> 'UNPAID' \
             ORDER BY payment_date DESC, id DESC \
             LIMIT $2"
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = client.query(&query, &[&user.0, &limit]).await?;
        rows.iter().map(bill_from_row).collect()
    }

    async fn create_reward(&self, reward: NewReward) -> StoreResult<Reward> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "INSERT INTO rewards (user_id, description, issued_at) \
                 VALUES ($1, $2, $3) RETURNING id",
                &[&reward.user_id.0, &reward.description, &reward.issued_at],
            )
            .await
            .map_err(|e| map_insert_error(e, reward.user_id))?;
        Ok(reward.into_reward(RewardId(row.try_get(0)?)))
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "INSERT INTO users (name, created_at) VALUES ($1, $2) RETURNING id",
                &[&user.name, &user.created_at],
            )
            .await?;
        Ok(user.into_user(UserId(row.try_get(0)?)))
    }

    async fn create_bill(&self, bill: NewBill) -> StoreResult<Bill> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "INSERT INTO bills (user_id, amount, due_date, status) \
                 VALUES ($1, $2, $3, $4) RETURNING id",
                &[
                    &bill.user_id.0,
                    &bill.amount,
                    &bill.due_date,
                    &BillStatus::Unpaid.as_str(),
                ],
            )
            .await
            .map_err(|e| map_insert_error(e, bill.user_id))?;
        Ok(bill.into_bill(BillId(row.try_get(0)?)))
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
