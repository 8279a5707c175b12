//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations
//! plus the `UnitOfWork` wrapper for multi-statement atomic flows. Methods
//! are organized across submodules by domain:
//! - `catalog.rs` - stall, item, and discount reads/writes
//! - `orders.rs` - order and order-line operations
//! - `wallet.rs` - balance and ledger-entry operations
//! - `idempotency.rs` - deduplication-token operations

mod catalog;
mod idempotency;
mod orders;
mod wallet;

use crate::domain::{Account, AccountId, Decimal, Stall, StallId, TimeMs};
use sqlx::sqlite::SqlitePool;
use sqlx::{Row, Sqlite, Transaction};

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// Access the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Open a unit of work: one transaction covering every statement issued
    /// through it. Dropping without `commit` rolls everything back.
    ///
    /// # Errors
    /// Returns an error if a transaction cannot be started.
    pub async fn unit_of_work(&self) -> Result<UnitOfWork, sqlx::Error> {
        Ok(UnitOfWork {
            tx: self.pool.begin().await?,
        })
    }

    /// Insert an account.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_account(&self, account: &Account) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO accounts (id, name, balance_cents, created_at_ms) VALUES (?, ?, ?, ?)",
        )
        .bind(account.id.as_str())
        .bind(&account.name)
        .bind(account.balance.as_cents())
        .bind(account.created_at.as_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get an account by id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_account(&self, id: &AccountId) -> Result<Option<Account>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, name, balance_cents, created_at_ms FROM accounts WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Account {
            id: AccountId::new(r.get("id")),
            name: r.get("name"),
            balance: Decimal::from_cents(r.get("balance_cents")),
            created_at: TimeMs::new(r.get("created_at_ms")),
        }))
    }

    /// Insert a stall.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_stall(&self, stall: &Stall) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO stalls (id, owner_account_id, name, created_at_ms) VALUES (?, ?, ?, ?)",
        )
        .bind(stall.id.as_str())
        .bind(stall.owner_account_id.as_str())
        .bind(&stall.name)
        .bind(stall.created_at.as_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get a stall by id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_stall(&self, id: &StallId) -> Result<Option<Stall>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, owner_account_id, name, created_at_ms FROM stalls WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Stall {
            id: StallId::new(r.get("id")),
            owner_account_id: AccountId::new(r.get("owner_account_id")),
            name: r.get("name"),
            created_at: TimeMs::new(r.get("created_at_ms")),
        }))
    }
}

/// One atomic unit of work over the repository.
///
/// All statements issued through a `UnitOfWork` commit together or not at
/// all; dropping it without calling [`UnitOfWork::commit`] rolls back.
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl UnitOfWork {
    /// Commit every statement issued through this unit.
    ///
    /// # Errors
    /// Returns an error if the commit fails; nothing is persisted.
    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }

    /// Explicitly roll back. Equivalent to dropping, but surfaces errors.
    ///
    /// # Errors
    /// Returns an error if the rollback itself fails.
    pub async fn rollback(self) -> Result<(), sqlx::Error> {
        self.tx.rollback().await
    }
}

#[cfg(test)]
pub(crate) async fn setup_test_repo() -> (Repository, tempfile::TempDir) {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = crate::db::migrations::init_db(&db_path)
        .await
        .expect("init_db failed");
    (Repository::new(pool), temp_dir)
}
