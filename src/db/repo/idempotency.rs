//! Deduplication-token operations for the repository.
//!
//! The admission policy lives in `orchestration::idempotency`; this module
//! only provides the storage primitives it is built from. Records are durable
//! so deduplication survives process restarts.

use crate::domain::{AccountId, IdempotencyRecord, OrderId, TimeMs};
use sqlx::Row;

use super::{Repository, UnitOfWork};

impl Repository {
    /// Insert an unresolved record for `(token, account)` if none exists.
    ///
    /// Returns `true` when this call created the record, `false` when one
    /// was already present.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_idempotency_key(
        &self,
        token: &str,
        account_id: &AccountId,
        now: TimeMs,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO idempotency_keys (token, account_id, order_id, created_at_ms)
            VALUES (?, ?, NULL, ?)
            ON CONFLICT(token, account_id) DO NOTHING
            "#,
        )
        .bind(token)
        .bind(account_id.as_str())
        .bind(now.as_ms())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Fetch the record for `(token, account)`.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_idempotency_key(
        &self,
        token: &str,
        account_id: &AccountId,
    ) -> Result<Option<IdempotencyRecord>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT token, account_id, order_id, created_at_ms FROM idempotency_keys WHERE token = ? AND account_id = ?",
        )
        .bind(token)
        .bind(account_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| IdempotencyRecord {
            token: r.get("token"),
            account_id: AccountId::new(r.get("account_id")),
            order_id: r.get::<Option<String>, _>("order_id").map(OrderId::new),
            created_at: TimeMs::new(r.get("created_at_ms")),
        }))
    }

    /// Take over a stale unresolved record by bumping its creation time.
    ///
    /// The compare-and-swap on `created_at_ms` ensures exactly one of several
    /// concurrent reclaimers wins. Returns `true` for the winner.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub async fn reclaim_idempotency_key(
        &self,
        token: &str,
        account_id: &AccountId,
        observed_created_at: TimeMs,
        now: TimeMs,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE idempotency_keys
            SET created_at_ms = ?
            WHERE token = ? AND account_id = ? AND order_id IS NULL AND created_at_ms = ?
            "#,
        )
        .bind(now.as_ms())
        .bind(token)
        .bind(account_id.as_str())
        .bind(observed_created_at.as_ms())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Drop an unresolved record so a later retry starts fresh.
    ///
    /// Used after a checkout fails cleanly; resolved records are never
    /// deleted.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    pub async fn release_idempotency_key(
        &self,
        token: &str,
        account_id: &AccountId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "DELETE FROM idempotency_keys WHERE token = ? AND account_id = ? AND order_id IS NULL",
        )
        .bind(token)
        .bind(account_id.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

impl UnitOfWork {
    /// Link a record to the order it produced.
    ///
    /// Called as the final step of the checkout transaction, so the link
    /// commits together with the order itself.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub async fn link_idempotency_key(
        &mut self,
        token: &str,
        account_id: &AccountId,
        order_id: &OrderId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE idempotency_keys SET order_id = ? WHERE token = ? AND account_id = ?",
        )
        .bind(order_id.as_str())
        .bind(token)
        .bind(account_id.as_str())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }
}
