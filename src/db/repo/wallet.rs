//! Balance and ledger-entry operations for the repository.

use crate::domain::{AccountId, Decimal, EntryKind, OrderId, TimeMs, WalletEntry};
use sqlx::Row;
use std::str::FromStr;

use super::{Repository, UnitOfWork};

impl Repository {
    /// List an account's ledger entries, newest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn wallet_entries(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<WalletEntry>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, amount_cents, kind, order_id, note, created_at_ms
            FROM wallet_entries
            WHERE account_id = ?
            ORDER BY created_at_ms DESC, rowid DESC
            "#,
        )
        .bind(account_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| {
                let kind_str: String = r.get("kind");
                WalletEntry {
                    id: r.get("id"),
                    account_id: AccountId::new(r.get("account_id")),
                    amount: Decimal::from_cents(r.get("amount_cents")),
                    kind: EntryKind::from_str(&kind_str).unwrap_or(EntryKind::Topup),
                    order_id: r
                        .get::<Option<String>, _>("order_id")
                        .map(OrderId::new),
                    note: r.get("note"),
                    created_at: TimeMs::new(r.get("created_at_ms")),
                }
            })
            .collect())
    }

    /// Sum of all ledger entries for an account, in cents.
    ///
    /// Used by reconciliation checks against the denormalized balance.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn wallet_entry_sum_cents(
        &self,
        account_id: &AccountId,
    ) -> Result<i64, sqlx::Error> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(amount_cents), 0) AS total FROM wallet_entries WHERE account_id = ?",
        )
        .bind(account_id.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("total"))
    }
}

impl UnitOfWork {
    /// Conditionally debit an account: the balance only moves when it covers
    /// the amount, in one atomic statement.
    ///
    /// Returns `false` when the balance was insufficient (or the account does
    /// not exist); nothing is modified in that case.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub async fn try_debit_balance(
        &mut self,
        account_id: &AccountId,
        amount_cents: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET balance_cents = balance_cents - ?
            WHERE id = ? AND balance_cents >= ?
            "#,
        )
        .bind(amount_cents)
        .bind(account_id.as_str())
        .bind(amount_cents)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Credit an account's balance.
    ///
    /// Returns `false` when the account does not exist.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub async fn credit_balance(
        &mut self,
        account_id: &AccountId,
        amount_cents: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE accounts SET balance_cents = balance_cents + ? WHERE id = ?")
            .bind(amount_cents)
            .bind(account_id.as_str())
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Read an account's balance inside this unit of work.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn balance_cents(
        &mut self,
        account_id: &AccountId,
    ) -> Result<Option<i64>, sqlx::Error> {
        let row = sqlx::query("SELECT balance_cents FROM accounts WHERE id = ?")
            .bind(account_id.as_str())
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(|r| r.get("balance_cents")))
    }

    /// Append one ledger entry. Entries are never updated or deleted.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_wallet_entry(&mut self, entry: &WalletEntry) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO wallet_entries (id, account_id, amount_cents, kind, order_id, note, created_at_ms)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(entry.account_id.as_str())
        .bind(entry.amount.as_cents())
        .bind(entry.kind.as_str())
        .bind(entry.order_id.as_ref().map(|o| o.as_str().to_string()))
        .bind(&entry.note)
        .bind(entry.created_at.as_ms())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }
}
