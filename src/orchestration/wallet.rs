//! Wallet ledger: the only entry points that move an account's balance.
//!
//! Every mutation appends exactly one ledger entry in the same unit of work
//! that moves the denormalized balance, so the two representations cannot
//! diverge. The balance check and the write are a single conditional UPDATE,
//! which makes concurrent debits against one account safe: at most one of
//! two racing debits can pass a check the balance only covers once.

use crate::db::{Repository, UnitOfWork};
use crate::domain::{AccountId, Decimal, EntryKind, OrderId, TimeMs, WalletEntry};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("account not found: {0}")]
    AccountNotFound(String),
    #[error("insufficient balance to cover {required}")]
    InsufficientFunds { required: Decimal },
    #[error("amount must be positive")]
    NonPositiveAmount,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Balance queries and administrative credits, plus the debit primitive used
/// inside the checkout transaction.
#[derive(Clone)]
pub struct WalletLedger {
    repo: Arc<Repository>,
}

impl WalletLedger {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    /// Current balance, read off the denormalized field.
    ///
    /// # Errors
    /// Returns `AccountNotFound` for an unknown account.
    pub async fn balance(&self, account_id: &AccountId) -> Result<Decimal, WalletError> {
        let account = self
            .repo
            .get_account(account_id)
            .await?
            .ok_or_else(|| WalletError::AccountNotFound(account_id.to_string()))?;
        Ok(account.balance)
    }

    /// Ledger history for an account, newest first.
    ///
    /// # Errors
    /// Returns `AccountNotFound` for an unknown account.
    pub async fn entries(&self, account_id: &AccountId) -> Result<Vec<WalletEntry>, WalletError> {
        if self.repo.get_account(account_id).await?.is_none() {
            return Err(WalletError::AccountNotFound(account_id.to_string()));
        }
        Ok(self.repo.wallet_entries(account_id).await?)
    }

    /// Administrative topup. Credits the balance and appends the matching
    /// entry atomically; returns the new balance.
    ///
    /// # Errors
    /// Returns `NonPositiveAmount` or `AccountNotFound`; nothing is persisted
    /// on error.
    pub async fn credit(
        &self,
        account_id: &AccountId,
        amount: Decimal,
        note: Option<String>,
    ) -> Result<Decimal, WalletError> {
        if !amount.is_positive() {
            return Err(WalletError::NonPositiveAmount);
        }
        let amount = amount.round2();
        let now = TimeMs::now();

        let mut uow = self.repo.unit_of_work().await?;
        if !uow.credit_balance(account_id, amount.as_cents()).await? {
            return Err(WalletError::AccountNotFound(account_id.to_string()));
        }
        uow.insert_wallet_entry(&WalletEntry {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: account_id.clone(),
            amount,
            kind: EntryKind::Topup,
            order_id: None,
            note,
            created_at: now,
        })
        .await?;
        let new_balance = uow
            .balance_cents(account_id)
            .await?
            .ok_or_else(|| WalletError::AccountNotFound(account_id.to_string()))?;
        uow.commit().await?;

        info!(
            account = account_id.as_str(),
            amount = %amount,
            "wallet credited"
        );
        Ok(Decimal::from_cents(new_balance))
    }

    /// Debit inside the caller's unit of work, linked to the order being
    /// paid for. Fails without partial effect when the balance is short.
    ///
    /// # Errors
    /// `InsufficientFunds` when the balance does not cover `amount`;
    /// `AccountNotFound` for an unknown account.
    pub async fn debit_within(
        uow: &mut UnitOfWork,
        account_id: &AccountId,
        amount: Decimal,
        order_id: &OrderId,
        now: TimeMs,
    ) -> Result<WalletEntry, WalletError> {
        let amount = amount.round2();
        if amount.is_negative() {
            return Err(WalletError::NonPositiveAmount);
        }

        if !uow.try_debit_balance(account_id, amount.as_cents()).await? {
            return match uow.balance_cents(account_id).await? {
                None => Err(WalletError::AccountNotFound(account_id.to_string())),
                Some(_) => Err(WalletError::InsufficientFunds { required: amount }),
            };
        }

        let entry = WalletEntry {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: account_id.clone(),
            amount: -amount,
            kind: EntryKind::Debit,
            order_id: Some(order_id.clone()),
            note: Some(format!("payment for order {}", order_id)),
            created_at: now,
        };
        uow.insert_wallet_entry(&entry).await?;
        Ok(entry)
    }
}
