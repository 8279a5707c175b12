//! Idempotency guard for order-creation requests.
//!
//! Deduplicates retried submissions so a client that resends the same
//! `(token, account)` pair cannot create a second order or a second debit.
//! Records live in the database, so the guarantee holds across process
//! restarts and multiple server instances.

use crate::db::Repository;
use crate::domain::{AccountId, OrderId, TimeMs};
use std::sync::Arc;
use tracing::info;

/// Outcome of admitting a request under a deduplication token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// First sight of this token; the caller owns the request.
    Admitted,
    /// A previous request with this token already produced an order.
    Resolved(OrderId),
    /// A concurrent request holds this token; the caller should back off.
    InProgress,
}

/// Admission policy over durable `(token, account)` records.
#[derive(Clone)]
pub struct IdempotencyGuard {
    repo: Arc<Repository>,
    stale_after_ms: i64,
}

impl IdempotencyGuard {
    pub fn new(repo: Arc<Repository>, stale_after_ms: i64) -> Self {
        Self {
            repo,
            stale_after_ms,
        }
    }

    /// Admit a request, short-circuiting duplicates.
    ///
    /// First sight creates an unresolved record. On a repeat: a resolved
    /// record yields [`Admission::Resolved`] with the prior order; an
    /// unresolved record younger than the staleness threshold yields
    /// [`Admission::InProgress`]; an older one is reclaimed via a
    /// compare-and-swap on its creation time, so exactly one retrier takes
    /// over after a crash left the record orphaned.
    ///
    /// # Errors
    /// Returns an error if a storage operation fails.
    pub async fn admit(
        &self,
        token: &str,
        account_id: &AccountId,
        now: TimeMs,
    ) -> Result<Admission, sqlx::Error> {
        if self.repo.insert_idempotency_key(token, account_id, now).await? {
            return Ok(Admission::Admitted);
        }

        let Some(record) = self.repo.get_idempotency_key(token, account_id).await? else {
            // The holder released the record between our insert and read;
            // take it over like a fresh request.
            return Ok(if self.repo.insert_idempotency_key(token, account_id, now).await? {
                Admission::Admitted
            } else {
                Admission::InProgress
            });
        };

        if let Some(order_id) = record.order_id {
            return Ok(Admission::Resolved(order_id));
        }

        let age_ms = now.as_ms() - record.created_at.as_ms();
        if age_ms > self.stale_after_ms
            && self
                .repo
                .reclaim_idempotency_key(token, account_id, record.created_at, now)
                .await?
        {
            info!(
                token,
                account = account_id.as_str(),
                age_ms,
                "reclaimed stale idempotency record"
            );
            return Ok(Admission::Admitted);
        }

        Ok(Admission::InProgress)
    }

    /// Drop an unresolved record after a cleanly failed request, so the
    /// client's retry is not locked out until the staleness threshold.
    pub async fn release(&self, token: &str, account_id: &AccountId) {
        if let Err(e) = self.repo.release_idempotency_key(token, account_id).await {
            tracing::warn!(
                token,
                account = account_id.as_str(),
                error = %e,
                "failed to release idempotency record"
            );
        }
    }
}
