//! Discount resolution.
//!
//! The selection policy lives here and nowhere else: every caller that needs
//! "the discount for this item right now" goes through [`resolve`].

use crate::domain::{Discount, TimeMs};

/// Pick the applicable discount for an item at `as_of`.
///
/// Candidates whose window does not contain `as_of` are ignored. Among the
/// rest, the most recently created discount wins; an exact creation-time tie
/// prefers the higher percentage. Returns `None` when nothing applies, in
/// which case the list price stands.
///
/// Deterministic and read-only: the same candidates and instant always yield
/// the same choice, so two lines for the same item within one checkout agree.
pub fn resolve(candidates: &[Discount], as_of: TimeMs) -> Option<&Discount> {
    let mut best: Option<&Discount> = None;
    for d in candidates {
        if !d.is_active_at(as_of) {
            continue;
        }
        best = match best {
            None => Some(d),
            Some(b) => {
                if d.created_at > b.created_at
                    || (d.created_at == b.created_at && d.percent > b.percent)
                {
                    Some(d)
                } else {
                    Some(b)
                }
            }
        };
    }
    best
}
