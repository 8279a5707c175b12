//! Domain primitives: entity id newtypes and TimeMs.

use serde::{Deserialize, Serialize};

/// Time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeMs(pub i64);

impl TimeMs {
    /// Create a TimeMs from milliseconds.
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        TimeMs(chrono::Utc::now().timestamp_millis())
    }

    /// Get the underlying milliseconds value.
    pub fn as_ms(&self) -> i64 {
        self.0
    }
}

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap an existing id string.
            pub fn new(id: String) -> Self {
                $name(id)
            }

            /// Mint a fresh random id.
            pub fn fresh() -> Self {
                $name(uuid::Uuid::new_v4().to_string())
            }

            /// Get the id as a string reference.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(
    /// Identifies an account (a student with prepaid funds).
    AccountId
);
id_newtype!(
    /// Identifies a stall (a seller unit).
    StallId
);
id_newtype!(
    /// Identifies a catalog item.
    ItemId
);
id_newtype!(
    /// Identifies a discount.
    DiscountId
);
id_newtype!(
    /// Identifies an order.
    OrderId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ids_are_unique() {
        assert_ne!(OrderId::fresh(), OrderId::fresh());
    }

    #[test]
    fn test_time_ms_ordering() {
        assert!(TimeMs::new(1) < TimeMs::new(2));
    }

    #[test]
    fn test_id_display_roundtrip() {
        let id = AccountId::new("acct-1".to_string());
        assert_eq!(id.to_string(), "acct-1");
        assert_eq!(id.as_str(), "acct-1");
    }
}
