//! Identifier newtypes shared across the crate.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

numeric_id!(
    /// Registered user identifier.
    UserId,
    "U"
);
numeric_id!(
    /// Parking zone identifier.
    ZoneId,
    "Z"
);
numeric_id!(
    /// Physical spot identifier.
    SpotId,
    "S"
);

/// Globally unique order number: a second-resolution timestamp followed by a
/// full v4 uuid (`ORD-20250301080000` + 32 uppercase hex digits).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNo(String);

impl OrderNo {
    /// Mint a new order number stamped with `at`.
    pub fn generate(at: DateTime<Utc>) -> Self {
        let mut suffix = uuid::Uuid::encode_buffer();
        let suffix = uuid::Uuid::new_v4().simple().encode_upper(&mut suffix);
        Self(format!("ORD-{}{suffix}", at.format("%Y%m%d%H%M%S")))
    }

    /// Borrow the raw string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderNo {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for OrderNo {
    fn from(value: String) -> Self {
        Self(value)
    }
}
