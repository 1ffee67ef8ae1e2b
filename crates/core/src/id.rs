//! Strongly-typed identifiers used across the token and authorization core.
//!
//! Identifiers are the integer primary keys of the storage layer. They are
//! carried in token claims as plain JSON numbers.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::InvalidId;

/// Identifier of a tenant (multi-tenant boundary).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(i64);

/// Identifier of a user (actor identity).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

/// Identifier of the API client a token was issued to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(i64);

macro_rules! impl_int_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = InvalidId;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|e| InvalidId::new($name, format!("{s:?}: {e}")))
            }
        }
    };
}

impl_int_newtype!(TenantId, "TenantId");
impl_int_newtype!(UserId, "UserId");
impl_int_newtype!(ClientId, "ClientId");

impl UserId {
    /// Actor id reported for trusted internal callers running in force mode
    /// without a bound actor.
    pub const SYSTEM: UserId = UserId(0);
}
