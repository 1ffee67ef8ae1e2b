//! `tenantgate-core` — identifiers and failure taxonomy shared by the token
//! and authorization crates.
//!
//! This crate contains no I/O and no crypto.

pub mod assert;
pub mod error;
pub mod id;

pub use assert::{ensure, ensure_some};
pub use error::{Classify, ErrorKind, InvalidId};
pub use id::{ClientId, TenantId, UserId};
