//! Process-wide tracing setup shared by tenantgate binaries.

pub mod tracing;

pub use crate::tracing::{LogFormat, init, init_with};
