//! Failure classification shared by the token codec and the authorization
//! evaluator.
//!
//! The core only classifies a failure; mapping it to a user-visible response is
//! the caller's job. [`ErrorKind::status_code`] gives the conventional HTTP
//! status for callers that want the usual mapping.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of failure produced by the core.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Structurally invalid token or signature mismatch.
    TokenMalformed,
    /// Signature valid but past the (margin-adjusted) expiry.
    TokenExpired,
    /// Signature valid but the embedded identity binding does not hold.
    TokenUnverified,
    /// An authorization axis denied a correctly-authenticated actor.
    Forbidden,
    /// Malformed authorization input (e.g. a super-user changing their own state).
    BadRequest,
    /// Read-scope resolution has no addressable actor or tenant.
    NotFound,
}

impl ErrorKind {
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::TokenMalformed | ErrorKind::TokenExpired | ErrorKind::TokenUnverified => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::TokenMalformed => "token_malformed",
            ErrorKind::TokenExpired => "token_expired",
            ErrorKind::TokenUnverified => "token_unverified",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::NotFound => "not_found",
        }
    }

    /// Whether the failure concerns the credential rather than the actor's rights.
    pub fn is_authentication(self) -> bool {
        matches!(
            self,
            ErrorKind::TokenMalformed | ErrorKind::TokenExpired | ErrorKind::TokenUnverified
        )
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Implemented by every error type the core returns.
pub trait Classify {
    fn kind(&self) -> ErrorKind;
}

/// An identifier failed to parse.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid identifier {name}: {detail}")]
pub struct InvalidId {
    pub name: &'static str,
    pub detail: String,
}

impl InvalidId {
    pub fn new(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            detail: detail.into(),
        }
    }
}

impl Classify for InvalidId {
    fn kind(&self) -> ErrorKind {
        ErrorKind::BadRequest
    }
}
