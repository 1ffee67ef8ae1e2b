//! `tenantgate-auth` — token codec and authorization evaluator.
//!
//! Both halves are stateless and decoupled from HTTP and storage: callers pass
//! in bearer strings and resolved actors, and get back claims, verdicts and
//! typed errors.

pub mod actor;
pub mod authorize;
pub mod bearer;
pub mod cipher;
pub mod claims;
pub mod codec;
pub mod config;
pub mod payload;
pub mod permissions;

pub use actor::Actor;
pub use authorize::{AuthorizationContext, AuthzError, Axis, AxisExplanation, Grant};
pub use bearer::extract_bearer;
pub use cipher::{CipherError, SecretCipher};
pub use claims::{TokenClaims, TokenError, TokenKind};
pub use codec::{IssueError, TokenCodec};
pub use config::TokenConfig;
pub use payload::{TokenPair, TokenPayload};
pub use permissions::{Action, MaskSetting, Permission};
