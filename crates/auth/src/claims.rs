use serde::{Deserialize, Serialize};
use thiserror::Error;

use tenantgate_core::{Classify, ClientId, ErrorKind, UserId};

/// Kind of a token, carried in the `type` claim.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenKind {
    /// Short-lived credential bound to a user + client identity.
    Access,
    /// Renewal credential with no embedded identity.
    Refresh,
}

impl core::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TokenKind::Access => f.write_str("ACCESS"),
            TokenKind::Refresh => f.write_str("REFRESH"),
        }
    }
}

/// Token claims as carried on the wire.
///
/// Every field is optional on the way in because `decode` inspects tokens it
/// has not verified. `decrypted` is never read from the payload: it is only
/// ever filled in by the codec after decrypting `secret`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,

    /// Encrypted decimal form of `user_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TokenKind>,

    /// Issued-at, Unix seconds.
    #[serde(default)]
    pub iat: i64,

    /// Expiry, Unix seconds.
    #[serde(default)]
    pub exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Only present on the zeroed result of decoding an absent token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,

    /// Identity recovered from `secret`.
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub decrypted: Option<UserId>,
}

impl TokenClaims {
    /// The zeroed claims returned for an absent or undecodable token.
    pub fn zeroed() -> Self {
        Self {
            expires_in: Some(0),
            ..Default::default()
        }
    }

    /// ACCESS when an identity is present, REFRESH otherwise.
    ///
    /// The `type` claim is informational; classification always follows the
    /// identity fields.
    pub fn inferred_kind(&self) -> TokenKind {
        if self.user_id.is_some() {
            TokenKind::Access
        } else {
            TokenKind::Refresh
        }
    }

    /// Whether the embedded identity binding holds.
    ///
    /// - ACCESS: `user_id` must equal the id decrypted from `secret`.
    /// - REFRESH: neither `secret` nor `user_id` may be present.
    pub fn is_bound(&self) -> bool {
        match self.inferred_kind() {
            TokenKind::Access => self.user_id == self.decrypted,
            TokenKind::Refresh => self.secret.is_none() && self.user_id.is_none(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token has expired")]
    Expired,

    #[error("token identity binding failed: {0}")]
    Unverified(String),
}

impl TokenError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    pub fn unverified(msg: impl Into<String>) -> Self {
        Self::Unverified(msg.into())
    }
}

impl Classify for TokenError {
    fn kind(&self) -> ErrorKind {
        match self {
            TokenError::Malformed(_) => ErrorKind::TokenMalformed,
            TokenError::Expired => ErrorKind::TokenExpired,
            TokenError::Unverified(_) => ErrorKind::TokenUnverified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn access_claims(user: i64, decrypted: Option<i64>) -> TokenClaims {
        TokenClaims {
            user_id: Some(UserId::new(user)),
            client_id: Some(ClientId::new(3)),
            secret: Some("opaque".to_string()),
            kind: Some(TokenKind::Access),
            iat: 1_700_000_000,
            exp: 1_700_003_600,
            iss: Some("tenantgate".to_string()),
            expires_in: None,
            decrypted: decrypted.map(UserId::new),
        }
    }

    #[test]
    fn access_binding_requires_matching_decrypted_id() {
        assert!(access_claims(10, Some(10)).is_bound());
        assert!(!access_claims(10, Some(11)).is_bound());
        assert!(!access_claims(10, None).is_bound());
    }

    #[test]
    fn refresh_binding_requires_no_identity_fields() {
        let mut claims = TokenClaims {
            kind: Some(TokenKind::Refresh),
            ..Default::default()
        };
        assert_eq!(claims.inferred_kind(), TokenKind::Refresh);
        assert!(claims.is_bound());

        claims.secret = Some("smuggled".to_string());
        assert_eq!(claims.inferred_kind(), TokenKind::Refresh);
        assert!(!claims.is_bound());
    }

    #[test]
    fn decrypted_claim_is_ignored_on_the_wire() {
        let json = r#"{"user_id":5,"decrypted":5,"type":"ACCESS","iat":1,"exp":2}"#;
        let claims: TokenClaims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.decrypted, None);
        assert_eq!(claims.kind, Some(TokenKind::Access));
        assert!(!claims.is_bound());
    }

    #[test]
    fn zeroed_claims_serialize_expected_shape() {
        let value = serde_json::to_value(TokenClaims::zeroed()).unwrap();
        assert_eq!(value, serde_json::json!({ "expires_in": 0, "iat": 0, "exp": 0 }));
    }

    #[test]
    fn errors_classify_into_token_kinds() {
        assert_eq!(TokenError::malformed("x").kind(), ErrorKind::TokenMalformed);
        assert_eq!(TokenError::Expired.kind(), ErrorKind::TokenExpired);
        assert_eq!(TokenError::unverified("x").kind(), ErrorKind::TokenUnverified);
    }
}
