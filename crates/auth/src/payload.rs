use serde::{Deserialize, Serialize};

use crate::claims::{TokenClaims, TokenError, TokenKind};

/// Result of inspecting a token with [`crate::TokenCodec::parse`].
///
/// Parsing never fails; a failure while decoding is recorded in `error` and
/// leaves `ok` false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPayload {
    #[serde(rename = "type")]
    pub kind: Option<TokenKind>,
    pub ok: bool,
    pub expired: bool,
    pub verified: bool,
    /// Set by callers that keep a store of issued tokens; never computed here.
    pub registered: bool,
    pub decoded: TokenClaims,
    pub token: Option<String>,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<TokenError>,
}

impl TokenPayload {
    pub(crate) fn failed(token: Option<&str>, error: TokenError) -> Self {
        Self {
            kind: None,
            ok: false,
            expired: false,
            verified: false,
            registered: false,
            decoded: TokenClaims::zeroed(),
            token: token.map(str::to_owned),
            error: Some(error),
        }
    }

    pub fn with_registered(mut self, registered: bool) -> Self {
        self.registered = registered;
        self
    }

    pub fn is_access(&self) -> bool {
        self.kind == Some(TokenKind::Access)
    }

    pub fn is_refresh(&self) -> bool {
        self.kind == Some(TokenKind::Refresh)
    }
}

fn serialize_error<S>(error: &Option<TokenError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Access + refresh token issued together at sign-in or renewal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}
