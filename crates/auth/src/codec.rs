//! Issuance and inspection of signed, time-bounded tokens.
//!
//! Tokens are compact HS256 JWS strings. Access tokens additionally carry
//! `secret`, the user id encrypted under a key distinct from the signing key;
//! a token whose decrypted `secret` disagrees with its `user_id` is reported
//! unverified regardless of its signature.
//!
//! Two inspection contracts are kept apart:
//! - [`TokenCodec::decode`] / [`TokenCodec::parse`] never fail and do not check
//!   the signature. They serve logging and inspection.
//! - [`TokenCodec::verify`] / [`TokenCodec::authenticate`] check the signature
//!   and return typed errors. They serve request gating.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use tracing::{debug, warn};

use tenantgate_core::{ClientId, UserId};

use crate::cipher::{CipherError, SecretCipher};
use crate::claims::{TokenClaims, TokenError, TokenKind};
use crate::config::TokenConfig;
use crate::payload::{TokenPair, TokenPayload};

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("failed to seal identity binding: {0}")]
    Seal(#[from] CipherError),

    #[error("failed to sign token: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),

    #[error("token lifetime {0} is not positive or overflows the clock")]
    Lifetime(Duration),
}

/// Stateless token codec holding the process-wide keys.
///
/// Read-only after construction; share it behind an `Arc`.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    cipher: SecretCipher,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
    issue_margin: Duration,
}

impl TokenCodec {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.signing_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.signing_secret.as_bytes()),
            cipher: SecretCipher::new(&config.encryption_secret),
            issuer: config.issuer.clone(),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
            issue_margin: config.issue_margin,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn issue_margin(&self) -> Duration {
        self.issue_margin
    }

    // ── Issuance ────────────────────────────────────────────────────────────

    pub fn issue_access_token(
        &self,
        user_id: UserId,
        client_id: ClientId,
        ttl: Duration,
    ) -> Result<String, IssueError> {
        self.issue_access_token_at(user_id, client_id, ttl, Utc::now())
    }

    pub fn issue_access_token_at(
        &self,
        user_id: UserId,
        client_id: ClientId,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, IssueError> {
        debug!(%user_id, %client_id, "issuing access token");

        let claims = TokenClaims {
            user_id: Some(user_id),
            client_id: Some(client_id),
            secret: Some(self.cipher.seal_user_id(user_id)?),
            kind: Some(TokenKind::Access),
            ..self.timed_claims(ttl, now)?
        };
        self.sign(&claims)
    }

    pub fn issue_refresh_token(&self, ttl: Duration) -> Result<String, IssueError> {
        self.issue_refresh_token_at(ttl, Utc::now())
    }

    pub fn issue_refresh_token_at(
        &self,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, IssueError> {
        debug!("issuing refresh token");

        let claims = TokenClaims {
            kind: Some(TokenKind::Refresh),
            ..self.timed_claims(ttl, now)?
        };
        self.sign(&claims)
    }

    /// Issue an access + refresh pair using the configured lifetimes.
    pub fn issue_token_pair(
        &self,
        user_id: UserId,
        client_id: ClientId,
    ) -> Result<TokenPair, IssueError> {
        self.issue_token_pair_at(user_id, client_id, Utc::now())
    }

    pub fn issue_token_pair_at(
        &self,
        user_id: UserId,
        client_id: ClientId,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, IssueError> {
        Ok(TokenPair {
            access_token: self.issue_access_token_at(user_id, client_id, self.access_ttl, now)?,
            refresh_token: self.issue_refresh_token_at(self.refresh_ttl, now)?,
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    fn timed_claims(&self, ttl: Duration, now: DateTime<Utc>) -> Result<TokenClaims, IssueError> {
        let expires_at = Some(ttl)
            .filter(|ttl| *ttl > Duration::zero())
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or(IssueError::Lifetime(ttl))?;

        Ok(TokenClaims {
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: Some(self.issuer.clone()),
            ..Default::default()
        })
    }

    fn sign(&self, claims: &TokenClaims) -> Result<String, IssueError> {
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.encoding,
        )?)
    }

    // ── Best-effort inspection ──────────────────────────────────────────────

    /// Read claims without checking the signature.
    ///
    /// An absent, empty or undecodable token yields [`TokenClaims::zeroed`].
    pub fn decode(&self, token: Option<&str>) -> TokenClaims {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return TokenClaims::zeroed();
        };

        self.try_decode(token).unwrap_or_else(|e| {
            debug!(error = %e, "token could not be decoded");
            TokenClaims::zeroed()
        })
    }

    /// Decode and classify a token. Never fails; see [`TokenPayload`].
    pub fn parse(&self, token: Option<&str>) -> TokenPayload {
        self.parse_at(token, Utc::now())
    }

    pub fn parse_at(&self, token: Option<&str>, now: DateTime<Utc>) -> TokenPayload {
        let raw = token.filter(|t| !t.is_empty());
        let claims = match raw {
            None => TokenClaims::zeroed(),
            Some(raw) => match self.try_decode(raw) {
                Ok(claims) => claims,
                Err(e) => {
                    warn!(error = %e, "token parse failed");
                    return TokenPayload::failed(token, e);
                }
            },
        };

        let kind = claims.inferred_kind();
        let verified = claims.is_bound();
        let expired = self.is_expired(&claims, now);

        TokenPayload {
            kind: Some(kind),
            ok: verified && !expired,
            expired,
            verified,
            registered: false,
            decoded: claims,
            token: token.map(str::to_owned),
            error: None,
        }
    }

    fn try_decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &inspect_validation())
            .map_err(|e| TokenError::malformed(e.to_string()))?;

        let mut claims = data.claims;
        self.unseal(&mut claims)?;
        Ok(claims)
    }

    // ── Strict verification ─────────────────────────────────────────────────

    /// Check signature, structure, issuer and literal expiry.
    ///
    /// The identity binding is decrypted into `decrypted` but not compared;
    /// use [`TokenCodec::authenticate`] for the full gate.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        let data = jsonwebtoken::decode::<TokenClaims>(
            token,
            &self.decoding,
            &strict_validation(&self.issuer),
        )
        .map_err(|e| TokenError::malformed(e.to_string()))?;

        let mut claims = data.claims;
        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        self.unseal(&mut claims)?;
        Ok(claims)
    }

    /// Full request gate: [`verify`](Self::verify), then the identity binding,
    /// then the margin-adjusted expiry.
    pub fn authenticate(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.authenticate_at(token, Utc::now())
    }

    pub fn authenticate_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, TokenError> {
        let claims = self.verify_at(token, now)?;

        if !claims.is_bound() {
            warn!(
                kind = %claims.inferred_kind(),
                user_id = ?claims.user_id,
                "token identity binding mismatch"
            );
            return Err(TokenError::unverified(match claims.inferred_kind() {
                TokenKind::Access => "user_id does not match the sealed identity",
                TokenKind::Refresh => "refresh token carries identity fields",
            }));
        }
        if self.is_expired(&claims, now) {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn unseal(&self, claims: &mut TokenClaims) -> Result<(), TokenError> {
        if let Some(secret) = claims.secret.as_deref() {
            let user_id = self
                .cipher
                .open_user_id(secret)
                .map_err(|e| TokenError::unverified(e.to_string()))?;
            claims.decrypted = Some(user_id);
        }
        Ok(())
    }

    /// `exp - now < issue_margin`, in milliseconds.
    fn is_expired(&self, claims: &TokenClaims, now: DateTime<Utc>) -> bool {
        let expires_at_ms = claims.exp.saturating_mul(1000);
        expires_at_ms.saturating_sub(now.timestamp_millis()) < self.issue_margin.num_milliseconds()
    }
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("issue_margin", &self.issue_margin)
            .finish_non_exhaustive()
    }
}

/// Structure only: no signature, no time or issuer checks.
fn inspect_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation
}

/// Signature, algorithm and issuer. Expiry is checked against the caller's
/// clock in `verify_at`.
fn strict_validation(issuer: &str) -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.set_issuer(&[issuer]);
    validation.set_required_spec_claims(&["exp", "iss"]);
    validation
}
