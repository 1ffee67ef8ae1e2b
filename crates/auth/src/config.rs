//! Token configuration, loaded from the environment.

use anyhow::{Context, bail};
use chrono::Duration;

const DEFAULT_ACCESS_TTL: &str = "1h";
const DEFAULT_REFRESH_TTL: &str = "14d";
const DEFAULT_ISSUE_MARGIN_SECS: i64 = 60;

/// Keys, issuer and lifetimes consumed by [`crate::TokenCodec`].
#[derive(Clone)]
pub struct TokenConfig {
    /// `iss` claim; the application name.
    pub issuer: String,
    /// HMAC-SHA256 signing secret.
    pub signing_secret: String,
    /// Secret the identity binding is encrypted with. Must differ from
    /// `signing_secret`.
    pub encryption_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    /// Tokens are reported expired this long before their literal `exp`.
    pub issue_margin: Duration,
}

impl TokenConfig {
    pub fn new(
        issuer: impl Into<String>,
        signing_secret: impl Into<String>,
        encryption_secret: impl Into<String>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            signing_secret: signing_secret.into(),
            encryption_secret: encryption_secret.into(),
            access_ttl: Duration::hours(1),
            refresh_ttl: Duration::days(14),
            issue_margin: Duration::seconds(DEFAULT_ISSUE_MARGIN_SECS),
        }
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    pub fn with_issue_margin(mut self, margin: Duration) -> Self {
        self.issue_margin = margin;
        self
    }

    /// Load from process environment (and a `.env` file when present).
    ///
    /// | variable | default |
    /// |---|---|
    /// | `APP_NAME` | required |
    /// | `SECRET_JWT` | required |
    /// | `SECRET_KEY` | required |
    /// | `POLICY_TOKEN_ACCESS_EXPIRE` | `1h` |
    /// | `POLICY_TOKEN_REFRESH_EXPIRE` | `14d` |
    /// | `POLICY_TOKEN_ISSUE_MARGIN` | `60` (seconds) |
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. `from_env` delegates here.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> anyhow::Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{key} must be set"))
        };

        let access_ttl = parse_duration(
            &lookup("POLICY_TOKEN_ACCESS_EXPIRE").unwrap_or_else(|| DEFAULT_ACCESS_TTL.into()),
        )
        .context("POLICY_TOKEN_ACCESS_EXPIRE")?;
        let refresh_ttl = parse_duration(
            &lookup("POLICY_TOKEN_REFRESH_EXPIRE").unwrap_or_else(|| DEFAULT_REFRESH_TTL.into()),
        )
        .context("POLICY_TOKEN_REFRESH_EXPIRE")?;
        let issue_margin = match lookup("POLICY_TOKEN_ISSUE_MARGIN") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(Duration::try_seconds)
                .with_context(|| {
                    format!("POLICY_TOKEN_ISSUE_MARGIN: {raw:?} is not a number of seconds")
                })?,
            None => Duration::seconds(DEFAULT_ISSUE_MARGIN_SECS),
        };

        let config = Self {
            issuer: required("APP_NAME")?,
            signing_secret: required("SECRET_JWT")?,
            encryption_secret: required("SECRET_KEY")?,
            access_ttl,
            refresh_ttl,
            issue_margin,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.issuer.trim().is_empty() {
            bail!("issuer must not be empty");
        }
        if self.signing_secret.is_empty() || self.encryption_secret.is_empty() {
            bail!("signing and encryption secrets must not be empty");
        }
        if self.signing_secret == self.encryption_secret {
            bail!("encryption secret must differ from the signing secret");
        }
        if self.access_ttl <= Duration::zero() || self.refresh_ttl <= Duration::zero() {
            bail!("token lifetimes must be positive");
        }
        if self.issue_margin < Duration::zero() {
            bail!("issue margin must not be negative");
        }
        Ok(())
    }
}

impl core::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("issuer", &self.issuer)
            .field("signing_secret", &"<redacted>")
            .field("encryption_secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("issue_margin", &self.issue_margin)
            .finish()
    }
}

/// Parse a lifetime such as `90s`, `30m`, `1h`, `14d`, `2w` or bare seconds.
pub fn parse_duration(raw: &str) -> anyhow::Result<Duration> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    if digits.is_empty() {
        bail!("{raw:?} does not start with a number");
    }
    let value: i64 = digits
        .parse()
        .with_context(|| format!("{raw:?} is out of range"))?;

    let duration = match unit.trim() {
        "" | "s" | "sec" | "secs" => Duration::try_seconds(value),
        "m" | "min" | "mins" => Duration::try_minutes(value),
        "h" | "hr" | "hrs" => Duration::try_hours(value),
        "d" | "day" | "days" => Duration::try_days(value),
        "w" | "week" | "weeks" => Duration::try_weeks(value),
        other => bail!("unknown duration unit {other:?} in {raw:?}"),
    };
    duration.with_context(|| format!("{raw:?} is out of range"))
}
