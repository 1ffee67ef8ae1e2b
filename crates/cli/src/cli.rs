use chrono::Duration;
use clap::{Parser, Subcommand};

/// tenantgate: issue and inspect tenant-scoped bearer tokens
#[derive(Parser)]
#[command(name = "tenantgate", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Issue signed tokens
    Issue {
        #[command(subcommand)]
        command: IssueCommands,
    },

    /// Decode a token without rejecting it and print the inspection payload
    Inspect {
        token: String,
        /// Mark the payload as registered with the caller's session store
        #[arg(long)]
        registered: bool,
    },

    /// Strictly authenticate a token; exits non-zero on failure
    Verify { token: String },
}

#[derive(Subcommand)]
pub enum IssueCommands {
    /// Issue an access token bound to a user
    Access {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        client: i64,
        /// Lifetime such as `30m` or `1h`; defaults to the configured access TTL
        #[arg(long, value_parser = parse_ttl)]
        ttl: Option<Duration>,
    },
    /// Issue an anonymous refresh token
    Refresh {
        #[arg(long, value_parser = parse_ttl)]
        ttl: Option<Duration>,
    },
    /// Issue an access + refresh pair with the configured lifetimes
    Pair {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        client: i64,
    },
}

fn parse_ttl(raw: &str) -> Result<Duration, String> {
    let ttl = tenantgate_auth::config::parse_duration(raw).map_err(|e| format!("{e:#}"))?;
    if ttl <= Duration::zero() {
        return Err(format!("lifetime {raw:?} must be positive"));
    }
    Ok(ttl)
}
