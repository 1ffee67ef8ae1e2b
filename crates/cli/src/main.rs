use anyhow::Context;
use clap::Parser;
use serde_json::json;
use tenantgate_auth::{TokenCodec, TokenConfig};
use tenantgate_core::{ClientId, UserId};

mod cli;

use cli::{Cli, Commands, IssueCommands};

fn main() -> anyhow::Result<()> {
    tenantgate_observability::init();

    let args = Cli::parse();
    let config = TokenConfig::from_env().context("failed to load token configuration")?;
    let codec = TokenCodec::new(&config);

    let output = match args.command {
        Commands::Issue { command } => issue(&codec, &config, command)?,
        Commands::Inspect { token, registered } => {
            let payload = codec.parse(Some(&token)).with_registered(registered);
            serde_json::to_value(&payload)?
        }
        Commands::Verify { token } => match codec.authenticate(&token) {
            Ok(claims) => serde_json::to_value(&claims)?,
            Err(err) => {
                tracing::warn!(error = %err, "token rejected");
                anyhow::bail!("token rejected: {err}");
            }
        },
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn issue(
    codec: &TokenCodec,
    config: &TokenConfig,
    command: IssueCommands,
) -> anyhow::Result<serde_json::Value> {
    let value = match command {
        IssueCommands::Access { user, client, ttl } => {
            let ttl = ttl.unwrap_or(config.access_ttl);
            let token =
                codec.issue_access_token(UserId::new(user), ClientId::new(client), ttl)?;
            json!({ "access_token": token, "expires_in": ttl.num_seconds() })
        }
        IssueCommands::Refresh { ttl } => {
            let ttl = ttl.unwrap_or(config.refresh_ttl);
            let token = codec.issue_refresh_token(ttl)?;
            json!({ "refresh_token": token, "expires_in": ttl.num_seconds() })
        }
        IssueCommands::Pair { user, client } => {
            let pair = codec.issue_token_pair(UserId::new(user), ClientId::new(client))?;
            serde_json::to_value(&pair)?
        }
    };

    tracing::info!(issuer = codec.issuer(), "issued token");
    Ok(value)
}
