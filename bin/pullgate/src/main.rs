//! pullgate -- registry pull-token exchange service.
//!
//! `serve` runs the HTTP API; `mint` and `verify` are operator tools that
//! work offline with the pull-token secret.

mod cli;

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use cli::{Cli, Commands, LogFormatArg, ServeArgs};
use pullgate_api::config::{
    BearerTokenConfig, InternalConfig, PullTokenConfig, RateLimitConfig,
};
use pullgate_api::{
    ApiConfig, ApiServer, InMemoryCatalog, MintResponse, PullTokenIssuer, PullTokenValidator,
    PULL_TOKEN_USERNAME,
};
use pullgate_observability::{init_logging, LogFormat, LogLevel, LoggingConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let format = match cli.log_format {
        Some(LogFormatArg::Pretty) => LogFormat::Pretty,
        Some(LogFormatArg::Json) => LogFormat::Json,
        Some(LogFormatArg::Compact) => LogFormat::Compact,
        // pretty for terminals, JSON when piped into a collector
        None if std::io::stdout().is_terminal() => LogFormat::Pretty,
        None => LogFormat::Json,
    };

    let logging = LoggingConfig {
        level: LogLevel::from_verbosity(cli.verbose),
        format,
        ..Default::default()
    };
    let _guard = init_logging(&logging).context("Failed to initialize logging")?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?
        .block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve(args) => serve(args).await,
        Commands::Mint {
            workspace,
            app,
            pull_token_secret,
            registry_host,
        } => mint(&workspace, &app, &pull_token_secret, registry_host),
        Commands::Verify {
            token,
            pull_token_secret,
        } => verify(&token, &pull_token_secret),
    }
}

fn api_config(args: &ServeArgs) -> ApiConfig {
    ApiConfig {
        bind: args.bind,
        pull_token: PullTokenConfig {
            secret: args.pull_token_secret.clone(),
        },
        bearer: BearerTokenConfig {
            secret: args.bearer_secret.clone(),
            issuer: args.bearer_issuer.clone(),
            audience: args.bearer_audience.clone(),
        },
        internal: InternalConfig {
            api_key: args.internal_api_key.clone(),
            mint_path: args.mint_path.clone(),
        },
        registry_host: args.registry_host.clone(),
        realm: args.realm.clone(),
        swagger_enabled: !args.no_swagger,
        rate_limit: RateLimitConfig {
            enabled: !args.no_rate_limit,
            ..Default::default()
        },
        ..Default::default()
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let config = api_config(&args);
    config
        .validate()
        .context("Refusing to start with invalid configuration")?;

    let catalog = match &args.catalog {
        Some(path) => {
            let catalog = InMemoryCatalog::load(path)
                .await
                .with_context(|| format!("Failed to load catalog {}", path.display()))?;
            info!(
                path = %path.display(),
                apps = catalog.len().await,
                "Loaded application catalog"
            );
            catalog
        }
        None => {
            warn!("No catalog configured, every mint request will return 404");
            InMemoryCatalog::new()
        }
    };

    ApiServer::new(config, Arc::new(catalog))
        .run_with_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

fn mint(workspace: &str, app: &str, secret: &str, registry_host: String) -> Result<()> {
    let issuer = PullTokenIssuer::new(secret).context("Invalid pull token secret")?;
    let minted = issuer
        .issue(workspace, app)
        .context("Failed to mint pull token")?;

    info!(scope = %minted.claims.scope, "Minted pull token");

    let response = MintResponse {
        username: PULL_TOKEN_USERNAME.to_string(),
        password: minted.token,
        registry: registry_host,
        expires_at: minted.claims.expires_at(),
    };
    print_json(&response)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyOutput {
    scope: String,
    issued_at: chrono::DateTime<chrono::Utc>,
    expires_at: chrono::DateTime<chrono::Utc>,
}

fn verify(token: &str, secret: &str) -> Result<()> {
    let validator = PullTokenValidator::new(secret).context("Invalid pull token secret")?;
    let claims = validator
        .validate(token)
        .context("Pull token is not valid")?;

    print_json(&VerifyOutput {
        issued_at: claims.issued_at(),
        expires_at: claims.expires_at(),
        scope: claims.scope,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PULL: &str = "cli-pull-token-secret-0123456789abcdef";

    fn serve_args() -> ServeArgs {
        ServeArgs {
            bind: "127.0.0.1:5001".parse().unwrap(),
            pull_token_secret: PULL.to_string(),
            bearer_secret: "cli-bearer-token-secret-0123456789ab".to_string(),
            bearer_issuer: "pullgate".to_string(),
            bearer_audience: "registry".to_string(),
            internal_api_key: "key".to_string(),
            mint_path: "/internal/registry/pull-token".to_string(),
            registry_host: "registry.example.com".to_string(),
            realm: "PullGate Registry".to_string(),
            catalog: None,
            no_swagger: true,
            no_rate_limit: false,
        }
    }

    #[test]
    fn test_api_config_from_args() {
        let config = api_config(&serve_args());
        assert!(config.validate().is_ok());
        assert_eq!(config.bearer.audience, "registry");
        assert_eq!(config.registry_host, "registry.example.com");
        assert!(!config.swagger_enabled);
        assert!(config.rate_limit.enabled);
    }

    #[test]
    fn test_api_config_rejects_shared_secret() {
        let mut args = serve_args();
        args.bearer_secret = args.pull_token_secret.clone();
        assert!(api_config(&args).validate().is_err());
    }

    #[test]
    fn test_mint_and_verify() {
        assert!(mint("acme", "web", PULL, "registry.example.com".to_string()).is_ok());

        let token = PullTokenIssuer::new(PULL).unwrap().mint("acme", "web").unwrap();
        assert!(verify(&token, PULL).is_ok());
        assert!(verify(&token, "another-pull-token-secret-0123456789").is_err());
    }

    #[test]
    fn test_mint_rejects_weak_secret() {
        assert!(mint("acme", "web", "short", "r".to_string()).is_err());
    }
}
