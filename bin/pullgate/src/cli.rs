use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// PullGate registry token service
#[derive(Parser)]
#[command(name = "pullgate")]
#[command(version, about = "Short-lived, repository-scoped registry pull credentials")]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub(crate) verbose: u8,

    /// Log output format
    #[arg(long, value_enum, global = true, env = "PULLGATE_LOG_FORMAT")]
    pub(crate) log_format: Option<LogFormatArg>,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum LogFormatArg {
    Pretty,
    Json,
    Compact,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the token exchange and internal mint API
    Serve(ServeArgs),

    /// Mint a pull token offline and print registry credentials as JSON
    Mint {
        /// Workspace slug
        #[arg(long)]
        workspace: String,

        /// Application slug
        #[arg(long)]
        app: String,

        /// Pull token signing secret
        #[arg(long, env = "PULLGATE_PULL_TOKEN_SECRET", hide_env_values = true)]
        pull_token_secret: String,

        /// Registry host to report
        #[arg(long, env = "PULLGATE_REGISTRY_HOST", default_value = "localhost:5000")]
        registry_host: String,
    },

    /// Validate a pull token and print its claims
    Verify {
        /// The pull token
        token: String,

        /// Pull token signing secret
        #[arg(long, env = "PULLGATE_PULL_TOKEN_SECRET", hide_env_values = true)]
        pull_token_secret: String,
    },
}

#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Bind address
    #[arg(long, env = "PULLGATE_BIND", default_value = "0.0.0.0:5001")]
    pub(crate) bind: SocketAddr,

    /// Pull token signing secret (at least 32 bytes)
    #[arg(long, env = "PULLGATE_PULL_TOKEN_SECRET", hide_env_values = true)]
    pub(crate) pull_token_secret: String,

    /// Registry bearer token signing secret (at least 32 bytes, distinct)
    #[arg(long, env = "PULLGATE_BEARER_SECRET", hide_env_values = true)]
    pub(crate) bearer_secret: String,

    /// Bearer token issuer
    #[arg(long, env = "PULLGATE_BEARER_ISSUER", default_value = "pullgate")]
    pub(crate) bearer_issuer: String,

    /// Bearer token audience (registry service name)
    #[arg(long, env = "PULLGATE_BEARER_AUDIENCE", default_value = "pullgate-registry")]
    pub(crate) bearer_audience: String,

    /// Shared secret for the internal mint endpoint
    #[arg(long, env = "PULLGATE_INTERNAL_API_KEY", hide_env_values = true)]
    pub(crate) internal_api_key: String,

    /// Route of the internal mint endpoint
    #[arg(long, env = "PULLGATE_MINT_PATH", default_value = "/internal/registry/pull-token")]
    pub(crate) mint_path: String,

    /// Registry host returned to mint callers
    #[arg(long, env = "PULLGATE_REGISTRY_HOST", default_value = "localhost:5000")]
    pub(crate) registry_host: String,

    /// Realm advertised in the Basic-auth challenge
    #[arg(long, env = "PULLGATE_REALM", default_value = "PullGate Registry")]
    pub(crate) realm: String,

    /// JSON file mapping application ids to workspace/app slugs
    #[arg(long, env = "PULLGATE_CATALOG")]
    pub(crate) catalog: Option<PathBuf>,

    /// Disable Swagger UI
    #[arg(long)]
    pub(crate) no_swagger: bool,

    /// Disable rate limiting
    #[arg(long)]
    pub(crate) no_rate_limit: bool,
}
