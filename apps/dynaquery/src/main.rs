//! dynaquery - run a DynamoDB secondary-index query described as JSON.
//!
//! The query is a `QueryOptions` document: table, index, partition key,
//! optional sort key, optional `Where` filter tree and projection. Matching
//! items are printed to stdout as a JSON array in DynamoDB JSON; logs go to
//! stderr.
//!
//! # Usage
//!
//! ```text
//! dynaquery --profile staging queries/active-pika.json
//! cat query.json | dynaquery --pretty -
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DYNAQUERY_CONFIG` | `dynaquery.toml` | Optional TOML configuration file |
//! | `APP_NAME` | `dynaquery` | Application name reported at startup |
//! | `APP_ENV` | `local` | Deployment environment name |
//! | `AWS_REGION` | `ap-southeast-1` | Region (falls back to `DEFAULT_REGION`) |
//! | `AWS_PROFILE` | *(unset)* | Named credential profile |
//! | `DYNAMODB_ENDPOINT_URL` | *(unset)* | Endpoint override, e.g. DynamoDB Local |
//! | `DYNAQUERY_DEFAULT_LIMIT` | `100` | Page size when the query sets none |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod config;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use dynaquery_aws::DynamoDbBackend;
use dynaquery_core::{QueryContext, QueryExecutor, QueryOptions};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

/// Command-line arguments. Flags win over the config file and environment.
#[derive(Parser, Debug)]
#[command(name = "dynaquery", version)]
#[command(about = "Run a JSON-described DynamoDB index query and print the matching items")]
struct Cli {
    /// TOML configuration file. Ignored when it does not exist.
    #[arg(short, long, env = "DYNAQUERY_CONFIG", default_value = "dynaquery.toml")]
    config: PathBuf,

    /// AWS region.
    #[arg(long, env = "AWS_REGION")]
    region: Option<String>,

    /// Named credential profile.
    #[arg(long, env = "AWS_PROFILE")]
    profile: Option<String>,

    /// DynamoDB endpoint override.
    #[arg(long, env = "DYNAMODB_ENDPOINT_URL")]
    endpoint_url: Option<String>,

    /// Stop fetching pages after this many seconds.
    #[arg(long)]
    timeout: Option<u64>,

    /// Pretty-print the result.
    #[arg(long)]
    pretty: bool,

    /// QueryOptions JSON document, or `-` for stdin.
    query: PathBuf,
}

impl Cli {
    fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(region) = &self.region {
            config.aws.region.clone_from(region);
        }
        if let Some(profile) = &self.profile {
            config.aws.profile = Some(profile.clone());
        }
        if let Some(url) = &self.endpoint_url {
            config.aws.endpoint_url = Some(url.clone());
        }
        config
    }
}

/// Initialize the tracing subscriber on stderr.
///
/// `RUST_LOG` takes precedence over `log_level` when set.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn read_options(path: &Path) -> Result<QueryOptions> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read query from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read query file: {}", path.display()))?
    };
    serde_json::from_str(&content).context("failed to parse query options")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.apply(AppConfig::load(Some(cli.config.as_path()))?);
    init_tracing(&config.log_level)?;

    info!(
        app_name = %config.app_name,
        app_env = %config.app_env,
        region = %config.aws.region,
        profile = ?config.aws.profile,
        "starting dynaquery"
    );

    let options = read_options(&cli.query)?;
    let backend = DynamoDbBackend::connect(&config.aws).await;
    let executor = QueryExecutor::new(Arc::new(backend), config.query.clone());

    let mut ctx = QueryContext::new();
    if let Some(secs) = cli.timeout {
        ctx = ctx.with_timeout(Duration::from_secs(secs));
    }
    let interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current page");
            interrupt.cancel();
        }
    });

    let items = match executor.query(&ctx, &options).await {
        Ok(items) => items,
        Err(err) => {
            if err.is_transient() {
                warn!("transient backend failure, the query may succeed if retried");
            }
            return Err(anyhow::Error::new(err)
                .context(format!("query on {}/{} failed", options.table, options.index)));
        }
    };

    let mut stdout = std::io::stdout().lock();
    if cli.pretty {
        serde_json::to_writer_pretty(&mut stdout, &items)?;
    } else {
        serde_json::to_writer(&mut stdout, &items)?;
    }
    writeln!(stdout)?;

    Ok(())
}
