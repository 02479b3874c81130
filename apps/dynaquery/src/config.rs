//! Application configuration: TOML file, then environment overrides.
//!
//! There is no `.env` loader. The TOML file takes its place, and a dotenv
//! file can still be applied by exporting it into the process environment
//! first, e.g. `set -a; . ./.env; set +a`. Its `APP_NAME`, `APP_ENV`,
//! `AWS_REGION` and `AWS_PROFILE` keys are the same variables read here.

use std::path::Path;

use anyhow::{Context, Result};
use dynaquery_aws::AwsConfig;
use dynaquery_core::QueryConfig;
use serde::Deserialize;

/// Everything the CLI needs before it can run a query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application name, reported in the startup log line.
    pub app_name: String,
    /// Deployment environment name.
    pub app_env: String,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// DynamoDB connection settings.
    pub aws: AwsConfig,
    /// Executor settings.
    pub query: QueryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "dynaquery".to_owned(),
            app_env: "local".to_owned(),
            log_level: "info".to_owned(),
            aws: AwsConfig::default(),
            query: QueryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load `path` if it exists, then apply process environment overrides.
    ///
    /// A missing file is not an error; defaults are used instead.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            _ => Self::default(),
        };
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Override fields from `lookup`. Empty values are ignored.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(name) = get("APP_NAME") {
            self.app_name = name;
        }
        if let Some(env) = get("APP_ENV") {
            self.app_env = env;
        }
        if let Some(level) = get("LOG_LEVEL") {
            self.log_level = level;
        }
        self.aws = self.aws.with_overrides(&lookup);
        self.query = self.query.with_overrides(&lookup);
        self
    }
}
