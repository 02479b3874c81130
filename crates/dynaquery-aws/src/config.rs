//! Connection settings.

use std::env;

use serde::Deserialize;

/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "ap-southeast-1";

/// Where and as whom to connect.
///
/// The profile is handed to the SDK loader directly; the process environment
/// is never modified.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    /// AWS region.
    pub region: String,
    /// Named credential profile.
    pub profile: Option<String>,
    /// Endpoint override, e.g. DynamoDB Local.
    pub endpoint_url: Option<String>,
}

impl AwsConfig {
    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Override fields with whatever the process environment sets.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    /// Override fields from `lookup`.
    ///
    /// `AWS_REGION` wins over `DEFAULT_REGION`. Empty values are ignored.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(region) = get("AWS_REGION").or_else(|| get("DEFAULT_REGION")) {
            self.region = region;
        }
        if let Some(profile) = get("AWS_PROFILE") {
            self.profile = Some(profile);
        }
        if let Some(url) = get("DYNAMODB_ENDPOINT_URL") {
            self.endpoint_url = Some(url);
        }
        self
    }

    /// Build an SDK client. Credentials resolve through the default provider
    /// chain, scoped to [`profile`](Self::profile) when set.
    pub async fn connect(&self) -> aws_sdk_dynamodb::Client {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(self.region.clone()));
        if let Some(profile) = &self.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(url) = &self.endpoint_url {
            loader = loader.endpoint_url(url);
        }
        let sdk_config = loader.load().await;
        aws_sdk_dynamodb::Client::new(&sdk_config)
    }
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_owned(),
            profile: None,
            endpoint_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_should_default_to_singapore_without_profile() {
        let config = AwsConfig::default();
        assert_eq!(config.region, "ap-southeast-1");
        assert!(config.profile.is_none());
        assert!(config.endpoint_url.is_none());
    }

    #[test]
    fn test_should_prefer_aws_region_over_default_region() {
        let config = AwsConfig::default().with_overrides(lookup(&[
            ("DEFAULT_REGION", "us-east-1"),
            ("AWS_REGION", "eu-west-1"),
        ]));
        assert_eq!(config.region, "eu-west-1");

        let config = AwsConfig::default().with_overrides(lookup(&[("DEFAULT_REGION", "us-east-1")]));
        assert_eq!(config.region, "us-east-1");
    }

    #[test]
    fn test_should_read_profile_and_endpoint() {
        let config = AwsConfig::default().with_overrides(lookup(&[
            ("AWS_PROFILE", "staging"),
            ("DYNAMODB_ENDPOINT_URL", "http://localhost:8000"),
        ]));
        assert_eq!(config.profile.as_deref(), Some("staging"));
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:8000"));
    }

    #[test]
    fn test_should_ignore_empty_overrides() {
        let base = AwsConfig {
            region: "us-west-2".to_owned(),
            profile: Some("dev".to_owned()),
            endpoint_url: None,
        };
        let config = base
            .clone()
            .with_overrides(lookup(&[("AWS_REGION", ""), ("AWS_PROFILE", "  ")]));
        assert_eq!(config, base);
    }
}
