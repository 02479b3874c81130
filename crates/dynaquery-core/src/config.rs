//! Query executor configuration.

use std::env;

use serde::Deserialize;

/// Page size used when a query does not set one.
pub const DEFAULT_LIMIT: i32 = 100;

/// Query executor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Page size when `QueryOptions::limit` is zero or negative.
    pub default_limit: i32,
}

impl QueryConfig {
    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Override fields from `lookup`.
    ///
    /// Unparseable or non-positive limits fall back to [`DEFAULT_LIMIT`].
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup("DYNAQUERY_DEFAULT_LIMIT") {
            self.default_limit = positive_i32(&raw).unwrap_or(DEFAULT_LIMIT);
        }
        self
    }

    /// This configuration with a non-positive limit replaced by [`DEFAULT_LIMIT`].
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.default_limit <= 0 {
            self.default_limit = DEFAULT_LIMIT;
        }
        self
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
        }
    }
}

fn positive_i32(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok().filter(|v| *v > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit_from(raw: &str) -> i32 {
        QueryConfig::default()
            .with_overrides(|key| (key == "DYNAQUERY_DEFAULT_LIMIT").then(|| raw.to_owned()))
            .default_limit
    }

    #[test]
    fn test_should_default_to_one_hundred_items_per_page() {
        assert_eq!(QueryConfig::default().default_limit, 100);
    }

    #[test]
    fn test_should_read_positive_limit_override() {
        assert_eq!(limit_from("25"), 25);
        assert_eq!(limit_from(" 7 "), 7);
    }

    #[test]
    fn test_should_fall_back_on_invalid_limit() {
        for raw in ["0", "-3", "lots", ""] {
            assert_eq!(limit_from(raw), 100, "raw value {raw:?}");
        }
    }

    #[test]
    fn test_should_normalize_non_positive_limit() {
        let config = QueryConfig { default_limit: 0 }.normalized();
        assert_eq!(config.default_limit, 100);
    }
}
