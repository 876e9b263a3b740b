//! Dispatcher configuration.
//!
//! The dispatcher never reads the environment itself; [`DispatcherConfig::from_env`]
//! is there for binaries that want to.

use crate::endpoint::Endpoint;
use crate::error::ConfigError;

/// Default signing region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default signing service (Amazon OpenSearch / Elasticsearch Service).
pub const DEFAULT_SERVICE: &str = "es";

/// Configuration for a [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DispatcherConfig {
    /// Host or URL of the search domain.
    pub endpoint: String,
    /// Region the domain lives in.
    pub region: String,
    /// Service name used in the signing scope (`es`, or `aoss` for serverless).
    pub service: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            region: DEFAULT_REGION.to_owned(),
            service: DEFAULT_SERVICE.to_owned(),
        }
    }
}

impl DispatcherConfig {
    /// Create a configuration for `endpoint` in `region`, signing for `es`.
    pub fn new(endpoint: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            region: region.into(),
            ..Self::default()
        }
    }

    /// Override the signing service name.
    #[must_use]
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `ES_ENDPOINT` | *(empty)* |
    /// | `AWS_REGION`, then `AWS_DEFAULT_REGION` | `us-east-1` |
    /// | `ES_SERVICE` | `es` |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("ES_ENDPOINT") {
            config.endpoint = v;
        }
        if let Some(v) = lookup("AWS_REGION").or_else(|| lookup("AWS_DEFAULT_REGION")) {
            config.region = v;
        }
        if let Some(v) = lookup("ES_SERVICE") {
            config.service = v;
        }

        config
    }

    /// Check the configuration and parse the endpoint.
    pub fn validate(&self) -> Result<Endpoint, ConfigError> {
        if self.region.trim().is_empty() {
            return Err(ConfigError::MissingRegion);
        }
        if self.service.trim().is_empty() {
            return Err(ConfigError::MissingService);
        }
        self.endpoint.parse()
    }
}
