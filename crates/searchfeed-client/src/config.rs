//! Service connection configuration.

use crate::error::{ClientError, Result};

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default REST API version sent with every request
const DEFAULT_API_VERSION: &str = "2024-07-01";

/// Default requests per second limit
#[cfg(feature = "rate-limit")]
const DEFAULT_REQUESTS_PER_SECOND: u32 = 10;

/// How the admin API key is supplied.
#[derive(Debug, Clone)]
pub enum ApiKeyAuth {
    /// Direct API key
    Key(String),
    /// Read the API key from an environment variable
    Env(String),
}

impl ApiKeyAuth {
    /// Resolve the API key from the auth method.
    pub fn resolve(&self) -> Result<String> {
        match self {
            ApiKeyAuth::Key(key) => Ok(key.clone()),
            ApiKeyAuth::Env(var_name) => {
                std::env::var(var_name).map_err(|_| ClientError::MissingEnvVar(var_name.clone()))
            }
        }
    }
}

/// Per-batch action sent on the wire with every document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexAction {
    /// Insert, replacing any existing document with the same key
    #[default]
    Upload,
    /// Update fields of an existing document; fails for unknown keys
    Merge,
    /// Update when the key exists, insert otherwise
    MergeOrUpload,
    /// Remove the document with this key
    Delete,
}

impl IndexAction {
    /// Wire name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexAction::Upload => "upload",
            IndexAction::Merge => "merge",
            IndexAction::MergeOrUpload => "mergeOrUpload",
            IndexAction::Delete => "delete",
        }
    }
}

/// Configuration for connecting to a search service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Service base URL (e.g., "https://my-service.example.net")
    pub endpoint: String,
    /// Target index name
    pub index: String,
    /// Admin API key, if the service requires one
    pub auth: Option<ApiKeyAuth>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// REST API version sent as a query parameter
    pub api_version: String,
    /// Requests per second limit (when rate-limit feature enabled)
    #[cfg(feature = "rate-limit")]
    pub requests_per_second: u32,
}

impl ServiceConfig {
    /// Create a config for the given service and index.
    pub fn new(endpoint: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            index: index.into(),
            auth: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            api_version: DEFAULT_API_VERSION.to_string(),
            #[cfg(feature = "rate-limit")]
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
        }
    }

    /// Create config from environment variables.
    ///
    /// Expected variables:
    /// - `SEARCHFEED_ENDPOINT` - service base URL
    /// - `SEARCHFEED_INDEX` - target index name
    /// - `SEARCHFEED_API_KEY` - admin API key (optional)
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("SEARCHFEED_ENDPOINT")
            .map_err(|_| ClientError::MissingEnvVar("SEARCHFEED_ENDPOINT".into()))?;
        let index = std::env::var("SEARCHFEED_INDEX")
            .map_err(|_| ClientError::MissingEnvVar("SEARCHFEED_INDEX".into()))?;

        let auth = std::env::var("SEARCHFEED_API_KEY").ok().map(ApiKeyAuth::Key);

        let mut config = Self::new(endpoint, index);
        config.auth = auth;
        Ok(config)
    }

    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.auth = Some(ApiKeyAuth::Key(key.into()));
        self
    }

    /// Read the API key from an environment variable at client build time.
    pub fn api_key_env(mut self, var_name: impl Into<String>) -> Self {
        self.auth = Some(ApiKeyAuth::Env(var_name.into()));
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the REST API version.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Set the requests per second limit (when rate-limit feature enabled).
    #[cfg(feature = "rate-limit")]
    pub fn with_requests_per_second(mut self, rps: u32) -> Self {
        self.requests_per_second = rps;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ServiceConfig::new("https://search.example.net", "hotels");
        assert_eq!(config.endpoint, "https://search.example.net");
        assert_eq!(config.index, "hotels");
        assert!(config.auth.is_none());
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.api_version, "2024-07-01");
    }

    #[test]
    fn test_config_builder() {
        let config = ServiceConfig::new("https://search.example.net", "hotels")
            .api_key("admin-key")
            .with_timeout(60)
            .with_api_version("2023-11-01");
        assert!(matches!(config.auth, Some(ApiKeyAuth::Key(_))));
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.api_version, "2023-11-01");
    }

    #[test]
    fn test_auth_resolve() {
        let auth = ApiKeyAuth::Key("my-key".into());
        assert_eq!(auth.resolve().unwrap(), "my-key");

        let auth_missing = ApiKeyAuth::Env("SEARCHFEED_TEST_NONEXISTENT_VAR".into());
        assert!(matches!(
            auth_missing.resolve(),
            Err(ClientError::MissingEnvVar(_))
        ));
    }

    #[test]
    fn test_action_wire_names() {
        assert_eq!(IndexAction::Upload.as_str(), "upload");
        assert_eq!(IndexAction::Merge.as_str(), "merge");
        assert_eq!(IndexAction::MergeOrUpload.as_str(), "mergeOrUpload");
        assert_eq!(IndexAction::Delete.as_str(), "delete");
        assert_eq!(IndexAction::default(), IndexAction::Upload);
    }
}
