//! Connection settings.
//!
//! Settings are an immutable value handed to every resolver and descriptor.
//! Nothing in this crate reads configuration from global state.

use crate::document::Document;
use crate::error::{QuarryError, Result};
use quarry_transport::HttpTransportConfig;
use std::collections::HashMap;
use std::env;
use std::time::Duration;

/// Per-type overrides registered on the settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeMapping {
    /// Index the type is stored in.
    pub index: Option<String>,
    /// Type name used on the wire.
    pub type_name: Option<String>,
}

/// Client connection settings.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// Engine node URL.
    pub url: String,
    /// Basic auth username.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Request timeout.
    pub request_timeout: Duration,
    /// Index used when neither the operation nor the type names one.
    pub default_index: Option<String>,
    /// Pluralize convention-inferred type names (`Project` -> `projects`).
    pub pluralize_type_names: bool,
    type_mappings: HashMap<String, TypeMapping>,
}

impl ConnectionSettings {
    /// Create settings for a single node.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            default_index: None,
            pluralize_type_names: false,
            type_mappings: HashMap::new(),
        }
    }

    /// Load settings from the environment, after reading a `.env` file if
    /// one is present.
    ///
    /// - `QUARRY_URL` (default `http://localhost:9200`)
    /// - `QUARRY_DEFAULT_INDEX`
    /// - `QUARRY_USERNAME` / `QUARRY_PASSWORD`
    /// - `QUARRY_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let url = env::var("QUARRY_URL").unwrap_or_else(|_| "http://localhost:9200".to_string());
        let mut settings = Self::new(url);

        if let Ok(index) = env::var("QUARRY_DEFAULT_INDEX") {
            settings = settings.with_default_index(index);
        }

        if let (Ok(user), Ok(pass)) = (env::var("QUARRY_USERNAME"), env::var("QUARRY_PASSWORD")) {
            settings = settings.with_basic_auth(user, pass);
        }

        if let Ok(raw) = env::var("QUARRY_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().map_err(|_| {
                QuarryError::Configuration(format!("QUARRY_TIMEOUT_SECS is not a number: {}", raw))
            })?;
            settings = settings.with_request_timeout(Duration::from_secs(secs));
        }

        Ok(settings)
    }

    /// Set basic authentication credentials.
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the fallback index.
    pub fn with_default_index(mut self, index: impl Into<String>) -> Self {
        self.default_index = Some(index.into());
        self
    }

    /// Pluralize convention-inferred type names.
    pub fn with_pluralized_type_names(mut self, enabled: bool) -> Self {
        self.pluralize_type_names = enabled;
        self
    }

    /// Store documents of type `T` in `index`.
    pub fn map_type_index<T: Document>(self, index: impl Into<String>) -> Self {
        self.map_tag_index(T::type_tag(), index)
    }

    /// Use `type_name` on the wire for documents of type `T`.
    pub fn map_type_name<T: Document>(self, type_name: impl Into<String>) -> Self {
        self.map_tag_name(T::type_tag(), type_name)
    }

    /// Register an index override for a type tag or explicit type name.
    pub fn map_tag_index(mut self, tag: impl Into<String>, index: impl Into<String>) -> Self {
        self.type_mappings.entry(tag.into()).or_default().index = Some(index.into());
        self
    }

    /// Register a type-name override for a type tag.
    pub fn map_tag_name(mut self, tag: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.type_mappings.entry(tag.into()).or_default().type_name = Some(type_name.into());
        self
    }

    /// Look up the overrides registered for a tag.
    pub fn type_mapping(&self, tag: &str) -> Option<&TypeMapping> {
        self.type_mappings.get(tag)
    }

    /// Transport configuration derived from these settings.
    pub fn transport_config(&self) -> HttpTransportConfig {
        let mut builder = HttpTransportConfig::builder(self.url.clone())
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout);

        if let (Some(user), Some(pass)) = (&self.username, &self.password) {
            builder = builder.basic_auth(user.clone(), pass.clone());
        }

        builder.build()
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self::new("http://localhost:9200")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Project;

    impl Document for Project {
        fn type_tag() -> &'static str {
            "Project"
        }
    }

    #[test]
    fn test_defaults() {
        let settings = ConnectionSettings::default();
        assert_eq!(settings.url, "http://localhost:9200");
        assert!(settings.default_index.is_none());
        assert!(!settings.pluralize_type_names);
    }

    #[test]
    fn test_type_overrides_accumulate() {
        let settings = ConnectionSettings::default()
            .map_type_index::<Project>("projects-v2")
            .map_type_name::<Project>("proj");

        let mapping = settings.type_mapping("Project").unwrap();
        assert_eq!(mapping.index.as_deref(), Some("projects-v2"));
        assert_eq!(mapping.type_name.as_deref(), Some("proj"));
        assert!(settings.type_mapping("Other").is_none());
    }

    #[test]
    fn test_transport_config() {
        let settings = ConnectionSettings::new("http://search:9200")
            .with_basic_auth("elastic", "changeme")
            .with_request_timeout(Duration::from_secs(5));

        let config = settings.transport_config();
        assert_eq!(config.base_url, "http://search:9200");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.username.as_deref(), Some("elastic"));
    }
}
