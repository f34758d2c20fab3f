//! Declarative cache directives.
//!
//! Templates describe the caching of their elements in TOML (or JSON):
//!
//! ```toml
//! [defaults]
//! proxy_private = true
//!
//! [elements.navigation]
//! uri = true
//! groups = ["editors", "admins"]
//! dynamic_parameters = ["edit"]
//!
//! [elements.ticker]
//! timeout_secs = 60
//! timeout_proxy_cacheable = false
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::directives::CacheDirectives;
use crate::error::{ConfigError, ConfigResult};
use crate::flags::CacheDefaults;
use crate::timeout::FixedTimeout;

/// Group participation in the cache key.
///
/// Either a plain switch or the list of groups the element may be
/// cached for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupPolicy {
    /// Include the group name (or not) without restriction.
    Enabled(bool),
    /// Include the group name and only cache for these groups.
    Only(Vec<String>),
}

impl Default for GroupPolicy {
    fn default() -> Self {
        Self::Enabled(false)
    }
}

/// Cache directives of one element as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectivesConfig {
    /// Internal element cache.
    pub internal: bool,
    /// Streaming.
    pub stream: bool,
    /// Private proxy caching, left to defaults when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_private: Option<bool>,
    /// Public proxy caching, left to defaults when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_public: Option<bool>,
    /// Static export, left to defaults when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<bool>,
    /// Include the user name in the key.
    pub user: bool,
    /// Include the URI in the key.
    pub uri: bool,
    /// Group participation in the key.
    pub groups: GroupPolicy,
    /// Parameters whose values are part of the key.
    pub parameters: Vec<String>,
    /// Parameters that make the element dynamic.
    pub dynamic_parameters: Vec<String>,
    /// Evict on every publish.
    pub renew_after_publish: bool,
    /// Reload interval in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Whether proxies may hold the element between reloads.
    pub timeout_proxy_cacheable: bool,
}

impl Default for DirectivesConfig {
    fn default() -> Self {
        Self {
            internal: true,
            stream: true,
            proxy_private: None,
            proxy_public: None,
            export: None,
            user: false,
            uri: false,
            groups: GroupPolicy::default(),
            parameters: Vec::new(),
            dynamic_parameters: Vec::new(),
            renew_after_publish: false,
            timeout_secs: None,
            timeout_proxy_cacheable: true,
        }
    }
}

impl DirectivesConfig {
    /// Parse a single element's directives from TOML.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Parse a single element's directives from JSON.
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Build the runtime directives.
    pub fn to_directives(&self) -> ConfigResult<CacheDirectives> {
        let mut cd = CacheDirectives::internal_and_stream(self.internal, self.stream);

        if let Some(value) = self.proxy_private {
            cd.set_proxy_private_cacheable(value);
        }
        if let Some(value) = self.proxy_public {
            cd.set_proxy_public_cacheable(value);
        }
        if let Some(value) = self.export {
            cd.set_export(value);
        }

        cd.set_cache_user(self.user);
        cd.set_cache_uri(self.uri);

        match &self.groups {
            GroupPolicy::Enabled(include) => cd.set_cache_groups(*include),
            GroupPolicy::Only(groups) => cd.set_allowed_groups(groups.iter().cloned()),
        }

        if !self.parameters.is_empty() {
            cd.set_cache_parameters(self.parameters.iter().cloned());
        }
        if !self.dynamic_parameters.is_empty() {
            cd.set_dynamic_parameters(self.dynamic_parameters.iter().cloned());
        }
        if self.renew_after_publish {
            cd.renew_after_every_publish();
        }

        if let Some(secs) = self.timeout_secs {
            if secs == 0 {
                return Err(ConfigError::InvalidTimeout(
                    "timeout_secs must be greater than zero".to_string(),
                ));
            }
            cd.set_timeout(FixedTimeout {
                interval: Duration::from_secs(secs),
                proxy_cacheable: self.timeout_proxy_cacheable,
            });
        }

        Ok(cd)
    }
}

/// Cache directives of every element of a template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementCacheConfig {
    /// Values for flags elements leave unconfigured.
    #[serde(default)]
    pub defaults: CacheDefaults,
    /// Directives by element name.
    #[serde(default)]
    pub elements: BTreeMap<String, DirectivesConfig>,
}

impl ElementCacheConfig {
    /// Parse a template's element directives from TOML.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Parse a template's element directives from JSON.
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Names of all configured elements.
    pub fn element_names(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(|k| k.as_str())
    }

    /// Build the directives of one element with defaults applied.
    pub fn directives_for(&self, element: &str) -> ConfigResult<CacheDirectives> {
        let config = self
            .elements
            .get(element)
            .ok_or_else(|| ConfigError::UnknownElement(element.to_string()))?;

        let mut cd = config.to_directives()?;
        cd.apply_defaults(self.defaults);

        debug!(element, flags = %cd.flags(), "Built cache directives");
        Ok(cd)
    }
}
