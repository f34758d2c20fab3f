//! Response cache metadata derived from directives.

use std::fmt;
use std::time::Duration;

use http::header::{HeaderName, HeaderValue, CACHE_CONTROL, PRAGMA};
use http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::directives::CacheDirectives;
use crate::key::KeyDecision;

/// Header names for cache debugging.
pub mod header_names {
    /// Cache key used for lookup.
    pub const X_CACHE_KEY: &str = "x-cache-key";
    /// Cacheable, or the reason the element is dynamic.
    pub const X_CACHE_DECISION: &str = "x-cache-decision";
    /// Enabled capabilities after merging.
    pub const X_CACHE_FLAGS: &str = "x-cache-flags";
    /// Whether publishing evicts the element.
    pub const X_CACHE_RENEW: &str = "x-cache-renew";
    /// Request header enabling debug output.
    pub const X_DEBUG_CACHE: &str = "x-debug-cache";
}

/// Proxy visibility of a rendered response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum CacheControl {
    /// Shared proxies may cache.
    Public {
        /// Freshness lifetime, if the element has a timeout.
        #[serde(skip_serializing_if = "Option::is_none")]
        max_age: Option<Duration>,
    },
    /// Only user-specific proxies may cache.
    Private {
        /// Freshness lifetime, if the element has a timeout.
        #[serde(skip_serializing_if = "Option::is_none")]
        max_age: Option<Duration>,
    },
    /// No proxy may cache.
    NoCache,
}

impl CacheControl {
    /// Derive proxy visibility from (merged) directives.
    pub fn from_directives(cd: &CacheDirectives) -> Self {
        let max_age = cd.timeout().and_then(|t| t.max_age());

        if cd.is_proxy_public_cacheable() {
            Self::Public { max_age }
        } else if cd.is_proxy_private_cacheable() {
            Self::Private { max_age }
        } else {
            Self::NoCache
        }
    }

    /// Check if any proxy may cache the response.
    pub fn allows_proxy_caching(&self) -> bool {
        !matches!(self, Self::NoCache)
    }

    /// Value of the `Cache-Control` header.
    pub fn header_value(&self) -> String {
        match self {
            Self::Public { max_age } => with_max_age("public", *max_age),
            Self::Private { max_age } => with_max_age("private", *max_age),
            Self::NoCache => "no-cache".to_string(),
        }
    }

    /// Build the response headers.
    pub fn to_header_map(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Ok(value) = HeaderValue::from_str(&self.header_value()) {
            headers.insert(CACHE_CONTROL, value);
        }

        if matches!(self, Self::NoCache) {
            headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        }

        headers
    }
}

impl fmt::Display for CacheControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header_value())
    }
}

fn with_max_age(directive: &str, max_age: Option<Duration>) -> String {
    match max_age {
        Some(age) => format!("{}, max-age={}", directive, age.as_secs()),
        None => directive.to_string(),
    }
}

/// Cache explain headers for debugging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheExplainHeaders {
    /// Cache key used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_key: Option<String>,
    /// Decision summary.
    pub decision: String,
    /// Enabled capabilities.
    pub flags: String,
    /// Whether publishing evicts the element.
    pub renew_on_publish: bool,
}

impl CacheExplainHeaders {
    /// Explain the outcome of evaluating `cd` for a request.
    pub fn new(cd: &CacheDirectives, decision: &KeyDecision) -> Self {
        let summary = match decision.reason() {
            Some(reason) => format!("dynamic: {}", reason),
            None => "cacheable".to_string(),
        };

        Self {
            cache_key: decision.key().map(|k| k.as_str().to_string()),
            decision: summary,
            flags: cd.flags().to_string(),
            renew_on_publish: cd.should_renew_on_publish(),
        }
    }

    /// Convert to HTTP headers.
    ///
    /// Values that are not valid header text (such as keys built from
    /// non-ASCII URIs) are left out.
    pub fn to_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Some(key) = &self.cache_key {
            insert(&mut headers, header_names::X_CACHE_KEY, key);
        }
        insert(&mut headers, header_names::X_CACHE_DECISION, &self.decision);
        insert(&mut headers, header_names::X_CACHE_FLAGS, &self.flags);
        insert(
            &mut headers,
            header_names::X_CACHE_RENEW,
            if self.renew_on_publish { "true" } else { "false" },
        );

        headers
    }

    /// Convert to JSON for debugging endpoint.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(HeaderName::from_static(name), value);
    }
}

/// Utility to check if debug headers should be included.
pub fn should_include_debug_headers(request_headers: &HeaderMap) -> bool {
    request_headers
        .get(header_names::X_DEBUG_CACHE)
        .is_some_and(|value| value == "1")
}
