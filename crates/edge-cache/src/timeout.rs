//! Expiry policies attached to cache directives.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Expiry policy of a time critical element.
///
/// The directives engine only asks whether proxies may hold the element.
/// Scheduling the actual reloads belongs to the cache store.
pub trait TimeoutPolicy: fmt::Debug + Send + Sync {
    /// Check whether proxies may cache elements governed by this policy.
    fn is_proxy_cacheable(&self) -> bool;

    /// Maximum age a proxy may serve, if the policy has one.
    fn max_age(&self) -> Option<Duration> {
        None
    }
}

/// Reload an element after a fixed interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedTimeout {
    /// Time between reloads.
    pub interval: Duration,
    /// Whether proxies may hold the element for the interval.
    pub proxy_cacheable: bool,
}

impl FixedTimeout {
    /// Create a proxy compatible timeout.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            proxy_cacheable: true,
        }
    }

    /// Create a timeout that keeps the element out of proxies.
    pub fn server_only(interval: Duration) -> Self {
        Self {
            interval,
            proxy_cacheable: false,
        }
    }
}

impl TimeoutPolicy for FixedTimeout {
    fn is_proxy_cacheable(&self) -> bool {
        self.proxy_cacheable
    }

    fn max_age(&self) -> Option<Duration> {
        self.proxy_cacheable.then_some(self.interval)
    }
}
