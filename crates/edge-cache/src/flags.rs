//! Cacheability capabilities.

use std::fmt;
use std::ops::{BitAnd, BitAndAssign};

use serde::{Deserialize, Serialize};

/// A single cacheability capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Storable in the server-side element cache.
    Internal,
    /// Storable in user-specific intermediary proxies.
    ProxyPrivate,
    /// Storable in shared intermediary proxies.
    ProxyPublic,
    /// Eligible for static export on publish.
    Export,
    /// Eligible for direct streaming.
    Stream,
}

impl Capability {
    /// All capabilities in declaration order.
    pub const ALL: [Capability; 5] = [
        Self::Internal,
        Self::ProxyPrivate,
        Self::ProxyPublic,
        Self::Export,
        Self::Stream,
    ];

    /// Short name used in debug output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::ProxyPrivate => "proxy-private",
            Self::ProxyPublic => "proxy-public",
            Self::Export => "export",
            Self::Stream => "stream",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The five independent cacheability bits of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CacheFlags {
    /// Internal element cache.
    pub internal: bool,
    /// Private proxy caching.
    pub proxy_private: bool,
    /// Public proxy caching.
    pub proxy_public: bool,
    /// Static export.
    pub export: bool,
    /// Streaming.
    pub stream: bool,
}

impl CacheFlags {
    /// Set every capability to the same value.
    pub fn all(value: bool) -> Self {
        Self::new(value, value, value, value, value)
    }

    /// Create flags from explicit values.
    pub fn new(
        internal: bool,
        proxy_private: bool,
        proxy_public: bool,
        export: bool,
        stream: bool,
    ) -> Self {
        Self {
            internal,
            proxy_private,
            proxy_public,
            export,
            stream,
        }
    }

    /// Internal and stream capabilities only; proxy and export stay off.
    pub fn internal_and_stream(internal: bool, stream: bool) -> Self {
        Self {
            internal,
            stream,
            ..Self::default()
        }
    }

    /// Check a single capability.
    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::Internal => self.internal,
            Capability::ProxyPrivate => self.proxy_private,
            Capability::ProxyPublic => self.proxy_public,
            Capability::Export => self.export,
            Capability::Stream => self.stream,
        }
    }

    /// Return a copy with one capability overwritten.
    pub fn with(mut self, capability: Capability, value: bool) -> Self {
        match capability {
            Capability::Internal => self.internal = value,
            Capability::ProxyPrivate => self.proxy_private = value,
            Capability::ProxyPublic => self.proxy_public = value,
            Capability::Export => self.export = value,
            Capability::Stream => self.stream = value,
        }
        self
    }

    /// Conjunction of both flag sets.
    pub fn merge(self, other: CacheFlags) -> Self {
        Self {
            internal: self.internal && other.internal,
            proxy_private: self.proxy_private && other.proxy_private,
            proxy_public: self.proxy_public && other.proxy_public,
            export: self.export && other.export,
            stream: self.stream && other.stream,
        }
    }

    /// Check if no capability is enabled.
    pub fn is_none(&self) -> bool {
        Capability::ALL.iter().all(|c| !self.allows(*c))
    }

    /// Enabled capabilities in declaration order.
    pub fn enabled(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| self.allows(*c))
            .collect()
    }
}

impl BitAnd for CacheFlags {
    type Output = CacheFlags;

    fn bitand(self, rhs: CacheFlags) -> CacheFlags {
        self.merge(rhs)
    }
}

impl BitAndAssign for CacheFlags {
    fn bitand_assign(&mut self, rhs: CacheFlags) {
        *self = self.merge(rhs);
    }
}

impl fmt::Display for CacheFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return f.write_str("none");
        }

        let names: Vec<&str> = self.enabled().iter().map(|c| c.as_str()).collect();
        f.write_str(&names.join(","))
    }
}

/// Which externally visible flags were configured by an author.
///
/// `None` means the system default applies, `Some(v)` records the value
/// the author asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExplicitFlags {
    /// Private proxy setting.
    pub proxy_private: Option<bool>,
    /// Public proxy setting.
    pub proxy_public: Option<bool>,
    /// Export setting.
    pub export: Option<bool>,
}

impl ExplicitFlags {
    /// Mark the externally visible flags of `flags` as explicitly configured.
    pub fn from_flags(flags: CacheFlags) -> Self {
        Self {
            proxy_private: Some(flags.proxy_private),
            proxy_public: Some(flags.proxy_public),
            export: Some(flags.export),
        }
    }
}

/// Environment-wide values for flags an author left unconfigured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheDefaults {
    /// Default for private proxy caching.
    pub proxy_private: bool,
    /// Default for public proxy caching.
    pub proxy_public: bool,
    /// Default for static export.
    pub export: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all() {
        assert_eq!(CacheFlags::all(true).enabled().len(), 5);
        assert!(CacheFlags::all(false).is_none());
    }

    #[test]
    fn test_internal_and_stream() {
        let flags = CacheFlags::internal_and_stream(true, false);
        assert!(flags.internal);
        assert!(!flags.stream);
        assert!(!flags.proxy_private);
        assert!(!flags.proxy_public);
        assert!(!flags.export);
    }

    #[test]
    fn test_with_overwrites_single_capability() {
        let flags = CacheFlags::all(true).with(Capability::Export, false);
        assert!(!flags.allows(Capability::Export));
        assert!(flags.allows(Capability::Internal));
        assert!(flags.allows(Capability::Stream));
    }

    #[test]
    fn test_merge_is_conjunction() {
        let a = CacheFlags::new(true, true, false, true, false);
        let b = CacheFlags::new(true, false, false, true, true);

        assert_eq!(a & b, CacheFlags::new(true, false, false, true, false));

        let mut c = a;
        c &= b;
        assert_eq!(c, a.merge(b));
    }

    #[test]
    fn test_display() {
        assert_eq!(CacheFlags::all(false).to_string(), "none");
        assert_eq!(
            CacheFlags::internal_and_stream(true, true).to_string(),
            "internal,stream"
        );
    }

    #[test]
    fn test_explicit_from_flags() {
        let explicit = ExplicitFlags::from_flags(CacheFlags::new(true, false, true, false, true));
        assert_eq!(explicit.proxy_private, Some(false));
        assert_eq!(explicit.proxy_public, Some(true));
        assert_eq!(explicit.export, Some(false));
        assert_eq!(ExplicitFlags::default().export, None);
    }
}
