//! Element cache directives.

use tracing::debug;

use crate::flags::{CacheDefaults, CacheFlags, Capability, ExplicitFlags};
use crate::timeout::TimeoutPolicy;

/// Cacheability and cache key policy of a renderable element.
///
/// Directives are built while templates are configured and then only read
/// while rendering. They carry no lock: callers must finish configuring an
/// instance before sharing it between concurrent renders.
#[derive(Debug)]
pub struct CacheDirectives {
    flags: CacheFlags,
    explicit: ExplicitFlags,
    include_user: bool,
    include_group: bool,
    allowed_groups: Option<Vec<String>>,
    include_uri: bool,
    key_parameters: Option<Vec<String>>,
    dynamic_parameters: Option<Vec<String>>,
    renew_on_publish: bool,
    timeout: Option<Box<dyn TimeoutPolicy>>,
}

impl CacheDirectives {
    /// Create directives with every capability set to `cacheable`.
    ///
    /// Proxy and export flags count as explicitly configured.
    pub fn new(cacheable: bool) -> Self {
        Self::from_flags(CacheFlags::all(cacheable))
    }

    /// Create directives from explicit capability values.
    ///
    /// Proxy and export flags count as explicitly configured.
    pub fn from_flags(flags: CacheFlags) -> Self {
        Self::with_state(flags, ExplicitFlags::from_flags(flags))
    }

    /// Create directives for internal caching and streaming only.
    ///
    /// Proxy and export flags stay off and are left to system defaults.
    pub fn internal_and_stream(internal: bool, stream: bool) -> Self {
        Self::with_state(
            CacheFlags::internal_and_stream(internal, stream),
            ExplicitFlags::default(),
        )
    }

    fn with_state(flags: CacheFlags, explicit: ExplicitFlags) -> Self {
        Self {
            flags,
            explicit,
            include_user: false,
            include_group: false,
            allowed_groups: None,
            include_uri: false,
            key_parameters: None,
            dynamic_parameters: None,
            renew_on_publish: false,
            timeout: None,
        }
    }

    /// Narrow these directives by an enclosing element's directives.
    ///
    /// Capabilities are combined by conjunction, so merging never grants
    /// a capability either side lacked.
    pub fn merge(&mut self, other: &CacheDirectives) {
        self.flags &= other.flags;
    }

    /// Merge with every directive set in `others`.
    pub fn merge_all<'a>(&mut self, others: impl IntoIterator<Item = &'a CacheDirectives>) {
        for other in others {
            self.merge(other);
        }
    }

    /// Current capability flags.
    pub fn flags(&self) -> CacheFlags {
        self.flags
    }

    /// Which externally visible flags were configured explicitly.
    pub fn explicit(&self) -> ExplicitFlags {
        self.explicit
    }

    fn set_capability(&mut self, capability: Capability, value: bool) {
        self.flags = self.flags.with(capability, value);
    }

    // Capability setters

    /// Enable or disable caching in private proxies.
    pub fn set_proxy_private_cacheable(&mut self, cacheable: bool) {
        self.explicit.proxy_private = Some(cacheable);
        self.set_capability(Capability::ProxyPrivate, cacheable);
    }

    /// Enable or disable caching in public proxies.
    pub fn set_proxy_public_cacheable(&mut self, cacheable: bool) {
        self.explicit.proxy_public = Some(cacheable);
        self.set_capability(Capability::ProxyPublic, cacheable);
    }

    /// Enable or disable static export.
    pub fn set_export(&mut self, exportable: bool) {
        self.explicit.export = Some(exportable);
        self.set_capability(Capability::Export, exportable);
    }

    /// Fill in flags the author left unconfigured.
    ///
    /// Explicitly configured flags are kept and stay marked explicit.
    pub fn apply_defaults(&mut self, defaults: CacheDefaults) {
        if self.explicit.proxy_private.is_none() {
            self.set_capability(Capability::ProxyPrivate, defaults.proxy_private);
        }
        if self.explicit.proxy_public.is_none() {
            self.set_capability(Capability::ProxyPublic, defaults.proxy_public);
        }
        if self.explicit.export.is_none() {
            self.set_capability(Capability::Export, defaults.export);
        }
    }

    // Capability queries

    /// Check if the element may be stored in the internal cache.
    pub fn is_internal_cacheable(&self) -> bool {
        self.flags.internal
    }

    /// Check if the element may be stored in private proxies.
    pub fn is_proxy_private_cacheable(&self) -> bool {
        self.flags.proxy_private
    }

    /// Check if the element may be stored in public proxies.
    pub fn is_proxy_public_cacheable(&self) -> bool {
        self.flags.proxy_public
    }

    /// Check if the element may be exported.
    pub fn is_exportable(&self) -> bool {
        self.flags.export
    }

    /// Check if the element may be streamed.
    pub fn is_streamable(&self) -> bool {
        self.flags.stream
    }

    /// Check if the private proxy flag was configured explicitly.
    pub fn was_proxy_private_explicit(&self) -> bool {
        self.explicit.proxy_private.is_some()
    }

    /// Check if the public proxy flag was configured explicitly.
    pub fn was_proxy_public_explicit(&self) -> bool {
        self.explicit.proxy_public.is_some()
    }

    /// Check if the export flag was configured explicitly.
    pub fn was_export_explicit(&self) -> bool {
        self.explicit.export.is_some()
    }

    // Key policy

    /// Include the current user name in the cache key.
    pub fn set_cache_user(&mut self, include: bool) {
        self.include_user = include;
    }

    /// Include the request URI in the cache key.
    pub fn set_cache_uri(&mut self, include: bool) {
        self.include_uri = include;
    }

    /// Include the current group name in the cache key.
    pub fn set_cache_groups(&mut self, include: bool) {
        self.include_group = include;
    }

    /// Include the group in the key and only cache for the listed groups.
    ///
    /// Requests from any other group are treated as dynamic.
    pub fn set_allowed_groups<I, S>(&mut self, groups: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_group = true;
        self.allowed_groups = Some(groups.into_iter().map(Into::into).collect());
    }

    /// Parameters whose values become part of the cache key.
    pub fn set_cache_parameters<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_parameters = Some(names.into_iter().map(Into::into).collect());
    }

    /// Parameters whose presence makes the element dynamic.
    pub fn set_dynamic_parameters<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dynamic_parameters = Some(names.into_iter().map(Into::into).collect());
    }

    /// Builder form of [`set_cache_user`](Self::set_cache_user).
    pub fn with_user(mut self, include: bool) -> Self {
        self.set_cache_user(include);
        self
    }

    /// Builder form of [`set_cache_uri`](Self::set_cache_uri).
    pub fn with_uri(mut self, include: bool) -> Self {
        self.set_cache_uri(include);
        self
    }

    /// Builder form of [`set_cache_groups`](Self::set_cache_groups).
    pub fn with_groups(mut self, include: bool) -> Self {
        self.set_cache_groups(include);
        self
    }

    /// Builder form of [`set_allowed_groups`](Self::set_allowed_groups).
    pub fn with_allowed_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_allowed_groups(groups);
        self
    }

    /// Builder form of [`set_cache_parameters`](Self::set_cache_parameters).
    pub fn with_parameters<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_cache_parameters(names);
        self
    }

    /// Builder form of [`set_dynamic_parameters`](Self::set_dynamic_parameters).
    pub fn with_dynamic_parameters<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_dynamic_parameters(names);
        self
    }

    /// Check if the user or group takes part in the key.
    pub fn is_user_part_of_key(&self) -> bool {
        self.include_user || self.include_group
    }

    /// Check if any parameter takes part in the key.
    pub fn is_parameter_part_of_key(&self) -> bool {
        non_empty(&self.key_parameters).is_some()
    }

    /// Whether the URI takes part in the key.
    pub fn includes_uri(&self) -> bool {
        self.include_uri
    }

    /// Whether the user name takes part in the key.
    pub fn includes_user(&self) -> bool {
        self.include_user
    }

    /// Whether the group name takes part in the key.
    pub fn includes_group(&self) -> bool {
        self.include_group
    }

    /// Groups the element is cacheable for, if restricted.
    pub fn allowed_groups(&self) -> Option<&[String]> {
        non_empty(&self.allowed_groups)
    }

    /// Parameters appended to the key.
    pub fn key_parameters(&self) -> Option<&[String]> {
        non_empty(&self.key_parameters)
    }

    /// Parameters that make the element dynamic.
    pub fn dynamic_parameters(&self) -> Option<&[String]> {
        non_empty(&self.dynamic_parameters)
    }

    // Publish and timeout

    /// Evict this element on every publish, even if its template is unchanged.
    pub fn renew_after_every_publish(&mut self) {
        self.renew_on_publish = true;
    }

    /// Check if the element must be evicted when a project is published.
    ///
    /// URI keyed elements always renew.
    pub fn should_renew_on_publish(&self) -> bool {
        self.renew_on_publish || self.include_uri
    }

    /// Attach an expiry policy.
    ///
    /// A policy that is not proxy cacheable turns off both proxy flags and
    /// marks them explicit. This happens once, here; later changes inside
    /// the policy are not observed.
    pub fn set_timeout(&mut self, timeout: impl TimeoutPolicy + 'static) {
        let proxy_cacheable = timeout.is_proxy_cacheable();
        debug!(?timeout, proxy_cacheable, "Attaching timeout to cache directives");

        self.timeout = Some(Box::new(timeout));

        if !proxy_cacheable {
            debug!("Timeout is not proxy cacheable, disabling proxy caching");
            self.set_proxy_private_cacheable(false);
            self.set_proxy_public_cacheable(false);
        }
    }

    /// Builder form of [`set_timeout`](Self::set_timeout).
    pub fn with_timeout(mut self, timeout: impl TimeoutPolicy + 'static) -> Self {
        self.set_timeout(timeout);
        self
    }

    /// The attached expiry policy.
    pub fn timeout(&self) -> Option<&dyn TimeoutPolicy> {
        self.timeout.as_deref()
    }

    /// Check if an expiry policy was attached.
    pub fn is_time_critical(&self) -> bool {
        self.timeout.is_some()
    }
}

fn non_empty(list: &Option<Vec<String>>) -> Option<&[String]> {
    list.as_deref().filter(|l| !l.is_empty())
}
