//! Cache key computation.

use std::fmt;

use edge_core::{RequestIdentity, RequestParameters, RequestParams};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::directives::CacheDirectives;

/// Prefix of every element cache key.
pub const KEY_PREFIX: &str = "key_";

/// A cache key identifying one cached instance of an element.
///
/// Components are concatenated without delimiters, so two different
/// requests can in rare cases produce the same key. The component list
/// keeps an unambiguous record for debugging.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// The computed key string.
    key: String,
    /// Components that make up the key (for debugging).
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    components: Vec<String>,
}

impl CacheKey {
    /// Get the key string.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Get the key components (for debugging).
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Consume the key and return the key string.
    pub fn into_string(self) -> String {
        self.key
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Why an element cannot be cached for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "value", rename_all = "snake_case")]
pub enum NotCacheable {
    /// Internal caching is switched off for the element.
    InternalDisabled,
    /// The request carries a parameter that makes the element dynamic.
    DynamicParameter(String),
    /// The current group is not in the element's allowed groups.
    GroupNotAllowed(String),
    /// Nothing distinguishes one cached instance from another.
    EmptyKey,
}

impl fmt::Display for NotCacheable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InternalDisabled => write!(f, "internal caching disabled"),
            Self::DynamicParameter(name) => write!(f, "dynamic parameter '{}'", name),
            Self::GroupNotAllowed(group) => write!(f, "group '{}' not allowed", group),
            Self::EmptyKey => write!(f, "empty key"),
        }
    }
}

/// Outcome of evaluating directives against a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyDecision {
    /// The element may be cached under this key.
    Cacheable(CacheKey),
    /// The element must be rendered fresh.
    Dynamic(NotCacheable),
}

impl KeyDecision {
    /// Check if a key was produced.
    pub fn is_cacheable(&self) -> bool {
        matches!(self, Self::Cacheable(_))
    }

    /// Borrow the key, if any.
    pub fn key(&self) -> Option<&CacheKey> {
        match self {
            Self::Cacheable(key) => Some(key),
            Self::Dynamic(_) => None,
        }
    }

    /// Take the key, if any.
    pub fn into_key(self) -> Option<CacheKey> {
        match self {
            Self::Cacheable(key) => Some(key),
            Self::Dynamic(_) => None,
        }
    }

    /// Reason the element is dynamic, if it is.
    pub fn reason(&self) -> Option<&NotCacheable> {
        match self {
            Self::Cacheable(_) => None,
            Self::Dynamic(reason) => Some(reason),
        }
    }
}

impl CacheDirectives {
    /// Compute the cache key of this element for a request.
    ///
    /// Returns `None` when the element must not be cached for this request.
    /// Missing parameters are treated as an empty parameter set.
    pub fn compute_key<C>(
        &self,
        ctx: &C,
        params: Option<&dyn RequestParameters>,
    ) -> Option<CacheKey>
    where
        C: RequestIdentity + ?Sized,
    {
        self.evaluate_key(ctx, params).into_key()
    }

    /// Compute the cache key and report why none was produced.
    pub fn evaluate_key<C>(
        &self,
        ctx: &C,
        params: Option<&dyn RequestParameters>,
    ) -> KeyDecision
    where
        C: RequestIdentity + ?Sized,
    {
        let decision = self.build_key(ctx, params);

        if let KeyDecision::Dynamic(reason) = &decision {
            trace!(uri = %ctx.current_uri(), %reason, "Element not cacheable for request");
        }

        decision
    }

    fn build_key<C>(&self, ctx: &C, params: Option<&dyn RequestParameters>) -> KeyDecision
    where
        C: RequestIdentity + ?Sized,
    {
        if !self.is_internal_cacheable() {
            return KeyDecision::Dynamic(NotCacheable::InternalDisabled);
        }

        let empty = RequestParams::new();
        let params: &dyn RequestParameters = params.unwrap_or(&empty);

        // Any trigger parameter makes the element dynamic
        if let Some(dynamic) = self.dynamic_parameters() {
            if let Some(name) = dynamic.iter().find(|name| params.contains(name)) {
                return KeyDecision::Dynamic(NotCacheable::DynamicParameter(name.clone()));
            }
        }

        let mut components = Vec::new();

        let group_key = if self.includes_group() {
            let group = ctx.current_group_name();
            if let Some(allowed) = self.allowed_groups() {
                if !allowed.iter().any(|g| g == group) {
                    return KeyDecision::Dynamic(NotCacheable::GroupNotAllowed(group.to_string()));
                }
            }
            group
        } else {
            ""
        };

        let mut key = String::from(KEY_PREFIX);

        if self.includes_uri() {
            let uri = ctx.current_uri();
            key.push_str(uri);
            components.push(format!("uri:{}", uri));
        }

        if self.includes_user() {
            let user = ctx.current_user_name();
            key.push_str(user);
            components.push(format!("user:{}", user));
        }

        key.push_str(group_key);
        if self.includes_group() {
            components.push(format!("group:{}", group_key));
        }

        if let Some(names) = self.key_parameters() {
            for name in names {
                if let Some(value) = params.get(name) {
                    key.push_str(value);
                    components.push(format!("param:{}={}", name, value));
                }
            }
        }

        if key == KEY_PREFIX {
            return KeyDecision::Dynamic(NotCacheable::EmptyKey);
        }

        KeyDecision::Cacheable(CacheKey { key, components })
    }
}

#[cfg(test)]
mod tests {
    use edge_core::RequestContext;

    use super::*;

    fn alice() -> RequestContext {
        RequestContext::new("/a/b").with_user("alice").with_group("editors")
    }

    #[test]
    fn test_uri_and_user_key() {
        let cd = CacheDirectives::new(true).with_uri(true).with_user(true);
        let key = cd.compute_key(&alice(), None).unwrap();

        assert_eq!(key.as_str(), "key_/a/balice");
        assert_eq!(key.components(), &["uri:/a/b", "user:alice"]);
    }

    #[test]
    fn test_internal_disabled() {
        let mut cd = CacheDirectives::new(false).with_uri(true).with_user(true);
        cd.set_proxy_public_cacheable(true);

        let decision = cd.evaluate_key(&alice(), None);
        assert_eq!(decision, KeyDecision::Dynamic(NotCacheable::InternalDisabled));
    }

    #[test]
    fn test_dynamic_parameter() {
        let cd = CacheDirectives::new(true)
            .with_uri(true)
            .with_user(true)
            .with_dynamic_parameters(["edit", "preview"]);

        let params = RequestParams::from_query("edit=1");
        let decision = cd.evaluate_key(&alice(), Some(&params));
        assert_eq!(
            decision.reason(),
            Some(&NotCacheable::DynamicParameter("edit".to_string()))
        );

        let params = RequestParams::from_query("page=1");
        assert!(cd.evaluate_key(&alice(), Some(&params)).is_cacheable());
    }

    #[test]
    fn test_encoded_dynamic_parameter() {
        let cd = CacheDirectives::new(true)
            .with_uri(true)
            .with_dynamic_parameters(["edit"]);

        let params = RequestParams::from_query("%65dit=1");
        assert_eq!(
            cd.evaluate_key(&alice(), Some(&params)).reason(),
            Some(&NotCacheable::DynamicParameter("edit".to_string()))
        );
    }

    #[test]
    fn test_parameter_values_are_decoded_in_key() {
        let cd = CacheDirectives::new(true).with_parameters(["q"]);
        let params = RequestParams::from_query("q=hello+world%21");

        let key = cd.compute_key(&alice(), Some(&params)).unwrap();
        assert_eq!(key.as_str(), "key_hello world!");
    }

    #[test]
    fn test_same_identity_with_different_parameters() {
        let cd = CacheDirectives::new(true)
            .with_uri(true)
            .with_dynamic_parameters(["edit"]);
        let ctx = RequestContext::new("/a");

        let edit = RequestParams::from_query("edit=1");
        assert!(cd.compute_key(&ctx, Some(&edit)).is_none());
        assert_eq!(cd.compute_key(&ctx, None).unwrap().as_str(), "key_/a");
    }

    #[test]
    fn test_first_listed_dynamic_parameter_reported() {
        let cd = CacheDirectives::new(true)
            .with_uri(true)
            .with_dynamic_parameters(["preview", "edit"]);

        let params = RequestParams::from_query("edit=1&preview=1");
        assert_eq!(
            cd.evaluate_key(&alice(), Some(&params)).reason(),
            Some(&NotCacheable::DynamicParameter("preview".to_string()))
        );
    }

    #[test]
    fn test_group_not_allowed() {
        let cd = CacheDirectives::new(true).with_allowed_groups(["editors"]);
        let guest = RequestContext::new("/a/b").with_group("guests");

        assert_eq!(
            cd.evaluate_key(&guest, None),
            KeyDecision::Dynamic(NotCacheable::GroupNotAllowed("guests".to_string()))
        );
        assert_eq!(cd.compute_key(&alice(), None).unwrap().as_str(), "key_editors");
    }

    #[test]
    fn test_group_without_restriction() {
        let cd = CacheDirectives::new(true).with_groups(true).with_user(true);
        let key = cd.compute_key(&alice(), None).unwrap();
        assert_eq!(key.as_str(), "key_aliceeditors");
        assert_eq!(key.components(), &["user:alice", "group:editors"]);
    }

    #[test]
    fn test_empty_allowed_groups_do_not_restrict() {
        let cd = CacheDirectives::new(true).with_allowed_groups(Vec::<String>::new());
        let guest = RequestContext::new("/").with_group("guests");
        assert_eq!(cd.compute_key(&guest, None).unwrap().as_str(), "key_guests");
    }

    #[test]
    fn test_parameters_in_list_order() {
        let cd = CacheDirectives::new(true).with_parameters(["sort", "page", "missing"]);
        let params = RequestParams::from_query("page=2&sort=asc");

        let key = cd.compute_key(&alice(), Some(&params)).unwrap();
        assert_eq!(key.as_str(), "key_asc2");
        assert_eq!(key.components(), &["param:sort=asc", "param:page=2"]);
    }

    #[test]
    fn test_nothing_in_key() {
        let cd = CacheDirectives::new(true);
        assert_eq!(
            cd.evaluate_key(&alice(), None),
            KeyDecision::Dynamic(NotCacheable::EmptyKey)
        );

        let cd = CacheDirectives::new(true).with_parameters(["page"]);
        let params = RequestParams::from_query("sort=asc");
        assert_eq!(cd.compute_key(&alice(), Some(&params)), None);
    }

    #[test]
    fn test_empty_values_yield_no_key() {
        let cd = CacheDirectives::new(true).with_parameters(["page"]);
        let params = RequestParams::from_query("page");
        assert_eq!(cd.compute_key(&alice(), Some(&params)), None);
    }

    #[test]
    fn test_accepts_hash_map_parameters() {
        use std::collections::HashMap;

        let cd = CacheDirectives::new(true).with_parameters(["id"]);
        let mut params = HashMap::new();
        params.insert("id".to_string(), "42".to_string());

        let key = cd.compute_key(&alice(), Some(&params)).unwrap();
        assert_eq!(key.to_string(), "key_42");
    }
}
