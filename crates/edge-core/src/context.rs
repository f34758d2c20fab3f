//! Request identity.

/// User name assigned to requests without an authenticated user.
pub const DEFAULT_USER: &str = "Guest";

/// Group name assigned to requests without an explicit group.
pub const DEFAULT_GROUP: &str = "Guests";

/// Identity of the request being rendered.
///
/// The cache engine only needs these three lookups, so renderers can
/// implement this on whatever request type they already carry.
pub trait RequestIdentity {
    /// Name of the user issuing the request.
    fn current_user_name(&self) -> &str;

    /// Name of the group the user is acting in.
    fn current_group_name(&self) -> &str;

    /// URI of the requested resource.
    fn current_uri(&self) -> &str;
}

/// Typed request identity passed to element renderers.
///
/// Request parameters travel separately (see
/// [`RequestParams`](crate::RequestParams)) so one identity can be
/// evaluated against several parameter sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Requested URI.
    pub uri: String,
    /// Current user name.
    pub user: String,
    /// Current group name.
    pub group: String,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new("/")
    }
}

impl RequestContext {
    /// Create a new request context for the given URI as the guest user.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            user: DEFAULT_USER.to_string(),
            group: DEFAULT_GROUP.to_string(),
        }
    }

    /// Set the current user.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Set the current group.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }
}

impl RequestIdentity for RequestContext {
    fn current_user_name(&self) -> &str {
        &self.user
    }

    fn current_group_name(&self) -> &str {
        &self.group
    }

    fn current_uri(&self) -> &str {
        &self.uri
    }
}
