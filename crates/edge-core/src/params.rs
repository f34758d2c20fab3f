//! Request parameters.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Read access to named request parameters.
pub trait RequestParameters {
    /// Check whether a parameter is present (an empty value still counts).
    fn contains(&self, name: &str) -> bool;

    /// Get the value of a parameter.
    fn get(&self, name: &str) -> Option<&str>;

    /// Check whether no parameters are present.
    fn is_empty(&self) -> bool;
}

impl RequestParameters for HashMap<String, String> {
    fn contains(&self, name: &str) -> bool {
        self.contains_key(name)
    }

    fn get(&self, name: &str) -> Option<&str> {
        HashMap::get(self, name).map(|s| s.as_str())
    }

    fn is_empty(&self) -> bool {
        HashMap::is_empty(self)
    }
}

impl RequestParameters for BTreeMap<String, String> {
    fn contains(&self, name: &str) -> bool {
        self.contains_key(name)
    }

    fn get(&self, name: &str) -> Option<&str> {
        BTreeMap::get(self, name).map(|s| s.as_str())
    }

    fn is_empty(&self) -> bool {
        BTreeMap::is_empty(self)
    }
}

/// Ordered request parameter map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestParams(BTreeMap<String, String>);

impl RequestParams {
    /// Create an empty parameter map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `name=value&flag` query string.
    ///
    /// Names and values are percent-decoded (`+` becomes a space). A bare
    /// name yields an empty value. Empty segments are skipped and later
    /// duplicates overwrite earlier ones.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        form_urlencoded::parse(query.as_bytes()).collect()
    }

    /// Insert a parameter, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether no parameters are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over parameters in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl RequestParameters for RequestParams {
    fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(|s| s.as_str())
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RequestParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
