//! Path parameters bound by a matched route.

use serde::ser::{Serialize, Serializer};

/// Placeholder values extracted from a request path, in pattern order.
///
/// # Example
///
/// ```
/// use route_resolver::routing::RouteParams;
///
/// // Route pattern: /users/{id}
/// // Matched path:  /users/42
/// let params = RouteParams::from_pairs([("id", "42")]);
///
/// assert_eq!(params.get("id"), Some("42"));
/// assert_eq!(params.get_as::<u32>("id"), Some(42));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    params: Vec<(String, String)>,
}

impl RouteParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, value)` pairs, keeping their order.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            params: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Get a parameter value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a parameter and parse it.
    ///
    /// Returns `None` if the parameter is missing or does not parse.
    pub fn get_as<T>(&self, name: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.get(name)?.parse().ok()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.push((name.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }
}

impl Serialize for RouteParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}
