//! Matched route parameters.
//!
//! [`Params`] is what a lookup returns: names borrowed from the tree, values
//! borrowed from the request path. [`PathParams`] is the owned copy the HTTP
//! layer stores in request extensions.

use std::fmt;
use std::slice;

/// A single URL parameter, consisting of a key and a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param<'k, 'v> {
    pub key: &'k str,
    pub value: &'v str,
}

/// Ordered parameters of a matched route.
///
/// The first wildcard in the pattern is the first entry, so reading by index
/// is safe.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Params<'k, 'v> {
    inner: Vec<Param<'k, 'v>>,
}

impl<'k, 'v> Params<'k, 'v> {
    pub fn new() -> Self {
        Self { inner: Vec::new() }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, key: &'k str, value: &'v str) {
        self.inner.push(Param { key, value });
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.inner.truncate(len);
    }

    pub(crate) fn clear(&mut self) {
        self.inner.clear();
    }

    /// Returns the value of the first parameter named `key`.
    pub fn get(&self, key: &str) -> Option<&'v str> {
        self.inner.iter().find(|p| p.key == key).map(|p| p.value)
    }

    /// Like [`Params::get`], but an unknown key yields an empty string.
    pub fn by_name(&self, key: &str) -> &'v str {
        self.get(key).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Param<'k, 'v>> {
        self.inner.iter()
    }

    pub fn as_slice(&self) -> &[Param<'k, 'v>] {
        &self.inner
    }

    /// Copies the parameters out of the tree and the request path.
    pub fn to_owned_params(&self) -> PathParams {
        PathParams(
            self.inner
                .iter()
                .map(|p| (p.key.to_owned(), p.value.to_owned()))
                .collect(),
        )
    }
}

impl fmt::Debug for Params<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.inner.iter().map(|p| (p.key, p.value)))
            .finish()
    }
}

impl<'a, 'k, 'v> IntoIterator for &'a Params<'k, 'v> {
    type Item = &'a Param<'k, 'v>;
    type IntoIter = slice::Iter<'a, Param<'k, 'v>>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

/// Owned route parameters, inserted into request extensions by
/// [`RouterService`](crate::http::RouterService).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn by_name(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
