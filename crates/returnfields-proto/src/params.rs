//! Request parameter access.
//!
//! The restriction engine only needs to know whether a key is present and what
//! its raw value is. Frameworks adapt their own request types through
//! [`ParamSource`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Read access to the query parameters of the current request.
pub trait ParamSource {
    /// Raw value for `key`, or `None` when the key is absent.
    ///
    /// Returns [`Error::MissingRequestContext`] when there is no parameter
    /// container to read from.
    fn param(&self, key: &str) -> Result<Option<&str>, Error>;

    /// Check whether `key` is present.
    fn contains(&self, key: &str) -> Result<bool, Error> {
        Ok(self.param(key)?.is_some())
    }
}

/// Ordered multi-map of query parameters.
///
/// Repeated keys are kept; lookups return the last value, the same way a
/// framework query dict does.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key/value pair.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    /// Add a key/value pair in place.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// All values for `key`, in insertion order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Check if there are no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ParamSource for QueryParams {
    fn param(&self, key: &str) -> Result<Option<&str>, Error> {
        Ok(self
            .pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str()))
    }
}

impl ParamSource for HashMap<String, String> {
    fn param(&self, key: &str) -> Result<Option<&str>, Error> {
        Ok(self.get(key).map(String::as_str))
    }
}

/// An absent container is a missing request context, not an empty one.
impl<P: ParamSource> ParamSource for Option<P> {
    fn param(&self, key: &str) -> Result<Option<&str>, Error> {
        match self {
            Some(inner) => inner.param(key),
            None => Err(Error::MissingRequestContext),
        }
    }
}

impl<P: ParamSource + ?Sized> ParamSource for &P {
    fn param(&self, key: &str) -> Result<Option<&str>, Error> {
        (**self).param(key)
    }
}
