use std::collections::BTreeMap;
use std::str::FromStr;

use super::error::ResolverError;

/// Option naming the layer a resolver writes into.
pub const LAYER: &str = "layer";
/// Option naming the annotation key a resolver writes under.
pub const ANNOTATION_KEY: &str = "annotationKey";

/// Flat string options of one resolver instance.
///
/// The dispatcher fills [`LAYER`] and [`ANNOTATION_KEY`] from the column
/// binding; everything else comes from the schema's resolver options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverOptions {
    values: BTreeMap<String, String>,
}

impl ResolverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn require(
        &self,
        resolver: &'static str,
        key: &'static str,
    ) -> Result<&str, ResolverError> {
        self.get(key).ok_or(ResolverError::MissingOption {
            resolver,
            option: key,
        })
    }

    /// Parses `key` as `T`, falling back to `default` when absent.
    pub fn parse_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, ResolverError> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| ResolverError::InvalidOption {
                option: key.to_string(),
                value: raw.to_string(),
            }),
        }
    }

    pub fn string_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }
}

impl From<BTreeMap<String, String>> for ResolverOptions {
    fn from(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }
}
