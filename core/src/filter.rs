//! Typed equality filters over document metadata.
//!
//! A filter is a conjunction of `key == value` predicates. Only scalar string,
//! integer, float and boolean values are expressible; anything else is rejected
//! when the filter is built rather than silently widened.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::document::Metadata;
use crate::error::{Result, VectorError};

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl FilterValue {
    /// Convert an arbitrary JSON value, rejecting non-scalar and non-finite values.
    pub fn from_json(key: &str, value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(Self::String(s.clone())),
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Int(i))
                } else {
                    match n.as_f64() {
                        Some(f) if f.is_finite() => Ok(Self::Float(f)),
                        _ => Err(VectorError::invalid_filter(
                            key,
                            format!("number {} is not representable", n),
                        )),
                    }
                }
            }
            Value::Null => Err(VectorError::invalid_filter(key, "null is not supported")),
            Value::Array(_) => Err(VectorError::invalid_filter(key, "arrays are not supported")),
            Value::Object(_) => Err(VectorError::invalid_filter(
                key,
                "nested objects are not supported",
            )),
        }
    }

    /// Parse a command-line style literal: `true`/`false`, integers, floats,
    /// otherwise a string. Surrounding double quotes force a string.
    pub fn parse_literal(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
            return Self::String(trimmed[1..trimmed.len() - 1].to_string());
        }
        match trimmed {
            "true" => return Self::Bool(true),
            "false" => return Self::Bool(false),
            _ => {}
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Self::Int(i);
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => Self::Float(f),
            _ => Self::String(trimmed.to_string()),
        }
    }

    /// Equality against a stored metadata value. Numbers compare numerically,
    /// so `Int(3)` matches a stored `3.0`.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::String(expected), Value::String(actual)) => expected == actual,
            (Self::Bool(expected), Value::Bool(actual)) => expected == actual,
            (Self::Int(expected), Value::Number(actual)) => match actual.as_i64() {
                Some(i) => i == *expected,
                None => actual.as_f64() == Some(*expected as f64),
            },
            (Self::Float(expected), Value::Number(actual)) => actual.as_f64() == Some(*expected),
            _ => false,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{:?}", s),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Conjunction of metadata equality predicates, ordered by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    predicates: BTreeMap<String, FilterValue>,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.predicates.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FilterValue) {
        self.predicates.insert(key.into(), value);
    }

    /// Build from loosely typed JSON metadata; fails on the first unsupported value.
    pub fn from_json_map(map: &serde_json::Map<String, Value>) -> Result<Self> {
        let mut filter = Self::new();
        for (key, value) in map {
            filter.insert(key.clone(), FilterValue::from_json(key, value)?);
        }
        Ok(filter)
    }

    /// Parse `key=value` pairs as given on the command line.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                VectorError::invalid_filter(pair, "expected key=value")
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(VectorError::invalid_filter(pair, "empty key"));
            }
            filter.insert(key, FilterValue::parse_literal(value));
        }
        Ok(filter)
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.predicates.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Post-hoc evaluation used by backends without server-side filtering.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.predicates.iter().all(|(key, expected)| {
            metadata
                .get(key)
                .map(|actual| expected.matches(actual))
                .unwrap_or(false)
        })
    }
}
