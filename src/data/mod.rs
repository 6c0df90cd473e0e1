//! Core data models for flag values
//!
//! This module contains the value types returned by the flag service and
//! the immutable snapshot of a whole environment held by the cache.

pub mod transport;

pub use transport::{HttpTransport, Transport};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single scalar flag value
///
/// A JSON `null` is not a `FlagValue`; it decodes to `None` wherever a
/// flag value is optional, which is how the absent marker is represented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    /// Whole numbers that fit in an `i64`; larger ones decode as `Float`
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FlagValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlagValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FlagValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a float, widening integers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FlagValue::Float(f) => Some(*f),
            FlagValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FlagValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::Bool(b) => write!(f, "{}", b),
            FlagValue::Integer(i) => write!(f, "{}", i),
            FlagValue::Float(x) => write!(f, "{}", x),
            FlagValue::Text(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<bool> for FlagValue {
    fn from(b: bool) -> Self {
        FlagValue::Bool(b)
    }
}

impl From<i64> for FlagValue {
    fn from(i: i64) -> Self {
        FlagValue::Integer(i)
    }
}

impl From<f64> for FlagValue {
    fn from(x: f64) -> Self {
        FlagValue::Float(x)
    }
}

impl From<&str> for FlagValue {
    fn from(s: &str) -> Self {
        FlagValue::Text(s.to_string())
    }
}

/// Every flag of one environment, as returned by a single fetch-all request
///
/// A snapshot is never edited after it is built; a reload replaces it
/// wholesale. Flags are kept in a `BTreeMap` so that serializing the same
/// set of flags always yields the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagSnapshot {
    flags: BTreeMap<String, Option<FlagValue>>,
}

impl FlagSnapshot {
    pub fn new(flags: BTreeMap<String, Option<FlagValue>>) -> Self {
        Self { flags }
    }

    /// Returns the value of a flag, or `None` if it is missing or null
    pub fn get(&self, name: &str) -> Option<&FlagValue> {
        self.flags.get(name).and_then(Option::as_ref)
    }

    /// Returns true if the flag is listed, even with a null value
    pub fn contains(&self, name: &str) -> bool {
        self.flags.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.flags.keys().map(String::as_str)
    }

    /// Parses the on-disk cache format
    ///
    /// Returns `None` unless the bytes are exactly one JSON object whose
    /// values are all scalars or null. Truncated or foreign content is a
    /// cache miss, never an error.
    pub fn from_json_slice(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }

    pub fn to_json_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

impl<K: Into<String>> FromIterator<(K, Option<FlagValue>)> for FlagSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, Option<FlagValue>)>>(iter: I) -> Self {
        Self {
            flags: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_value_decodes_each_scalar_kind() {
        let value: FlagValue = serde_json::from_str("true").unwrap();
        assert_eq!(value, FlagValue::Bool(true));
        let value: FlagValue = serde_json::from_str("100").unwrap();
        assert_eq!(value, FlagValue::Integer(100));
        let value: FlagValue = serde_json::from_str("0.25").unwrap();
        assert_eq!(value, FlagValue::Float(0.25));
        let value: FlagValue = serde_json::from_str("\"blue\"").unwrap();
        assert_eq!(value, FlagValue::Text("blue".to_string()));
    }

    #[test]
    fn test_null_decodes_to_absent() {
        let value: Option<FlagValue> = serde_json::from_str("null").unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_huge_integer_falls_back_to_float() {
        let value: FlagValue = serde_json::from_str("18446744073709551615").unwrap();
        assert!(matches!(value, FlagValue::Float(_)));
    }

    #[test]
    fn test_non_scalar_is_not_a_flag_value() {
        assert!(serde_json::from_str::<FlagValue>("[1, 2]").is_err());
        assert!(serde_json::from_str::<FlagValue>("{\"a\": 1}").is_err());
    }

    #[test]
    fn test_accessors_only_match_their_own_kind() {
        assert_eq!(FlagValue::Bool(true).as_bool(), Some(true));
        assert_eq!(FlagValue::Integer(1).as_bool(), None);
        assert_eq!(FlagValue::Integer(7).as_f64(), Some(7.0));
        assert_eq!(FlagValue::Text("x".into()).as_str(), Some("x"));
        assert_eq!(FlagValue::Float(1.5).as_i64(), None);
    }

    #[test]
    fn test_display_quotes_text() {
        assert_eq!(FlagValue::Text("on".into()).to_string(), "\"on\"");
        assert_eq!(FlagValue::Integer(3).to_string(), "3");
        assert_eq!(FlagValue::Bool(false).to_string(), "false");
    }

    #[test]
    fn test_snapshot_parses_object_with_nulls() {
        let snapshot =
            FlagSnapshot::from_json_slice(br#"{"flagA": true, "flagB": 100, "flagN": null}"#)
                .expect("object should parse");
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.get("flagA"), Some(&FlagValue::Bool(true)));
        assert_eq!(snapshot.get("flagB"), Some(&FlagValue::Integer(100)));
        assert_eq!(snapshot.get("flagN"), None);
        assert!(snapshot.contains("flagN"));
        assert!(!snapshot.contains("flagC"));
    }

    #[test]
    fn test_snapshot_rejects_other_shapes() {
        assert!(FlagSnapshot::from_json_slice(b"[true, false]").is_none());
        assert!(FlagSnapshot::from_json_slice(b"true").is_none());
        assert!(FlagSnapshot::from_json_slice(b"{\"flagA\": tr").is_none());
        assert!(FlagSnapshot::from_json_slice(b"").is_none());
        assert!(FlagSnapshot::from_json_slice(br#"{"nested": {"a": 1}}"#).is_none());
    }

    #[test]
    fn test_snapshot_serialization_is_deterministic() {
        let a: FlagSnapshot = [
            ("zeta", Some(FlagValue::Bool(true))),
            ("alpha", Some(FlagValue::Integer(1))),
        ]
        .into_iter()
        .collect();
        let b: FlagSnapshot = [
            ("alpha", Some(FlagValue::Integer(1))),
            ("zeta", Some(FlagValue::Bool(true))),
        ]
        .into_iter()
        .collect();
        assert_eq!(a.to_json_vec().unwrap(), b.to_json_vec().unwrap());
        assert_eq!(
            String::from_utf8(a.to_json_vec().unwrap()).unwrap(),
            r#"{"alpha":1,"zeta":true}"#
        );
    }

    #[test]
    fn test_snapshot_from_map_lists_names_in_order() {
        let mut flags = BTreeMap::new();
        flags.insert("zeta".to_string(), Some(FlagValue::Bool(false)));
        flags.insert("alpha".to_string(), None);
        let snapshot = FlagSnapshot::new(flags);

        assert!(!snapshot.is_empty());
        assert!(FlagSnapshot::default().is_empty());
        assert_eq!(snapshot.names().collect::<Vec<_>>(), vec!["alpha", "zeta"]);
        assert!(snapshot.contains("alpha"));
        assert_eq!(snapshot.get("alpha"), None);
    }
}
