use crate::error::ExpandError;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Tag that marks a snippet whose expansions stay out of history
pub const SENSITIVE_TAG: &str = "sensitive";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Group {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            icon: None,
            order: None,
            enabled: true,
        }
    }

    /// Sort key: `order` ascending (absent sorts as 0), then `id`
    pub fn sort_key(&self) -> (i64, &str) {
        (self.order.unwrap_or(0), self.id.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub id: String,
    pub name: String,
    pub trigger: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub strict: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub defaults: BTreeMap<String, ParamValue>,
    pub template: String,
    pub group_id: String,
}

impl Snippet {
    pub fn new(
        id: impl Into<String>,
        trigger: impl Into<String>,
        template: impl Into<String>,
        group_id: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            trigger: trigger.into(),
            description: None,
            tags: BTreeSet::new(),
            strict: false,
            defaults: BTreeMap::new(),
            template: template.into(),
            group_id: group_id.into(),
        }
    }

    pub fn is_sensitive(&self) -> bool {
        self.tags.contains(SENSITIVE_TAG)
    }
}

/// The closed set of value kinds a parameter may carry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl ParamValue {
    /// Validate a loosely-typed JSON value at the process boundary
    pub fn from_json(key: &str, value: &serde_json::Value) -> Result<Self, ExpandError> {
        match value {
            serde_json::Value::String(s) => Ok(ParamValue::String(s.clone())),
            serde_json::Value::Bool(b) => Ok(ParamValue::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(ParamValue::Number)
                .ok_or_else(|| ExpandError::malformed(key, "number out of range")),
            serde_json::Value::Null => Err(ExpandError::malformed(key, "null is not allowed")),
            serde_json::Value::Array(_) => Err(ExpandError::malformed(key, "arrays are not allowed")),
            serde_json::Value::Object(_) => {
                Err(ExpandError::malformed(key, "objects are not allowed"))
            }
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            ParamValue::Number(n) => write!(f, "{}", n),
            ParamValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_string())
    }
}

/// String parameters in insertion order.
///
/// Re-inserting a key keeps its original position and replaces the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Params {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ParamsVisitor;

        impl<'de> Visitor<'de> for ParamsVisitor {
            type Value = Params;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of string parameters")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Params, A::Error> {
                let mut params = Params::new();
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    params.insert(k, v);
                }
                Ok(params)
            }
        }

        deserializer.deserialize_map(ParamsVisitor)
    }
}

/// Result of a successful expansion
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rendered {
    pub output: String,
    /// Offset in Unicode scalar values, `0..=output.chars().count()`
    pub cursor_offset: usize,
    pub used_snippet: String,
    pub used_params: Params,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultInfo {
    pub groups: usize,
    pub snippets: usize,
}
