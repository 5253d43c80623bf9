//! Attribute records extracted from feature-info / feature responses.

use serde::Serialize;
use serde_json::Value;

use geojson::Feature;
use geojson::feature::Id;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl AttributeValue {
    /// Nested arrays/objects are kept as their JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => AttributeValue::Null,
            Value::Bool(b) => AttributeValue::Bool(*b),
            Value::Number(n) => n
                .as_f64()
                .map(AttributeValue::Number)
                .unwrap_or_else(|| AttributeValue::Text(n.to_string())),
            Value::String(s) => AttributeValue::Text(s.clone()),
            other => AttributeValue::Text(other.to_string()),
        }
    }

    /// Null or the empty string; distinct from a field that is absent.
    pub fn is_blank(&self) -> bool {
        match self {
            AttributeValue::Null => true,
            AttributeValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::Null => Ok(()),
            AttributeValue::Bool(b) => write!(f, "{b}"),
            AttributeValue::Number(n) => write!(f, "{n}"),
            AttributeValue::Text(s) => f.write_str(s),
        }
    }
}

/// One feature's attributes, in the order the service sent them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub fields: Vec<(String, AttributeValue)>,
}

impl FeatureRecord {
    pub fn new(fields: Vec<(String, AttributeValue)>) -> Self {
        Self { id: None, fields }
    }

    /// Case-insensitive field lookup. `None` means the field is absent.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl From<&Feature> for FeatureRecord {
    fn from(feature: &Feature) -> Self {
        let id = feature.id.as_ref().map(|id| match id {
            Id::String(s) => s.clone(),
            Id::Number(n) => n.to_string(),
        });
        let fields = feature
            .properties
            .iter()
            .flatten()
            .map(|(k, v)| (k.clone(), AttributeValue::from_json(v)))
            .collect();
        Self { id, fields }
    }
}
