//! Layer declarations.
//!
//! The schema only names layers; the manifest says what each layer is. An
//! annotation layer also declares its key set, which the property-list
//! resolver turns into one nested resolver per key.

use serde::{Deserialize, Serialize};

use crate::model::Value;
use crate::schema::LayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// Items and containers (tokens, sentences, documents).
    Item,
    /// Key/value annotations on items of another layer.
    Annotation,
    /// Graph structures built over containers.
    Structure,
}

impl LayerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LayerKind::Item => "item",
            LayerKind::Annotation => "annotation",
            LayerKind::Structure => "structure",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    String,
    Integer,
    Float,
    Boolean,
}

impl ValueType {
    /// Converts raw cell text into a value of this type.
    pub fn parse(self, raw: &str) -> Option<Value> {
        match self {
            ValueType::String => Some(Value::String(raw.to_string())),
            ValueType::Integer => raw.trim().parse().ok().map(Value::Integer),
            ValueType::Float => raw.trim().parse().ok().map(Value::Float),
            ValueType::Boolean => raw.trim().parse().ok().map(Value::Boolean),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Boolean => "boolean",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationKeyManifest {
    pub key: String,
    #[serde(default)]
    pub value_type: ValueType,
}

impl AnnotationKeyManifest {
    pub fn new(key: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            key: key.into(),
            value_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerManifest {
    pub id: LayerId,
    pub kind: LayerKind,
    /// Declared annotation keys (annotation layers only).
    #[serde(default)]
    pub keys: Vec<AnnotationKeyManifest>,
}

impl LayerManifest {
    pub fn item(id: impl Into<LayerId>) -> Self {
        Self {
            id: id.into(),
            kind: LayerKind::Item,
            keys: Vec::new(),
        }
    }

    pub fn structure(id: impl Into<LayerId>) -> Self {
        Self {
            id: id.into(),
            kind: LayerKind::Structure,
            keys: Vec::new(),
        }
    }

    pub fn annotation(
        id: impl Into<LayerId>,
        keys: impl IntoIterator<Item = AnnotationKeyManifest>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: LayerKind::Annotation,
            keys: keys.into_iter().collect(),
        }
    }

    pub fn key(&self, key: &str) -> Option<&AnnotationKeyManifest> {
        self.keys.iter().find(|k| k.key == key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusManifest {
    pub layers: Vec<LayerManifest>,
}

impl CorpusManifest {
    pub fn new(layers: impl IntoIterator<Item = LayerManifest>) -> Self {
        Self {
            layers: layers.into_iter().collect(),
        }
    }

    pub fn layer(&self, id: &str) -> Option<&LayerManifest> {
        self.layers.iter().find(|l| l.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_values_parse_or_reject() {
        assert_eq!(ValueType::Integer.parse(" 42"), Some(Value::Integer(42)));
        assert_eq!(ValueType::Integer.parse("4x"), None);
        assert_eq!(ValueType::Boolean.parse("true"), Some(Value::Boolean(true)));
        assert_eq!(
            ValueType::String.parse(" raw "),
            Some(Value::String(" raw ".into()))
        );
    }

    #[test]
    fn looks_up_declared_keys() {
        let layer = LayerManifest::annotation(
            "feats",
            [AnnotationKeyManifest::new("Person", ValueType::Integer)],
        );
        assert_eq!(
            layer.key("Person").map(|k| k.value_type),
            Some(ValueType::Integer)
        );
        assert!(layer.key("Number").is_none());
    }
}
