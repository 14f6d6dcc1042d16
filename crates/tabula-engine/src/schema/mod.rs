//! # Table Schema
//!
//! Declarative description of a delimited text format, one-to-one with the
//! serialized form configuration files use.
//!
//! A [`TableSchema`] has exactly one root [`BlockSchema`]. Blocks either hold
//! rows (leaf blocks with [`ColumnSchema`]s) or nest further blocks, e.g. a
//! document block holding sentence blocks. Column order is the order cells
//! appear in a row and never changes after the schema is built.

mod validate;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::ContainerType;

pub use validate::SchemaError;

/// Identifier of a layer declared in the [`crate::manifest::CorpusManifest`].
pub type LayerId = String;

/// Separator used when a block does not declare one.
pub const TAB: &str = "TAB";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    pub root: BlockSchema,
}

/// A delimited group of rows (one sentence, one document, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSchema {
    /// Layer receiving one container per block.
    pub layer: LayerId,
    /// Layer receiving one item per row. Required for blocks with columns.
    #[serde(default)]
    pub component_layer: Option<LayerId>,
    #[serde(default)]
    pub container_type: ContainerType,
    #[serde(default)]
    pub begin: Option<AttributeSchema>,
    #[serde(default)]
    pub end: Option<AttributeSchema>,
    /// `TAB`, `SPACE`, `WHITESPACE` or a literal separator string.
    #[serde(default = "default_separator")]
    pub separator: String,
    /// Cell text standing for "no value" (e.g. `_` in CoNLL).
    #[serde(default)]
    pub no_entry_label: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnSchema>,
    /// Lines inside the block that carry container-level information.
    #[serde(default)]
    pub attributes: Vec<AttributeSchema>,
    #[serde(default)]
    pub blocks: Vec<BlockSchema>,
}

fn default_separator() -> String {
    TAB.to_string()
}

impl BlockSchema {
    /// Creates a leaf block with the default separator and no delimiters.
    pub fn new(layer: impl Into<LayerId>) -> Self {
        Self {
            layer: layer.into(),
            component_layer: None,
            container_type: ContainerType::default(),
            begin: None,
            end: None,
            separator: default_separator(),
            no_entry_label: None,
            columns: Vec::new(),
            attributes: Vec::new(),
            blocks: Vec::new(),
        }
    }

    /// Columns matched positionally against row cells (the fallback is excluded).
    pub fn positional_columns(&self) -> impl Iterator<Item = &ColumnSchema> {
        self.columns.iter().filter(|c| !c.fallback)
    }

    pub fn fallback_column(&self) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.fallback)
    }

    pub fn is_leaf(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    #[serde(default)]
    pub layer: Option<LayerId>,
    #[serde(default)]
    pub ignore: bool,
    /// Receives every cell beyond the positional columns.
    #[serde(default)]
    pub fallback: bool,
    #[serde(default)]
    pub annotation_key: Option<String>,
    #[serde(default)]
    pub resolver: Option<ResolverSchema>,
    #[serde(default)]
    pub substitutes: Vec<SubstituteSchema>,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layer: None,
            ignore: false,
            fallback: false,
            annotation_key: None,
            resolver: None,
            substitutes: Vec::new(),
        }
    }

    pub fn ignored(name: impl Into<String>) -> Self {
        Self {
            ignore: true,
            ..Self::new(name)
        }
    }

    /// A column stored as a plain annotation under `key`.
    pub fn annotation(
        name: impl Into<String>,
        layer: impl Into<LayerId>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            layer: Some(layer.into()),
            annotation_key: Some(key.into()),
            ..Self::new(name)
        }
    }

    /// A column bound to an explicit resolver.
    pub fn resolved(
        name: impl Into<String>,
        layer: impl Into<LayerId>,
        resolver: ResolverSchema,
    ) -> Self {
        Self {
            layer: Some(layer.into()),
            resolver: Some(resolver),
            ..Self::new(name)
        }
    }

    /// True if a substitute redirects this column to the current container.
    pub fn targets_container(&self) -> bool {
        self.substitutes
            .iter()
            .any(|s| s.kind == SubstituteKind::Target && s.member_type == MemberType::Container)
    }
}

/// Reference to a resolver implementation plus its options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverSchema {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl ResolverSchema {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            options: BTreeMap::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    /// The trimmed line must equal the pattern.
    #[default]
    Plain,
    /// The line must match the regular expression.
    Regex,
}

/// A line pattern (block delimiter or in-block attribute line).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSchema {
    pub pattern: String,
    #[serde(default)]
    pub pattern_type: PatternType,
    #[serde(default)]
    pub layer: Option<LayerId>,
    #[serde(default)]
    pub annotation_key: Option<String>,
    #[serde(default)]
    pub resolver: Option<ResolverSchema>,
}

impl AttributeSchema {
    pub fn plain(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            pattern_type: PatternType::Plain,
            layer: None,
            annotation_key: None,
            resolver: None,
        }
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            pattern_type: PatternType::Regex,
            ..Self::plain(pattern)
        }
    }

    /// Stores the matched payload as an annotation on the current container.
    pub fn annotated(mut self, layer: impl Into<LayerId>, key: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self.annotation_key = Some(key.into());
        self
    }

    pub fn has_binding(&self) -> bool {
        self.resolver.is_some() || self.annotation_key.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubstituteKind {
    Target,
    Addition,
    Replacement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberType {
    Item,
    Container,
    Structure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstituteSchema {
    pub kind: SubstituteKind,
    pub member_type: MemberType,
    pub layer: LayerId,
}
