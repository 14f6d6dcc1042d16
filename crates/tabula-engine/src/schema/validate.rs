use thiserror::Error;

use super::{BlockSchema, TableSchema};

/// Configuration problems found before any row is read.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Block '{block}' declares {count} fallback columns, at most one is allowed")]
    MultipleFallbackColumns { block: String, count: usize },

    #[error("Column '{column}' in block '{block}' has neither a resolver nor an annotation key")]
    UnboundColumn { block: String, column: String },

    #[error("Block '{block}' has rows but no component layer")]
    MissingComponentLayer { block: String },

    #[error("Block '{block}' declares no columns")]
    NoColumns { block: String },

    #[error("Block '{block}' declares an empty separator")]
    EmptySeparator { block: String },

    #[error("Block '{block}' mixes columns and nested blocks")]
    MixedBlock { block: String },

    #[error("Block '{block}' has more than one nested block without a begin delimiter")]
    AmbiguousNestedBlocks { block: String },

    #[error("Attribute '{pattern}' in block '{block}' has no resolver or annotation key")]
    UnboundAttribute { block: String, pattern: String },

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("Unknown layer '{0}'")]
    UnknownLayer(String),

    #[error("Layer '{layer}' is declared as {actual}, expected {expected}")]
    LayerKindMismatch {
        layer: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Layer '{0}' is declared twice")]
    DuplicateLayer(String),
}

impl TableSchema {
    /// Checks the structural rules of the block tree.
    ///
    /// Layer references are checked separately by
    /// [`crate::converter::Converter::new`], which also sees the manifest.
    pub fn validate(&self) -> Result<(), SchemaError> {
        validate_block(&self.root)
    }
}

fn validate_block(block: &BlockSchema) -> Result<(), SchemaError> {
    let fallbacks = block.columns.iter().filter(|c| c.fallback).count();
    if fallbacks > 1 {
        return Err(SchemaError::MultipleFallbackColumns {
            block: block.layer.clone(),
            count: fallbacks,
        });
    }

    if block.separator.is_empty() {
        return Err(SchemaError::EmptySeparator {
            block: block.layer.clone(),
        });
    }

    if !block.columns.is_empty() && !block.blocks.is_empty() {
        return Err(SchemaError::MixedBlock {
            block: block.layer.clone(),
        });
    }

    if block.is_leaf() {
        if block.positional_columns().next().is_none() {
            return Err(SchemaError::NoColumns {
                block: block.layer.clone(),
            });
        }
        if block.component_layer.is_none() {
            return Err(SchemaError::MissingComponentLayer {
                block: block.layer.clone(),
            });
        }
    }

    for column in &block.columns {
        if !column.ignore && column.resolver.is_none() && column.annotation_key.is_none() {
            return Err(SchemaError::UnboundColumn {
                block: block.layer.clone(),
                column: column.name.clone(),
            });
        }
    }

    for attribute in &block.attributes {
        if !attribute.has_binding() {
            return Err(SchemaError::UnboundAttribute {
                block: block.layer.clone(),
                pattern: attribute.pattern.clone(),
            });
        }
    }

    let implicit = block.blocks.iter().filter(|b| b.begin.is_none()).count();
    if implicit > 1 {
        return Err(SchemaError::AmbiguousNestedBlocks {
            block: block.layer.clone(),
        });
    }

    block.blocks.iter().try_for_each(validate_block)
}
