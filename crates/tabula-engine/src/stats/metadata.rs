use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Persisted (min, max, avg) triple plus the number of samples behind it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub min: i64,
    pub max: i64,
    pub avg: f64,
    pub samples: u64,
}

impl Distribution {
    /// Combines two distributions as if their samples had been seen together.
    pub fn merge(&self, other: &Distribution) -> Distribution {
        let samples = self.samples + other.samples;
        let avg = if samples == 0 {
            0.0
        } else {
            (self.avg * self.samples as f64 + other.avg * other.samples as f64) / samples as f64
        };
        Distribution {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
            avg,
            samples,
        }
    }
}

fn merge(
    current: Option<Distribution>,
    next: Option<Distribution>,
) -> Option<Distribution> {
    match (current, next) {
        (Some(a), Some(b)) => Some(a.merge(&b)),
        (a, b) => a.or(b),
    }
}

/// The corpus indices one file contributed to a layer: `begin..end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileCoverage {
    pub file: usize,
    pub begin: u64,
    /// Exclusive end; the next file begins here.
    pub end: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_counts: Option<Distribution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_sizes: Option<Distribution>,
}

impl FileCoverage {
    pub fn len(&self) -> u64 {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.begin
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerMetadata {
    /// Members over all recorded files.
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_counts: Option<Distribution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_sizes: Option<Distribution>,
    #[serde(default)]
    pub container_types: BTreeMap<String, u64>,
    #[serde(default)]
    pub files: Vec<FileCoverage>,
}

impl LayerMetadata {
    pub fn file(&self, file: usize) -> Option<&FileCoverage> {
        self.files.iter().find(|f| f.file == file)
    }

    /// Folds one file's pass into the layer totals.
    pub fn record(&mut self, coverage: FileCoverage, container_types: &BTreeMap<String, u64>) {
        self.size += coverage.len();
        self.item_counts = merge(self.item_counts, coverage.item_counts);
        self.span_sizes = merge(self.span_sizes, coverage.span_sizes);
        for (ty, count) in container_types {
            *self.container_types.entry(ty.clone()).or_insert(0) += count;
        }
        self.files.push(coverage);
    }
}

/// Everything the analyzer persists, keyed by layer id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusMetadata {
    #[serde(default)]
    pub layers: BTreeMap<String, LayerMetadata>,
}

impl CorpusMetadata {
    pub fn layer(&self, layer: &str) -> Option<&LayerMetadata> {
        self.layers.get(layer)
    }

    pub fn layer_mut(&mut self, layer: &str) -> &mut LayerMetadata {
        self.layers.entry(layer.to_string()).or_default()
    }
}

/// Persisted metadata that contradicts the file being recorded.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetadataError {
    #[error("Layer '{layer}' has no coverage for file {previous}, needed to place file {file}")]
    MissingPreviousFile {
        layer: String,
        file: usize,
        previous: usize,
    },

    #[error("Layer '{layer}' already has coverage for file {file}")]
    AlreadyRecorded { layer: String, file: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_weights_by_samples() {
        let a = Distribution {
            min: 2,
            max: 4,
            avg: 3.0,
            samples: 3,
        };
        let b = Distribution {
            min: 1,
            max: 9,
            avg: 9.0,
            samples: 1,
        };

        let merged = a.merge(&b);

        assert_eq!(merged.samples, 4);
        assert_eq!((merged.min, merged.max), (1, 9));
        assert!((merged.avg - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_side_keeps_the_other() {
        let a = Distribution {
            min: 2,
            max: 2,
            avg: 2.0,
            samples: 1,
        };
        assert_eq!(merge(None, Some(a)), Some(a));
        assert_eq!(merge(None, None), None);
    }
}
