//! # Layer Statistics
//!
//! A [`LayerAnalyzer`] watches the members one file contributes to one layer
//! and folds what it saw into [`CorpusMetadata`]: the file's range of corpus
//! indices, the layer's size, child-count and span-size distributions, and
//! how often each container type occurred.
//!
//! Files must be recorded in ascending order. A file's range begins where the
//! previous file's range ends, so recording file `n` before file `n - 1` is a
//! [`MetadataError`].

mod buffer;
mod metadata;

use std::collections::BTreeMap;

use log::warn;

use crate::model::{ContainerType, Member};

pub use buffer::StatsBuffer;
pub use metadata::{CorpusMetadata, Distribution, FileCoverage, LayerMetadata, MetadataError};

pub struct LayerAnalyzer {
    layer: String,
    elements: u64,
    first_index: Option<u64>,
    item_counts: StatsBuffer,
    span_sizes: StatsBuffer,
    container_types: BTreeMap<ContainerType, u64>,
}

impl LayerAnalyzer {
    pub fn new(layer: impl Into<String>) -> Self {
        Self {
            layer: layer.into(),
            elements: 0,
            first_index: None,
            item_counts: StatsBuffer::new(),
            span_sizes: StatsBuffer::new(),
            container_types: BTreeMap::new(),
        }
    }

    pub fn layer(&self) -> &str {
        &self.layer
    }

    pub fn accept(&mut self, member: &Member, index: u64) {
        self.elements += 1;
        self.first_index.get_or_insert(index);

        if let Some((children, span_size, container_type)) = member.container_info() {
            self.item_counts.accept(children as i64);
            if let Some(size) = span_size.filter(|s| *s > 0) {
                self.span_sizes.accept(size as i64);
            }
            *self.container_types.entry(container_type).or_insert(0) += 1;
        }
    }

    /// Records the pass over `file` and leaves the analyzer ready for the
    /// next file.
    pub fn finish(
        &mut self,
        file: usize,
        metadata: &mut CorpusMetadata,
    ) -> Result<FileCoverage, MetadataError> {
        let layer = metadata.layer_mut(&self.layer);
        if layer.file(file).is_some() {
            return Err(MetadataError::AlreadyRecorded {
                layer: self.layer.clone(),
                file,
            });
        }

        let begin = match file.checked_sub(1) {
            None => 0,
            Some(previous) => layer.file(previous).map(|f| f.end).ok_or_else(|| {
                MetadataError::MissingPreviousFile {
                    layer: self.layer.clone(),
                    file,
                    previous,
                }
            })?,
        };
        if let Some(first) = self.first_index
            && first != begin
        {
            warn!(
                "Layer '{}' file {file}: first member has index {first}, \
                 coverage begins at {begin}",
                self.layer
            );
        }

        let coverage = FileCoverage {
            file,
            begin,
            end: begin + self.elements,
            item_counts: self.item_counts.flush(),
            span_sizes: self.span_sizes.flush(),
        };
        let container_types = std::mem::take(&mut self.container_types)
            .into_iter()
            .map(|(ty, count)| (ty.as_str().to_string(), count))
            .collect();
        layer.record(coverage.clone(), &container_types);

        self.elements = 0;
        self.first_index = None;
        Ok(coverage)
    }
}
