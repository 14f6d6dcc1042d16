//! # Importer
//!
//! Drives the [`Scanner`] over an ordered list of files. Corpus indices run
//! on from one file to the next, and after each file a [`LayerAnalyzer`] per
//! item, container and structure layer records the file in the metadata.
//!
//! A file either imports completely or not at all: a failing file leaves
//! the output, the metadata and the index counters as they were.

use std::collections::BTreeMap;

use log::{debug, info};
use serde::Serialize;
use thiserror::Error;
use xi_rope::Rope;

use crate::converter::Converter;
use crate::model::ImportOutput;
use crate::resolver::{CacheProvider, NoCache, ReadMode, ResolverRegistry};
use crate::scan::{IndexCounters, ScanError, Scanner, SkippedBlock};
use crate::stats::{CorpusMetadata, FileCoverage, LayerAnalyzer, MetadataError};
use crate::text::{LineRef, lines_with_spans};

pub use crate::scan::ErrorPolicy;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    pub policy: ErrorPolicy,
    pub mode: ReadMode,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Failed to set up import: {0}")]
    Setup(#[from] ScanError),

    #[error("File {file}: {source}")]
    File {
        file: usize,
        #[source]
        source: ScanError,
    },

    #[error("File {file}: {source}")]
    Metadata {
        file: usize,
        #[source]
        source: MetadataError,
    },

    #[error("File {file} imported out of order, expected file {expected}")]
    OutOfOrder { file: usize, expected: usize },
}

impl ImportError {
    /// The file index the error belongs to, if any.
    pub fn file(&self) -> Option<usize> {
        match self {
            ImportError::Setup(_) => None,
            ImportError::File { file, .. }
            | ImportError::Metadata { file, .. }
            | ImportError::OutOfOrder { file, .. } => Some(*file),
        }
    }
}

/// What one file contributed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub file: usize,
    pub lines: usize,
    pub containers: usize,
    pub layers: BTreeMap<String, FileCoverage>,
    pub skipped: Vec<SkippedBlock>,
}

impl FileReport {
    pub fn members(&self, layer: &str) -> u64 {
        self.layers.get(layer).map_or(0, FileCoverage::len)
    }
}

pub struct Importer<'c> {
    converter: &'c Converter,
    scanner: Scanner,
    counters: IndexCounters,
    output: ImportOutput,
    metadata: CorpusMetadata,
    next_file: usize,
}

impl<'c> Importer<'c> {
    /// Prepares every resolver the schema binds. Configuration errors are
    /// returned here, before any file is read.
    pub fn new(
        converter: &'c Converter,
        registry: &ResolverRegistry,
        options: ImportOptions,
    ) -> Result<Self, ImportError> {
        Self::with_cache(converter, registry, options, &NoCache)
    }

    pub fn with_cache(
        converter: &'c Converter,
        registry: &ResolverRegistry,
        options: ImportOptions,
        cache: &dyn CacheProvider,
    ) -> Result<Self, ImportError> {
        let scanner = Scanner::new(converter, registry, options.mode, cache, options.policy)?;
        Ok(Self {
            converter,
            scanner,
            counters: IndexCounters::default(),
            output: ImportOutput::default(),
            metadata: CorpusMetadata::default(),
            next_file: 0,
        })
    }

    /// Continues a corpus whose earlier files are recorded in `metadata`.
    ///
    /// Index counters resume at the end of each layer's last recorded file.
    pub fn resume(mut self, metadata: CorpusMetadata) -> Self {
        for (handle, manifest) in self.converter.member_layers() {
            let last = metadata
                .layer(&manifest.id)
                .and_then(|l| l.files.iter().max_by_key(|f| f.file));
            if let Some(last) = last {
                self.counters.set_next(handle, last.end);
                self.next_file = self.next_file.max(last.file + 1);
            }
        }
        self.metadata = metadata;
        self
    }

    /// Index the next imported file must have.
    pub fn next_file(&self) -> usize {
        self.next_file
    }

    pub fn import_file(&mut self, file: usize, text: &str) -> Result<FileReport, ImportError> {
        if file != self.next_file {
            return Err(ImportError::OutOfOrder {
                file,
                expected: self.next_file,
            });
        }

        let rope = Rope::from(text);
        let lines: Vec<LineRef> = lines_with_spans(&rope).collect();

        let mut counters = self.counters.clone();
        let mut output = ImportOutput::default();
        let scanned = self
            .scanner
            .scan(&lines, &mut counters, &mut output)
            .map_err(|source| ImportError::File { file, source })?;

        let mut metadata = self.metadata.clone();
        let mut layers = BTreeMap::new();
        for (handle, manifest) in self.converter.member_layers() {
            let mut analyzer = LayerAnalyzer::new(&manifest.id);
            if let Some(buffer) = output.layer(handle) {
                for (index, member) in buffer.members() {
                    analyzer.accept(member, index);
                }
            }
            let coverage = analyzer
                .finish(file, &mut metadata)
                .map_err(|source| ImportError::Metadata { file, source })?;
            debug!(
                "File {file} layer '{}': indices {}..{}",
                manifest.id, coverage.begin, coverage.end
            );
            layers.insert(manifest.id.clone(), coverage);
        }

        self.counters = counters;
        self.metadata = metadata;
        self.output.absorb(output);
        self.next_file += 1;

        info!(
            "Imported file {file}: {} lines, {} containers, {} skipped blocks",
            lines.len(),
            scanned.containers,
            scanned.skipped.len()
        );
        Ok(FileReport {
            file,
            lines: lines.len(),
            containers: scanned.containers,
            layers,
            skipped: scanned.skipped,
        })
    }

    pub fn output(&self) -> &ImportOutput {
        &self.output
    }

    pub fn metadata(&self) -> &CorpusMetadata {
        &self.metadata
    }

    /// Closes every resolver and hands out what was imported.
    pub fn finish(mut self) -> (ImportOutput, CorpusMetadata) {
        self.scanner.close();
        (self.output, self.metadata)
    }
}
