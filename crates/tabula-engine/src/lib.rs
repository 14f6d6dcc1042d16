//! # tabula-engine
//!
//! Schema-driven import of delimited corpus files (CoNLL and friends) into
//! items, containers and structures.
//!
//! ```text
//! TableSchema ─┐
//!              ├─ Converter ─ Scanner ─ column dispatch ─ Resolver / BatchResolver
//! Manifest ────┘                 │                              │
//!                                └──────── ImportOutput ◄───────┘
//!                                               │
//!                                         LayerAnalyzer ─ CorpusMetadata
//! ```
//!
//! ## Modules
//!
//! - **`schema`**: block/column/attribute tree and its validation
//! - **`manifest`**: layer declarations the schema binds to
//! - **`converter`**: validated schema + manifest with layer handles
//! - **`model`**: items, containers, structures, sinks and annotation storage
//! - **`resolver`**: resolver capabilities, contexts, options and registry
//! - **`resolvers`**: the built-in annotation, property-list and dependency resolvers
//! - **`scan`**: block scanner and column dispatcher
//! - **`stats`**: per-layer statistics and persisted metadata
//! - **`import`**: multi-file driver tying scanning and statistics together

pub mod converter;
pub mod import;
pub mod manifest;
pub mod model;
pub mod resolver;
pub mod resolvers;
pub mod scan;
pub mod schema;
pub mod stats;
pub mod text;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use converter::Converter;
pub use import::{ErrorPolicy, FileReport, ImportError, ImportOptions, Importer};
pub use manifest::{AnnotationKeyManifest, CorpusManifest, LayerKind, LayerManifest, ValueType};
pub use model::*;
pub use resolver::{
    BatchResolver, BoundResolver, ReadMode, Resolver, ResolverContext, ResolverError,
    ResolverOptions, ResolverRegistry,
};
pub use scan::{ScanError, ScanReport, Scanner, SkippedBlock};
pub use schema::*;
pub use stats::{
    CorpusMetadata, Distribution, FileCoverage, LayerAnalyzer, LayerMetadata, MetadataError,
    StatsBuffer,
};
