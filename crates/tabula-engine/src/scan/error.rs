use thiserror::Error;

use crate::resolver::ResolverError;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Failed to prepare {location}: {source}")]
    Prepare {
        location: String,
        #[source]
        source: ResolverError,
    },

    #[error("Line {line}: expected {expected} cells, found {found}")]
    CellCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}, {location}: {source}")]
    Resolver {
        line: usize,
        location: String,
        #[source]
        source: ResolverError,
    },

    #[error("Line {line}: unexpected line '{text}' in block '{block}'")]
    UnexpectedLine {
        line: usize,
        block: String,
        text: String,
    },
}

impl ScanError {
    /// Content errors are the ones a [`super::ErrorPolicy::SkipBlock`] import
    /// may skip over. Everything else stops the import.
    pub fn is_content(&self) -> bool {
        match self {
            ScanError::Prepare { .. } => false,
            ScanError::CellCount { .. } | ScanError::UnexpectedLine { .. } => true,
            ScanError::Resolver { source, .. } => source.is_content(),
        }
    }

    /// The 1-based line the error was found on, if it came from content.
    pub fn line(&self) -> Option<usize> {
        match self {
            ScanError::Prepare { .. } => None,
            ScanError::CellCount { line, .. }
            | ScanError::Resolver { line, .. }
            | ScanError::UnexpectedLine { line, .. } => Some(*line),
        }
    }
}
