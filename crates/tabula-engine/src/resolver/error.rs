use thiserror::Error;

use crate::model::StructureError;
use crate::schema::SchemaError;

/// How an error should be treated by the scanner and the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad schema, options or bindings. Always fatal.
    Configuration,
    /// Malformed input. Aborts the current block only.
    Content,
}

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("{resolver} resolver requires option '{option}'")]
    MissingOption {
        resolver: &'static str,
        option: &'static str,
    },

    #[error("Invalid value '{value}' for option '{option}'")]
    InvalidOption { option: String, value: String },

    #[error("Unknown resolver type '{0}'")]
    UnknownResolver(String),

    #[error("{0} resolver used before prepare_for_reading")]
    NotPrepared(&'static str),

    #[error("Invalid content in layer '{layer}': {message} (text: '{text}')")]
    Content {
        layer: String,
        text: String,
        message: String,
    },

    #[error("Unknown key '{key}' in layer '{layer}'")]
    UnknownKey { layer: String, key: String },

    #[error("Failed to build structure in layer '{layer}': {source}")]
    Structure {
        layer: String,
        source: StructureError,
    },
}

impl ResolverError {
    pub fn content(
        layer: impl Into<String>,
        text: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ResolverError::Content {
            layer: layer.into(),
            text: text.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolverError::Content { .. }
            | ResolverError::UnknownKey { .. }
            | ResolverError::Structure { .. } => ErrorKind::Content,
            ResolverError::Schema(_)
            | ResolverError::MissingOption { .. }
            | ResolverError::InvalidOption { .. }
            | ResolverError::UnknownResolver(_)
            | ResolverError::NotPrepared(_) => ErrorKind::Configuration,
        }
    }

    pub fn is_content(&self) -> bool {
        self.kind() == ErrorKind::Content
    }
}
