//! Errors raised while declaring, parsing or querying a world.

use thiserror::Error;

/// Crate result type
pub type Result<T> = std::result::Result<T, WorldBuilderError>;

/// Everything that can go wrong between reading a document and answering a
/// query. None of these are recoverable: the document has to change.
#[derive(Debug, Error)]
pub enum WorldBuilderError {
    #[error("missing required entry `{path}`")]
    MissingEntry { path: String },

    #[error("unknown path `{path}`: it was never declared")]
    UnknownPath { path: String },

    #[error("type mismatch at `{path}`: expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("could not parse `{path}` as {expected}: {message}")]
    ParseError {
        path: String,
        expected: &'static str,
        message: String,
    },

    #[error("entry `{path}` is already declared")]
    DuplicateDeclaration { path: String },

    #[error("unknown feature type `{name}` at `{path}`")]
    UnknownFeatureType { name: String, path: String },

    #[error("unknown coordinate system `{name}`")]
    UnknownCoordinateSystemType { name: String },

    #[error("invalid configuration at `{path}`: {message}")]
    ConfigError { path: String, message: String },

    #[error("{message}")]
    ModeError { message: String },

    #[error("internal error at `{path}`: {message}")]
    InternalInvariantError { path: String, message: String },

    #[error("malformed document: {0}")]
    Document(#[from] serde_json::Error),
}

impl WorldBuilderError {
    pub(crate) fn parse(path: &str, expected: &'static str, message: impl Into<String>) -> Self {
        WorldBuilderError::ParseError {
            path: path.to_string(),
            expected,
            message: message.into(),
        }
    }

    pub(crate) fn config(path: &str, message: impl Into<String>) -> Self {
        WorldBuilderError::ConfigError {
            path: path.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn internal(path: &str, message: impl Into<String>) -> Self {
        WorldBuilderError::InternalInvariantError {
            path: path.to_string(),
            message: message.into(),
        }
    }
}
