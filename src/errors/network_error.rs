//! Network-related error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Broad category of a [`NetworkError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected input: bad shape, wrong arity, duplicate names or layers.
    Validation,
    /// The model file could not be opened, read or written.
    Io,
    /// Unknown activation or a link that does not fit the network.
    Config,
    /// The link graph has no valid evaluation order.
    Cycle,
    /// A model file does not follow the `.nll` grammar.
    Format,
}

/// Errors that can occur while building, evaluating or persisting a network.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Layer shape must have at least one dimension")]
    EmptyShape,

    #[error("Layer shape {shape:?} contains a zero dimension")]
    ZeroDimension { shape: Vec<usize> },

    #[error("Layer shape {shape:?} overflows the addressable neuron count")]
    SizeOverflow { shape: Vec<usize> },

    #[error("Sample {field} arity mismatch: expected {expected}, got {actual}")]
    ArityMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Layer name '{name}' is already registered")]
    DuplicateName { name: String },

    #[error("Layer '{existing}' is already registered, cannot bind it again as '{name}'")]
    DuplicateLayer { name: String, existing: String },

    #[error("Invalid layer name {name:?}: names must be non-empty and free of ',', '=', '[', ']' and line breaks")]
    InvalidName { name: String },

    #[error("I/O error on '{}': {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid activation: {name} (expected one of: sigmoid, linear)")]
    UnknownActivation { name: String },

    #[error("Layer #{layer} does not exist in this network")]
    UnknownLayer { layer: usize },

    #[error("Link between layers of {source_size} and {target_size} neurons needs more synapses than fit in memory")]
    LinkTooLarge {
        source_size: usize,
        target_size: usize,
    },

    #[error("Link {role} layer #{layer} is not registered in the network")]
    UnregisteredLayer { role: &'static str, layer: usize },

    #[error("Link {role} layer '{layer}' size mismatch: expected {expected}, got {actual}")]
    LinkSizeMismatch {
        role: &'static str,
        layer: String,
        expected: usize,
        actual: usize,
    },

    #[error("Links form a cycle through layers: {}", .layers.join(", "))]
    Cycle { layers: Vec<String> },

    #[error("Malformed model file: {message}")]
    Format { message: String },

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NetworkError {
    /// Returns the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            NetworkError::EmptyShape
            | NetworkError::ZeroDimension { .. }
            | NetworkError::SizeOverflow { .. }
            | NetworkError::ArityMismatch { .. }
            | NetworkError::DuplicateName { .. }
            | NetworkError::DuplicateLayer { .. }
            | NetworkError::InvalidName { .. } => ErrorKind::Validation,
            NetworkError::Io { .. } => ErrorKind::Io,
            NetworkError::UnknownActivation { .. }
            | NetworkError::UnknownLayer { .. }
            | NetworkError::UnregisteredLayer { .. }
            | NetworkError::LinkTooLarge { .. }
            | NetworkError::LinkSizeMismatch { .. } => ErrorKind::Config,
            NetworkError::Cycle { .. } => ErrorKind::Cycle,
            NetworkError::Format { .. } | NetworkError::Json(_) => ErrorKind::Format,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NetworkError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn format(message: impl Into<String>) -> Self {
        NetworkError::Format {
            message: message.into(),
        }
    }
}
