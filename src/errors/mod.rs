//! Error types for layer, link, network and model-file operations.

mod network_error;

pub use network_error::{ErrorKind, NetworkError, Result};
