//! Error types for folio operations.

use thiserror::Error;

/// Errors that can occur during tree transformation or navigation fix-up.
#[derive(Error, Debug)]
pub enum Error {
    /// A required metadata key is missing or empty. Raised by the
    /// pre-traversal validation pass; the message names the dotted key.
    #[error("required metadata key missing or empty: {key}")]
    MissingMetadata { key: String },

    /// A deprecated marker was found in the document tree.
    #[error("unsupported marker: {0}")]
    UnsupportedMarker(String),

    /// A compiled package's navigation structure is missing or malformed.
    #[error("malformed table of contents: {0}")]
    MalformedNavigation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("metadata parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
