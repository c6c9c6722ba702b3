//! Error types for label rendering.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building or rendering a label.
#[derive(Debug, Error)]
pub enum LabelError {
    /// The label type name is not one of the known kinds.
    #[error("unknown label type '{name}' (available: {available})")]
    UnknownLabelType { name: String, available: String },

    /// An attribute value does not fit the attribute's declared type.
    #[error("invalid value '{value}' for label attribute '{name}' (expected {expected})")]
    InvalidAttribute {
        name: String,
        value: String,
        expected: &'static str,
    },

    /// Template loading or rendering failure.
    #[error("template error: {0}")]
    Template(String),

    /// The QR payload could not be encoded.
    #[error("QR code error: {0}")]
    QrCode(String),

    /// The converter program could not be started.
    #[error("failed to start converter '{program}': {source}")]
    ConverterSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The converter exited unsuccessfully.
    #[error("converter exited with {status}: {stderr}")]
    ConverterFailed { status: String, stderr: String },

    /// The converter did not finish in time and was killed.
    #[error("converter '{program}' timed out after {timeout_secs}s")]
    ConverterTimeout { program: String, timeout_secs: u64 },

    /// Writing the rendered document failed.
    #[error("failed to write label to {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tera::Error> for LabelError {
    fn from(err: tera::Error) -> Self {
        // Tera's top-level message rarely names the actual problem.
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        LabelError::Template(message)
    }
}

/// Convenience alias for results with [`LabelError`].
pub type Result<T> = std::result::Result<T, LabelError>;
