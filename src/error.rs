//! Error types
//!
//! Each layer has its own error enum: `SdpError` for malformed SDP text,
//! `SapError` for malformed SAP packets, `ValidationError` for rejected
//! field values. All convert into the crate-level [`Error`].

use std::sync::Arc;

/// Crate-level result type
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug, Clone)]
pub enum Error {
    /// Malformed SDP text
    Sdp(SdpError),
    /// Malformed SAP packet
    Sap(SapError),
    /// Invalid field value
    Validation(ValidationError),
    /// Transport / socket error
    Io(Arc<std::io::Error>),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Sdp(e) => write!(f, "SDP error: {}", e),
            Error::Sap(e) => write!(f, "SAP error: {}", e),
            Error::Validation(e) => write!(f, "Validation error: {}", e),
            Error::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Sdp(e) => Some(e),
            Error::Sap(e) => Some(e),
            Error::Validation(e) => Some(e),
            Error::Io(e) => Some(e.as_ref()),
        }
    }
}

impl From<SdpError> for Error {
    fn from(e: SdpError) -> Self {
        Error::Sdp(e)
    }
}

impl From<SapError> for Error {
    fn from(e: SapError) -> Self {
        Error::Sap(e)
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::Validation(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(Arc::new(e))
    }
}

/// Error type for SDP text parsing
///
/// Parsing aborts on the first malformed line; no partial document is
/// ever returned. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdpError {
    /// Line does not match the grammar for its type
    InvalidLine { line: usize, text: String },
    /// Recognized but unsupported line type (`z`, `k`, `r`) or version
    UnsupportedLine { line: usize, text: String },
    /// A mandatory field (`v=`, `o=`, `s=`) is missing
    MissingField(&'static str),
}

impl std::fmt::Display for SdpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SdpError::InvalidLine { line, text } => {
                write!(f, "invalid line {}: {:?}", line, text)
            }
            SdpError::UnsupportedLine { line, text } => {
                write!(f, "unsupported line {}: {:?}", line, text)
            }
            SdpError::MissingField(field) => {
                write!(f, "mandatory field '{}' is missing", field)
            }
        }
    }
}

impl std::error::Error for SdpError {}

/// Error type for SAP packet decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SapError {
    /// Packet shorter than its header claims
    PacketTooShort(usize),
    /// Encrypted payloads have no handler
    EncryptionNotSupported,
    /// Compressed payload failed to inflate
    DecompressionFailed(String),
    /// Payload is not valid UTF-8 text
    InvalidPayload,
    /// Deletion payload does not carry a full `o=` line body
    InvalidDeletionOrigin,
}

impl std::fmt::Display for SapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SapError::PacketTooShort(len) => write!(f, "packet too short: {} bytes", len),
            SapError::EncryptionNotSupported => write!(f, "encrypted payloads are not supported"),
            SapError::DecompressionFailed(e) => write!(f, "failed to inflate payload: {}", e),
            SapError::InvalidPayload => write!(f, "payload is not valid UTF-8"),
            SapError::InvalidDeletionOrigin => {
                write!(f, "deletion payload does not contain an origin line")
            }
        }
    }
}

impl std::error::Error for SapError {}

/// Error type for value construction
///
/// Raised synchronously when a required field is missing or empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Name of the rejected field
    pub field: &'static str,
}

impl ValidationError {
    pub(crate) fn new(field: &'static str) -> Self {
        Self { field }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "field '{}' must not be empty", self.field)
    }
}

impl std::error::Error for ValidationError {}
