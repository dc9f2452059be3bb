//! use kfcert::error::KfCertError;

use thiserror::Error;

/// Represents errors that can occur while resolving or recovering certificates.
///
/// `NotFound` and `InvalidRequest` describe problems with the caller's input;
/// the remaining variants are operational failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KfCertError {
    /// No usable identifier or recovery selector was supplied.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A well-formed query matched zero certificates.
    #[error("Certificate not found: {0}")]
    NotFound(String),

    /// The directory query transport or the remote system failed.
    #[error("Certificate query failed{}: {message}", status_suffix(.status))]
    QueryError {
        status: Option<u16>,
        message: String,
    },

    /// The remote recovery call failed.
    #[error("Certificate recovery failed{}: {message}", status_suffix(.status))]
    RecoveryError {
        status: Option<u16>,
        message: String,
    },

    /// Malformed DER, PEM, base64 or PKCS#12 data, or a wrong bundle password.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {code})"),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, KfCertError>;

impl From<der::Error> for KfCertError {
    /// Converts a `der::Error` into a `KfCertError`.
    fn from(err: der::Error) -> Self {
        KfCertError::DecodingError(err.to_string())
    }
}

impl From<pem::PemError> for KfCertError {
    fn from(err: pem::PemError) -> Self {
        KfCertError::DecodingError(err.to_string())
    }
}

impl From<base64::DecodeError> for KfCertError {
    fn from(err: base64::DecodeError) -> Self {
        KfCertError::DecodingError(err.to_string())
    }
}

impl From<openssl::error::ErrorStack> for KfCertError {
    fn from(err: openssl::error::ErrorStack) -> Self {
        KfCertError::DecodingError(err.to_string())
    }
}
