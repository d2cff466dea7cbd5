//! Error types for loading inputs and checking signatures.

use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort a verification run.
///
/// A signature that does not match is not an error; it is reported as
/// [`crate::VerificationOutcome::Invalid`].
#[derive(Debug, Error)]
pub enum Error {
    /// An input file is missing or unreadable.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The certificate is not a well-formed PEM-wrapped X.509 structure.
    #[error("certificate parse error: {0}")]
    Parse(String),
    /// The response document is not JSON, misses a field, or carries bad base64.
    #[error("response format error: {0}")]
    Format(String),
    /// The certificate key cannot be used for RSA verification.
    #[error("unsupported public key: {0}")]
    UnsupportedKey(String),
    /// The signer's private key could not be decoded.
    #[error("private key error: {0}")]
    PrivateKey(String),
    /// The RSA signing primitive rejected the input.
    #[error("signing failed: {0}")]
    Signing(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Read a whole file, attaching the path to any I/O failure.
pub(crate) fn read_file(path: &std::path::Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| Error::io(path, e))
}
