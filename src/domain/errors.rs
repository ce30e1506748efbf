//! Domain errors for configuration volumes.

use thiserror::Error;

/// Errors that can occur while parsing, rendering, or persisting a volume.
#[derive(Debug, Error)]
pub enum VolumeError {
    #[error("invalid name '{0}': expected <name>-<version>-<env>")]
    InvalidIdentifier(String),

    #[error("unbalanced braces: {0}")]
    UnbalancedBraces(String),

    #[error("corrupt ciphertext: {0}")]
    CorruptCiphertext(String),

    #[error("not found: '{0}'")]
    NotFound(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("reserved prefix 'templates/' in '{0}'")]
    ReservedKeyPrefix(String),

    #[error("invalid template name: '{0}'")]
    InvalidTemplateName(String),

    #[error("volume '{0}' has no backend attached")]
    Detached(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl VolumeError {
    /// Wrap any store failure as an opaque backend error.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

pub type VolumeResult<T> = Result<T, VolumeError>;
