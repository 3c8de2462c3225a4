//! Error types for tgzkit operations.
//!
//! Every pack, extract, gzip, and gunzip operation surfaces exactly one of
//! these variants. [`TgzError::kind`] folds them into the three categories
//! a caller acts on: nothing was found, the data is corrupt or unsupported,
//! or the underlying transport failed.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for tgzkit operations.
#[derive(Debug, Error)]
pub enum TgzError {
    /// I/O error from the underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Input path is missing or cannot be opened.
    #[error("Source not found: {}", path.display())]
    SourceNotFound {
        /// The path that could not be read.
        path: PathBuf,
    },

    /// Malformed or truncated archive structure, or a failed write at a
    /// block boundary.
    #[error("Bad block at offset {offset}: {message}")]
    BadBlock {
        /// Byte offset of the block that could not be processed.
        offset: u64,
        /// Description of the failure.
        message: String,
    },

    /// Header checksum does not match its contents (strict mode only).
    #[error("Checksum mismatch at offset {offset}: stored {stored:o}, computed {computed:o}")]
    ChecksumMismatch {
        /// Byte offset of the header block.
        offset: u64,
        /// Checksum recorded in the header.
        stored: u32,
        /// Checksum computed over the header bytes.
        computed: u32,
    },

    /// The gzip stream could not be decoded or the output not written.
    #[error("Decompression failed: {message}")]
    DecompressionFailed {
        /// Description of the failure.
        message: String,
    },

    /// The gzip stream could not be encoded or the output not written.
    #[error("Compression failed: {message}")]
    CompressionFailed {
        /// Description of the failure.
        message: String,
    },

    /// The compression transport ended in a state outside its success or
    /// failure codes.
    #[error("Unexpected state: {message}")]
    UnexpectedState {
        /// Description of the state.
        message: String,
    },

    /// A background worker panicked before delivering its result.
    #[error("Background worker panicked")]
    Join,
}

/// Result type alias for tgzkit operations.
pub type Result<T> = std::result::Result<T, TgzError>;

/// Coarse classification of an error, for deciding whether to retry,
/// clean up, or report upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input does not exist.
    NotFound,
    /// The input exists but is corrupt or unsupported.
    CorruptData,
    /// Reading, writing, or the worker itself failed.
    Transport,
}

impl TgzError {
    /// Create a source-not-found error.
    pub fn source_not_found(path: impl Into<PathBuf>) -> Self {
        Self::SourceNotFound { path: path.into() }
    }

    /// Create a bad block error.
    pub fn bad_block(offset: u64, message: impl Into<String>) -> Self {
        Self::BadBlock {
            offset,
            message: message.into(),
        }
    }

    /// Create a checksum mismatch error.
    pub fn checksum_mismatch(offset: u64, stored: u32, computed: u32) -> Self {
        Self::ChecksumMismatch {
            offset,
            stored,
            computed,
        }
    }

    /// Create a decompression error.
    pub fn decompression_failed(message: impl Into<String>) -> Self {
        Self::DecompressionFailed {
            message: message.into(),
        }
    }

    /// Create a compression error.
    pub fn compression_failed(message: impl Into<String>) -> Self {
        Self::CompressionFailed {
            message: message.into(),
        }
    }

    /// Create an unexpected state error.
    pub fn unexpected_state(message: impl Into<String>) -> Self {
        Self::UnexpectedState {
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SourceNotFound { .. } => ErrorKind::NotFound,
            Self::Io(e) if e.kind() == io::ErrorKind::NotFound => ErrorKind::NotFound,
            Self::BadBlock { .. } | Self::ChecksumMismatch { .. } => ErrorKind::CorruptData,
            Self::DecompressionFailed { .. } => ErrorKind::CorruptData,
            Self::Io(_)
            | Self::CompressionFailed { .. }
            | Self::UnexpectedState { .. }
            | Self::Join => ErrorKind::Transport,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TgzError::bad_block(1024, "truncated data region");
        assert!(err.to_string().contains("offset 1024"));

        let err = TgzError::source_not_found("/no/such/dir");
        assert!(err.to_string().contains("/no/such/dir"));

        let err = TgzError::checksum_mismatch(0, 0o1234, 0o4321);
        assert!(err.to_string().contains("1234"));
        assert!(err.to_string().contains("4321"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err: TgzError = io_err.into();
        assert!(matches!(err, TgzError::Io(_)));
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(
            TgzError::source_not_found("x").kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            TgzError::Io(io::Error::from(io::ErrorKind::NotFound)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(TgzError::bad_block(0, "x").kind(), ErrorKind::CorruptData);
        assert_eq!(
            TgzError::decompression_failed("x").kind(),
            ErrorKind::CorruptData
        );
        assert_eq!(TgzError::unexpected_state("x").kind(), ErrorKind::Transport);
        assert_eq!(TgzError::Join.kind(), ErrorKind::Transport);
    }
}
