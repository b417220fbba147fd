//! Error handling for mbcomp
//!
//! Errors raised on the audio thread carry only `Copy` data so that
//! returning them never allocates.

use thiserror::Error;

/// Result type alias for mbcomp operations
pub type Result<T> = std::result::Result<T, MbcError>;

/// Main error type for mbcomp operations
#[derive(Error, Debug)]
pub enum MbcError {
    // Lifecycle Errors
    #[error("Invalid process spec: {reason}")]
    InvalidSpec { reason: String },

    #[error("Processor used before prepare()")]
    NotPrepared,

    // Buffer Shape Errors
    #[error("Channel count mismatch: prepared for {expected}, got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },

    #[error("Block of {actual} samples exceeds prepared maximum of {max}")]
    BlockTooLarge { max: usize, actual: usize },

    // Parameter Errors
    #[error("Invalid parameter {param}: {value} (expected {expected})")]
    InvalidParameter {
        param: String,
        value: String,
        expected: String,
    },

    // File Errors
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio { reason: String },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MbcError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            MbcError::InvalidSpec { .. } => "INVALID_SPEC",
            MbcError::NotPrepared => "NOT_PREPARED",
            MbcError::ChannelMismatch { .. } => "CHANNEL_MISMATCH",
            MbcError::BlockTooLarge { .. } => "BLOCK_TOO_LARGE",
            MbcError::InvalidParameter { .. } => "INVALID_PARAMETER",
            MbcError::FileNotFound { .. } => "FILE_NOT_FOUND",
            MbcError::InvalidAudio { .. } => "INVALID_AUDIO",
            MbcError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            MbcError::Wav(_) => "WAV_ERROR",
            MbcError::Io(_) => "IO_ERROR",
            MbcError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable
    ///
    /// Lifecycle and buffer shape errors are contract breaches by the host
    /// and are not recoverable from inside the processor.
    pub fn is_recoverable(&self) -> bool {
        match self {
            MbcError::InvalidSpec { .. }
            | MbcError::NotPrepared
            | MbcError::ChannelMismatch { .. }
            | MbcError::BlockTooLarge { .. } => false,
            MbcError::InvalidParameter { .. }
            | MbcError::FileNotFound { .. }
            | MbcError::InvalidAudio { .. }
            | MbcError::UnsupportedFormat { .. } => true,
            _ => false,
        }
    }

    pub(crate) fn invalid_parameter(
        param: &str,
        value: impl ToString,
        expected: &str,
    ) -> Self {
        MbcError::InvalidParameter {
            param: param.to_string(),
            value: value.to_string(),
            expected: expected.to_string(),
        }
    }
}
