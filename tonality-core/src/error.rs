//! Error types for the tonality pipeline.

use thiserror::Error;

/// Errors surfaced by the analysis pipeline and its I/O collaborators.
///
/// Everything here is fatal for the run that produced it: the pipeline is a
/// one-shot batch computation and nothing is retried.
#[derive(Debug, Error)]
pub enum TonalityError {
    /// The sample buffer or its sample rate cannot be analyzed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No usable input device, or the capture stream failed.
    #[error("Audio capture error: {0}")]
    Audio(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for tonality operations
pub type Result<T> = std::result::Result<T, TonalityError>;
