use thiserror::Error;

use crate::model::{DURATION_RANGE, TEMPO_RANGE};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API base URL is not configured (set MOOD_STUDIO_API_URL)")]
    MissingApiUrl,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StudioError {
    #[error("Backend API is not configured. Please set MOOD_STUDIO_API_URL.")]
    Config(#[from] ConfigError),

    #[error(
        "Duration must be between {} and {} seconds (got {0})",
        DURATION_RANGE.start(),
        DURATION_RANGE.end()
    )]
    InvalidDuration(u32),

    #[error(
        "Tempo must be between {} and {} BPM (got {0})",
        TEMPO_RANGE.start(),
        TEMPO_RANGE.end()
    )]
    InvalidTempo(u32),

    #[error("Failed to fetch: {0}")]
    Transport(#[from] TransportError),

    #[error("Failed to fetch: Server error: {0}")]
    Status(u16),

    #[error("Backend returned non-audio response")]
    NotAudio { content_type: Option<String> },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("All fields are mandatory.")]
    MissingFields,

    #[error("Passwords do not match.")]
    PasswordMismatch,

    #[error("API service is not configured.")]
    Config(#[from] ConfigError),

    /// The server refused the request; carries the message to show.
    #[error("{0}")]
    Rejected(String),

    #[error("Signup successful! Please sign in manually.")]
    AutoSignInFailed,

    #[error("Server error: {0}")]
    Transport(#[from] TransportError),

    #[error("Server error: unexpected response ({0})")]
    InvalidResponse(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("Audio pipeline unavailable: {0}")]
    Pipeline(String),

    #[error("Export failed: {0}")]
    Export(String),
}
