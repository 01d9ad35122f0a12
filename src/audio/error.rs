//! Audio backend error types.
//!
//! Every error here is local to the playback session that hit it; the
//! coordinator reports it upward and keeps running.

use thiserror::Error;

/// Errors that can occur while opening or driving an audio output.
#[derive(Debug, Error)]
pub enum AudioError {
    /// Audio device is not available (e.g., no speakers connected).
    #[error("audio device not available: {0}")]
    DeviceNotAvailable(String),

    /// Audio file could not be opened.
    #[error("audio file not found: {0}")]
    FileNotFound(String),

    /// Failed to decode the audio file.
    #[error("failed to decode audio file: {0}")]
    DecodeError(String),

    /// Failed to create the output sink.
    #[error("failed to create audio stream: {0}")]
    StreamError(String),
}

impl AudioError {
    /// Returns true if this error is related to device availability.
    #[must_use]
    pub fn is_device_error(&self) -> bool {
        matches!(self, Self::DeviceNotAvailable(_) | Self::StreamError(_))
    }

    /// Returns true if this error is related to the audio file.
    #[must_use]
    pub fn is_file_error(&self) -> bool {
        matches!(self, Self::FileNotFound(_) | Self::DecodeError(_))
    }
}
