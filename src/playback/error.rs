//! Playback error types.

use thiserror::Error;

use crate::audio::AudioError;
use crate::library::{LibraryError, TagError};

/// Errors returned by playback sessions and the coordinator.
///
/// Everything except `Resource` rejects the command and leaves state
/// unchanged.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The track could not be opened or decoded.
    #[error("failed to play track: {0}")]
    Resource(#[from] AudioError),

    /// Play was requested with no tracks loaded.
    #[error("library is empty")]
    EmptyLibrary,

    /// Navigation beyond the queue bounds.
    #[error("no track at position {position} (library has {len} tracks)")]
    OutOfRange { position: usize, len: usize },

    /// The command is not valid in the current state.
    #[error("cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },

    /// A session-targeting command arrived with nothing playing.
    #[error("no active playback session")]
    NoActiveSession,

    /// Saving tags failed.
    #[error(transparent)]
    Tag(#[from] TagError),

    /// Library failure other than the ones above.
    #[error(transparent)]
    Library(LibraryError),

    /// The coordinator task has shut down.
    #[error("playback controller is not running")]
    Unavailable,
}

impl From<LibraryError> for PlaybackError {
    fn from(err: LibraryError) -> Self {
        match err {
            LibraryError::Empty => Self::EmptyLibrary,
            LibraryError::OutOfRange { position, len } => Self::OutOfRange { position, len },
            other => Self::Library(other),
        }
    }
}

impl PlaybackError {
    /// Returns true if the command was rejected without touching state.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::EmptyLibrary
                | Self::OutOfRange { .. }
                | Self::InvalidState { .. }
                | Self::NoActiveSession
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_library_error() {
        assert!(matches!(
            PlaybackError::from(LibraryError::Empty),
            PlaybackError::EmptyLibrary
        ));
        assert!(matches!(
            PlaybackError::from(LibraryError::OutOfRange { position: 0, len: 2 }),
            PlaybackError::OutOfRange { position: 0, len: 2 }
        ));
    }

    #[test]
    fn test_from_audio_error() {
        let err: PlaybackError = AudioError::FileNotFound("a.mp3".into()).into();
        assert!(matches!(err, PlaybackError::Resource(_)));
        assert!(err.to_string().contains("a.mp3"));
        assert!(!err.is_rejection());
    }

    #[test]
    fn test_invalid_state_display() {
        let err = PlaybackError::InvalidState {
            action: "pause",
            state: "paused",
        };
        assert_eq!(err.to_string(), "cannot pause while paused");
        assert!(err.is_rejection());
    }

    #[test]
    fn test_rejections() {
        assert!(PlaybackError::NoActiveSession.is_rejection());
        assert!(PlaybackError::EmptyLibrary.is_rejection());
        assert!(!PlaybackError::Unavailable.is_rejection());
    }
}
