//! Library error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or navigating the track queue.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// The library directory could not be listed. Fatal at startup.
    #[error("failed to read library directory {}: {source}", path.display())]
    Load {
        /// Directory that was requested
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The queue holds no tracks.
    #[error("library is empty")]
    Empty,

    /// Navigation would leave the queue bounds.
    #[error("no track at position {position} (library has {len} tracks)")]
    OutOfRange {
        /// Cursor position when the move was attempted
        position: usize,
        /// Number of tracks in the queue
        len: usize,
    },
}

impl LibraryError {
    /// Returns true if the error should abort startup.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Load { .. })
    }
}

/// Errors from the tag service.
#[derive(Debug, Error)]
pub enum TagError {
    /// Tags could not be read.
    #[error("failed to read tags: {0}")]
    Read(String),

    /// Tags could not be written back to the file.
    #[error("failed to write tags: {0}")]
    Write(String),
}
