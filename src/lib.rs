//! pomotune library
//!
//! This library provides the core functionality for the pomotune CLI.
//! It includes:
//! - Interval timer engine for focus/relax cycles
//! - Music library queue with sequential and shuffled navigation
//! - Playback sessions and the coordinator that owns them
//! - Audio output and tag services (rodio / lofty, plus mocks)
//! - Application context linking the timer and the player
//! - CLI command parsing and display utilities

pub mod app;
pub mod audio;
pub mod cli;
pub mod library;
pub mod playback;
pub mod timer;
pub mod types;

// Re-export commonly used types for convenience
pub use app::{AppContext, AppError, AppEvent, LinkPolicy};
pub use audio::{AudioBackend, AudioError, AudioOutput, MockAudioBackend, RodioBackend};
pub use library::{
    LibraryError, LoftyTagService, MockTagService, Queue, TagError, TagService, Track, TrackTags,
};
pub use playback::{
    PlaybackError, PlaybackOptions, PlayerCommand, PlayerEvent, PlayerHandle, PlayerSnapshot,
};
pub use timer::{TimerError, TimerEvent, TimerHandle};
pub use types::{
    AppConfig, Origin, PlayerStatus, SessionStatus, TimerMode, TimerSettings, TimerState,
    TimerStatus,
};
