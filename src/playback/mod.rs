//! Playback: sessions, the coordinator and its handle.
//!
//! - `session`: One playing track and its end-of-stream monitor
//! - `coordinator`: Queue cursor plus the single active session
//! - `handle`: Async front end used by the app and the console

mod coordinator;
mod error;
mod handle;
mod session;

pub use coordinator::{
    PlaybackCoordinator, PlaybackOptions, PlayerCommand, PlayerEvent, PlayerRequest,
    PlayerSnapshot,
};
pub use error::PlaybackError;
pub use handle::PlayerHandle;
pub use session::{PlaybackSession, SessionEvent, SessionId, SessionMessage, StopReason};
