//! Playback session for a single track.
//!
//! A session owns one [`AudioOutput`] for its whole life and reports its
//! lifecycle over the coordinator's session channel:
//!
//! ```text
//!  start ──▶ Playing ⇄ Paused
//!               │         │
//!   end of stream / stop(reason)
//!               ▼
//!            Stopped ──▶ exactly one of Finished | Skipped | Stopped
//! ```
//!
//! The monitor task polls the output once per poll interval and is woken
//! immediately by `stop`. The output is released under the session lock,
//! so whichever of "end of stream" and `stop` gets there first releases it
//! and the other finds nothing left to close.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::audio::{AudioBackend, AudioOutput};
use crate::library::Track;
use crate::types::SessionStatus;

use super::error::PlaybackError;

/// Identifies one session within a coordinator.
pub type SessionId = u64;

// ============================================================================
// SessionEvent
// ============================================================================

/// Lifecycle notifications emitted by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Output paused
    Paused,
    /// Output resumed
    Resumed,
    /// Track played to the end
    Finished,
    /// Stopped because the user moved to another track
    Skipped,
    /// Stopped by the user
    Stopped,
}

impl SessionEvent {
    /// Returns true for the events that end a session.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionEvent::Finished | SessionEvent::Skipped | SessionEvent::Stopped
        )
    }
}

/// A session event tagged with its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionMessage {
    pub session: SessionId,
    pub event: SessionEvent,
}

/// Why a session is being stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    UserStop,
    Skip,
}

// ============================================================================
// PlaybackSession
// ============================================================================

/// One track's output plus its monitor task.
pub struct PlaybackSession {
    track: Track,
    shared: Arc<SessionShared>,
}

struct SessionShared {
    id: SessionId,
    inner: Mutex<SessionInner>,
    wake: Notify,
    events: mpsc::UnboundedSender<SessionMessage>,
}

struct SessionInner {
    status: SessionStatus,
    output: Option<Box<dyn AudioOutput>>,
    stop_reason: Option<StopReason>,
    volume: f32,
    /// Terminal event already emitted
    ended: bool,
}

impl SessionShared {
    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SessionEvent) {
        let message = SessionMessage {
            session: self.id,
            event,
        };
        if self.events.send(message).is_err() {
            debug!(session = self.id, ?event, "Session event dropped, coordinator gone");
        }
    }

    /// One monitor step. Returns true once the monitor should exit.
    fn check(&self) -> bool {
        let mut inner = self.lock();
        if inner.ended {
            return true;
        }

        match inner.status {
            SessionStatus::Playing => {
                let Some(mut output) = inner.output.take() else {
                    // Released out from under us; nothing left to report.
                    inner.ended = true;
                    return true;
                };
                if output.is_playing() {
                    inner.output = Some(output);
                    return false;
                }
                output.close();
                inner.status = SessionStatus::Stopped;
                inner.ended = true;
                self.emit(SessionEvent::Finished);
                true
            }
            SessionStatus::Paused => false,
            SessionStatus::Stopped => {
                inner.ended = true;
                match inner.stop_reason {
                    Some(StopReason::Skip) => self.emit(SessionEvent::Skipped),
                    Some(StopReason::UserStop) => self.emit(SessionEvent::Stopped),
                    None => {}
                }
                true
            }
            SessionStatus::Idle => {
                inner.ended = true;
                true
            }
        }
    }
}

async fn monitor(shared: Arc<SessionShared>, poll_interval: Duration) {
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shared.wake.notified() => {}
        }

        if shared.check() {
            break;
        }
    }

    debug!(session = shared.id, "Session monitor exited");
}

impl PlaybackSession {
    /// Opens `track` and starts playing it.
    ///
    /// Returns as soon as output has started; the monitor runs as a tokio
    /// task, so this must be called from within a runtime.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackError::Resource` if the backend cannot open the file.
    pub fn start(
        id: SessionId,
        track: Track,
        backend: &dyn AudioBackend,
        volume: f32,
        poll_interval: Duration,
        events: mpsc::UnboundedSender<SessionMessage>,
    ) -> Result<Self, PlaybackError> {
        let mut output = backend.open(track.path())?;
        let volume = volume.clamp(0.0, 1.0);
        output.set_volume(volume);
        output.play();

        let shared = Arc::new(SessionShared {
            id,
            inner: Mutex::new(SessionInner {
                status: SessionStatus::Playing,
                output: Some(output),
                stop_reason: None,
                volume,
                ended: false,
            }),
            wake: Notify::new(),
            events,
        });

        tokio::spawn(monitor(Arc::clone(&shared), poll_interval));

        info!(session = id, "Playing {}", track.display_name());
        Ok(Self { track, shared })
    }

    pub fn id(&self) -> SessionId {
        self.shared.id
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn status(&self) -> SessionStatus {
        self.shared.lock().status
    }

    pub fn volume(&self) -> f32 {
        self.shared.lock().volume
    }

    /// Pauses output.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackError::InvalidState` unless playing.
    pub fn pause(&self) -> Result<(), PlaybackError> {
        let mut inner = self.shared.lock();
        if inner.status != SessionStatus::Playing {
            return Err(PlaybackError::InvalidState {
                action: "pause",
                state: inner.status.as_str(),
            });
        }
        if let Some(output) = inner.output.as_mut() {
            output.pause();
        }
        inner.status = SessionStatus::Paused;
        self.shared.emit(SessionEvent::Paused);
        debug!(session = self.id(), "Session paused");
        Ok(())
    }

    /// Resumes output.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackError::InvalidState` unless paused.
    pub fn resume(&self) -> Result<(), PlaybackError> {
        let mut inner = self.shared.lock();
        if inner.status != SessionStatus::Paused {
            return Err(PlaybackError::InvalidState {
                action: "resume",
                state: inner.status.as_str(),
            });
        }
        if let Some(output) = inner.output.as_mut() {
            output.play();
        }
        inner.status = SessionStatus::Playing;
        self.shared.emit(SessionEvent::Resumed);
        debug!(session = self.id(), "Session resumed");
        Ok(())
    }

    /// Releases the output and wakes the monitor.
    ///
    /// Returns true if this call released the output; calling it again, or
    /// after the track finished on its own, does nothing and returns false.
    pub fn stop(&self, reason: StopReason) -> bool {
        let mut inner = self.shared.lock();
        if !inner.status.is_active() {
            return false;
        }
        if let Some(mut output) = inner.output.take() {
            output.close();
        }
        inner.status = SessionStatus::Stopped;
        inner.stop_reason = Some(reason);
        drop(inner);

        self.shared.wake.notify_one();
        debug!(session = self.id(), ?reason, "Session stopped");
        true
    }

    /// Sets the output volume, clamped to 0.0-1.0.
    pub fn set_volume(&self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        let mut inner = self.shared.lock();
        inner.volume = volume;
        if let Some(output) = inner.output.as_mut() {
            output.set_volume(volume);
        }
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.stop(StopReason::UserStop);
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("id", &self.id())
            .field("track", &self.track.name())
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
