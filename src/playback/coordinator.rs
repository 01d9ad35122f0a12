//! Playback coordinator.
//!
//! The coordinator is the single owner of the queue cursor and of the active
//! session. User commands and session events both arrive as messages and are
//! applied one at a time by [`PlaybackCoordinator::run`], so no locking is
//! needed and the precedence between them is fixed:
//!
//! - commands are taken before session events when both are ready;
//! - an event from a session that is no longer current is ignored, so a
//!   `Stop` accepted before an in-flight `Finished` wins, and later
//!   `Pause`/`Stop` commands get `NoActiveSession` until the next `Play`.
//!
//! Moving to another track while a session is playing stops it with
//! [`StopReason::Skip`]; the replacement is started when that session's
//! `Skipped` event arrives, which guarantees the old output is released
//! before the new one opens. A paused session is released instead and the
//! player settles with no session, so a move never starts music on its own.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::audio::AudioBackend;
use crate::library::{Direction, Queue, TagService, Track, TrackTags};
use crate::types::{Origin, PlayerStatus, SessionStatus};

use super::error::PlaybackError;
use super::session::{PlaybackSession, SessionEvent, SessionId, SessionMessage, StopReason};

// ============================================================================
// Messages
// ============================================================================

/// Commands accepted by the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    /// Start the current track, or resume if paused
    Play,
    /// Resume a paused session only
    Resume,
    Pause,
    Stop,
    Next,
    Previous,
    /// Move the cursor to a track by index
    Select(usize),
    SetShuffle(bool),
    SetAutoplay(bool),
    SetVolume(f32),
    /// Write tags for the current track and refresh its cached metadata.
    /// Fields left `None` keep their current value.
    SaveTags(TrackTags),
}

/// A command plus its reply channel.
#[derive(Debug)]
pub struct PlayerRequest {
    pub command: PlayerCommand,
    pub origin: Origin,
    pub reply: oneshot::Sender<Result<PlayerSnapshot, PlaybackError>>,
}

/// Notifications published by the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// A new session started
    Started {
        index: usize,
        track: Track,
        origin: Origin,
    },
    Paused {
        origin: Origin,
    },
    Resumed {
        origin: Origin,
    },
    /// Playback stopped by a command
    Stopped {
        origin: Origin,
    },
    /// The track at `index` played to the end
    TrackFinished {
        index: usize,
    },
    /// The queue cursor moved
    CursorMoved {
        index: usize,
        origin: Origin,
    },
    /// A track could not be started
    PlaybackFailed {
        index: usize,
        message: String,
    },
    /// A track finished and there is nothing to continue with
    QueueExhausted,
}

impl PlayerEvent {
    /// Origin of the change, if the event carries one.
    pub fn origin(&self) -> Option<Origin> {
        match self {
            PlayerEvent::Started { origin, .. }
            | PlayerEvent::Paused { origin }
            | PlayerEvent::Resumed { origin }
            | PlayerEvent::Stopped { origin }
            | PlayerEvent::CursorMoved { origin, .. } => Some(*origin),
            _ => None,
        }
    }
}

/// Read-only view of the player for rendering.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub status: PlayerStatus,
    /// Queue cursor, `None` for an empty library
    pub position: Option<usize>,
    pub track_count: usize,
    /// Track at the cursor
    pub current: Option<Track>,
    pub has_next: bool,
    pub shuffle: bool,
    pub autoplay: bool,
    pub volume: f32,
}

// ============================================================================
// PlaybackOptions
// ============================================================================

/// Tunables for the coordinator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackOptions {
    /// Continue with the next track when one finishes
    pub autoplay: bool,
    /// Output volume (0.0-1.0)
    pub volume: f32,
    /// How often session monitors check for end of stream
    pub poll_interval: Duration,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            autoplay: true,
            volume: 0.2,
            poll_interval: Duration::from_secs(1),
        }
    }
}

// ============================================================================
// PlaybackCoordinator
// ============================================================================

/// Owner of the queue and the active playback session.
pub struct PlaybackCoordinator {
    queue: Queue,
    backend: Arc<dyn AudioBackend>,
    tags: Arc<dyn TagService>,
    options: PlaybackOptions,
    session: Option<PlaybackSession>,
    /// Session retiring via skip; its `Skipped` event starts the next one
    pending_restart: Option<SessionId>,
    next_session_id: SessionId,
    session_tx: mpsc::UnboundedSender<SessionMessage>,
    event_tx: mpsc::UnboundedSender<PlayerEvent>,
    snapshot_tx: watch::Sender<PlayerSnapshot>,
    library_tx: watch::Sender<Vec<Track>>,
}

impl PlaybackCoordinator {
    /// Creates a coordinator and the receiving end of its session channel.
    pub fn new(
        queue: Queue,
        backend: Arc<dyn AudioBackend>,
        tags: Arc<dyn TagService>,
        options: PlaybackOptions,
        event_tx: mpsc::UnboundedSender<PlayerEvent>,
    ) -> (Self, mpsc::UnboundedReceiver<SessionMessage>) {
        let (session_tx, session_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, _) = watch::channel(PlayerSnapshot::default());
        let (library_tx, _) = watch::channel(queue.tracks().to_vec());

        let coordinator = Self {
            queue,
            backend,
            tags,
            options,
            session: None,
            pending_restart: None,
            next_session_id: 1,
            session_tx,
            event_tx,
            snapshot_tx,
            library_tx,
        };
        coordinator.publish();
        (coordinator, session_rx)
    }

    /// Runs the control loop until every request sender is dropped.
    pub async fn run(
        mut self,
        mut requests: mpsc::Receiver<PlayerRequest>,
        mut session_events: mpsc::UnboundedReceiver<SessionMessage>,
    ) {
        loop {
            tokio::select! {
                biased;

                request = requests.recv() => {
                    let Some(PlayerRequest { command, origin, reply }) = request else {
                        break;
                    };
                    let result = self.handle_command(command, origin);
                    if let Err(e) = &result {
                        debug!("Command rejected: {}", e);
                    }
                    let _ = reply.send(result);
                }
                Some(message) = session_events.recv() => {
                    self.handle_session_message(message);
                }
            }
            self.publish();
        }

        if let Some(session) = self.session.take() {
            session.stop(StopReason::UserStop);
        }
        info!("Playback coordinator stopped");
    }

    /// Receiver for published snapshots.
    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Receiver for the track listing, republished when tags change.
    pub fn subscribe_library(&self) -> watch::Receiver<Vec<Track>> {
        self.library_tx.subscribe()
    }

    /// Current coordinator status.
    pub fn status(&self) -> PlayerStatus {
        match (&self.session, self.pending_restart) {
            (Some(session), _) => match session.status() {
                SessionStatus::Playing => PlayerStatus::Playing,
                SessionStatus::Paused => PlayerStatus::Paused,
                // Finished on its own; the event is still in flight
                SessionStatus::Idle | SessionStatus::Stopped => PlayerStatus::NoSession,
            },
            (None, Some(_)) => PlayerStatus::Starting,
            (None, None) => PlayerStatus::NoSession,
        }
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Builds the read-only view.
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            status: self.status(),
            position: self.queue.position(),
            track_count: self.queue.len(),
            current: self.queue.current().ok().cloned(),
            has_next: self.queue.has_next(),
            shuffle: self.queue.is_shuffled(),
            autoplay: self.options.autoplay,
            volume: self.options.volume,
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }

    fn emit(&self, event: PlayerEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("No listener for player events");
        }
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Applies one command and returns the resulting snapshot.
    ///
    /// # Errors
    ///
    /// Returns the reason the command was rejected; state is unchanged.
    pub fn handle_command(
        &mut self,
        command: PlayerCommand,
        origin: Origin,
    ) -> Result<PlayerSnapshot, PlaybackError> {
        debug!(?command, ?origin, "Player command");
        match command {
            PlayerCommand::Play => self.play(origin)?,
            PlayerCommand::Resume => self.resume(origin)?,
            PlayerCommand::Pause => self.pause(origin)?,
            PlayerCommand::Stop => self.stop(origin)?,
            PlayerCommand::Next => self.navigate(Direction::Next, origin)?,
            PlayerCommand::Previous => self.navigate(Direction::Previous, origin)?,
            PlayerCommand::Select(index) => {
                let index = self.queue.select(index)?;
                self.move_to(index, origin);
            }
            PlayerCommand::SetShuffle(shuffle) => self.queue.set_shuffle(shuffle),
            PlayerCommand::SetAutoplay(autoplay) => self.options.autoplay = autoplay,
            PlayerCommand::SetVolume(volume) => self.set_volume(volume),
            PlayerCommand::SaveTags(tags) => self.save_tags(tags)?,
        }
        Ok(self.snapshot())
    }

    fn play(&mut self, origin: Origin) -> Result<(), PlaybackError> {
        if self.queue.is_empty() {
            return Err(PlaybackError::EmptyLibrary);
        }
        match self.status() {
            PlayerStatus::Playing | PlayerStatus::Starting => Ok(()),
            PlayerStatus::Paused => self.resume(origin),
            PlayerStatus::NoSession => self.start_current(origin),
        }
    }

    fn resume(&mut self, origin: Origin) -> Result<(), PlaybackError> {
        match self.status() {
            PlayerStatus::Paused => {
                if let Some(session) = &self.session {
                    session.resume()?;
                }
                self.emit(PlayerEvent::Resumed { origin });
                Ok(())
            }
            PlayerStatus::NoSession => Err(PlaybackError::NoActiveSession),
            other => Err(PlaybackError::InvalidState {
                action: "resume",
                state: other.as_str(),
            }),
        }
    }

    fn pause(&mut self, origin: Origin) -> Result<(), PlaybackError> {
        match self.status() {
            PlayerStatus::Playing => {
                if let Some(session) = &self.session {
                    session.pause()?;
                }
                self.emit(PlayerEvent::Paused { origin });
                Ok(())
            }
            PlayerStatus::NoSession => Err(PlaybackError::NoActiveSession),
            other => Err(PlaybackError::InvalidState {
                action: "pause",
                state: other.as_str(),
            }),
        }
    }

    fn stop(&mut self, origin: Origin) -> Result<(), PlaybackError> {
        match self.status() {
            PlayerStatus::Playing | PlayerStatus::Paused => {
                if let Some(session) = self.session.take() {
                    session.stop(StopReason::UserStop);
                }
            }
            PlayerStatus::Starting => {
                self.pending_restart = None;
            }
            PlayerStatus::NoSession => return Err(PlaybackError::NoActiveSession),
        }
        info!("Playback stopped");
        self.emit(PlayerEvent::Stopped { origin });
        Ok(())
    }

    fn navigate(&mut self, direction: Direction, origin: Origin) -> Result<(), PlaybackError> {
        let index = match direction {
            Direction::Next => self.queue.advance_next()?,
            Direction::Previous => self.queue.advance(Direction::Previous)?,
        };
        self.move_to(index, origin);
        Ok(())
    }

    /// Retires the active session after the cursor moved to `index`.
    ///
    /// Only a playing session is restarted on the new track. A paused one is
    /// released and the player is left without a session.
    fn move_to(&mut self, index: usize, origin: Origin) {
        self.emit(PlayerEvent::CursorMoved { index, origin });

        let Some(session) = self.session.take() else {
            return;
        };
        if session.status() != SessionStatus::Playing {
            session.stop(StopReason::UserStop);
            debug!(session = session.id(), "Released session at track {}", index);
            return;
        }
        if session.stop(StopReason::Skip) {
            debug!(session = session.id(), "Skipping to track {}", index);
            self.pending_restart = Some(session.id());
        }
    }

    fn set_volume(&mut self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        self.options.volume = volume;
        if let Some(session) = &self.session {
            session.set_volume(volume);
        }
    }

    fn save_tags(&mut self, tags: TrackTags) -> Result<(), PlaybackError> {
        let index = self.queue.position().ok_or(PlaybackError::EmptyLibrary)?;
        let track = self.queue.current()?;
        let path = track.path().to_path_buf();
        let current = self.tags.read(&path).unwrap_or_else(|e| {
            debug!("Using cached tags for {}: {}", path.display(), e);
            track.tags().clone()
        });
        let tags = current.merged(tags);

        self.tags.write(&path, &tags)?;
        self.queue.update_tags(index, tags)?;
        self.library_tx.send_replace(self.queue.tracks().to_vec());
        info!("Saved tags for {}", path.display());
        Ok(())
    }

    /// Starts a session for the track at the cursor.
    ///
    /// Any leftover session is stopped first so at most one output is open.
    fn start_current(&mut self, origin: Origin) -> Result<(), PlaybackError> {
        let index = self.queue.position().ok_or(PlaybackError::EmptyLibrary)?;
        let track = self.queue.current()?.clone();

        if let Some(previous) = self.session.take() {
            previous.stop(StopReason::UserStop);
        }
        self.pending_restart = None;

        let id = self.next_session_id;
        self.next_session_id += 1;

        let session = PlaybackSession::start(
            id,
            track.clone(),
            self.backend.as_ref(),
            self.options.volume,
            self.options.poll_interval,
            self.session_tx.clone(),
        )?;
        self.session = Some(session);
        self.emit(PlayerEvent::Started {
            index,
            track,
            origin,
        });
        Ok(())
    }

    fn report_failure(&self, err: PlaybackError) {
        let index = self.queue.position().unwrap_or_default();
        warn!("Could not start track {}: {}", index, err);
        self.emit(PlayerEvent::PlaybackFailed {
            index,
            message: err.to_string(),
        });
    }

    // ------------------------------------------------------------------------
    // Session events
    // ------------------------------------------------------------------------

    /// Applies one session event.
    pub fn handle_session_message(&mut self, message: SessionMessage) {
        let SessionMessage { session, event } = message;

        if self.pending_restart == Some(session) {
            if event == SessionEvent::Skipped {
                self.pending_restart = None;
                if let Err(e) = self.start_current(Origin::Internal) {
                    self.report_failure(e);
                }
            } else {
                debug!(session, ?event, "Event from skipped session");
            }
            return;
        }

        let is_current = self.session.as_ref().map(PlaybackSession::id) == Some(session);
        if !is_current {
            debug!(session, ?event, "Ignoring event from retired session");
            return;
        }

        match event {
            SessionEvent::Finished => self.on_finished(),
            SessionEvent::Paused | SessionEvent::Resumed => {
                debug!(session, ?event, "Session state confirmed");
            }
            SessionEvent::Skipped | SessionEvent::Stopped => {
                self.session = None;
            }
        }
    }

    fn on_finished(&mut self) {
        let index = self.queue.position().unwrap_or_default();
        if let Some(session) = self.session.take() {
            // Already released by the monitor; this is a no-op.
            session.stop(StopReason::UserStop);
        }
        info!("Track {} finished", index);
        self.emit(PlayerEvent::TrackFinished { index });

        if !(self.options.autoplay && self.queue.has_next()) {
            self.emit(PlayerEvent::QueueExhausted);
            return;
        }

        match self.queue.advance_next() {
            Ok(next) => {
                self.emit(PlayerEvent::CursorMoved {
                    index: next,
                    origin: Origin::Internal,
                });
                if let Err(e) = self.start_current(Origin::Internal) {
                    self.report_failure(e);
                }
            }
            Err(e) => warn!("Autoplay could not advance: {}", e),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
