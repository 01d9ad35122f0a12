//! Timer engine for the interval timer.
//!
//! This module provides the core timer functionality:
//! - State transitions (Idle → Ready → Running ⇄ Paused → Completed)
//! - Countdown with tokio::time::interval
//! - Focus/Relax alternation up to the configured iteration count
//! - Event firing for the link bridge and the console

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};

use crate::types::{Origin, TimerMode, TimerSettings, TimerState, TimerStatus};

use super::error::TimerError;

// ============================================================================
// TimerEvent
// ============================================================================

/// Timer events for the link bridge and the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// New settings applied; the timer is Ready
    Configured { settings: TimerSettings },
    /// Countdown started or resumed
    Started { origin: Origin },
    /// Countdown paused
    Paused { origin: Origin },
    /// One second elapsed
    Tick { remaining_seconds: u32 },
    /// A focus period ran out
    FocusCompleted { completed_iterations: u32 },
    /// Relax countdown began
    RelaxStarted,
    /// A relax period ran out
    RelaxCompleted,
    /// Focus countdown began after a relax period
    FocusStarted,
    /// Reset to the start of the first focus period
    Restarted { origin: Origin },
    /// The final focus period completed; the timer stopped
    IterationLimitReached,
}

// ============================================================================
// TimerCommand / TimerRequest
// ============================================================================

/// Commands accepted by the timer task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    SetSettings(TimerSettings),
    Start,
    Pause,
    Restart,
}

/// A command plus its reply channel.
#[derive(Debug)]
pub struct TimerRequest {
    pub command: TimerCommand,
    pub origin: Origin,
    pub reply: oneshot::Sender<Result<TimerState, TimerError>>,
}

// ============================================================================
// TimerEngine
// ============================================================================

/// Timer engine that manages the interval timer state and events.
pub struct TimerEngine {
    /// Current timer state
    state: TimerState,
    /// Event sender channel
    event_tx: mpsc::UnboundedSender<TimerEvent>,
}

impl TimerEngine {
    /// Creates an unconfigured engine.
    pub fn new(event_tx: mpsc::UnboundedSender<TimerEvent>) -> Self {
        Self {
            state: TimerState::new(),
            event_tx,
        }
    }

    /// Runs the timer loop until every request sender is dropped.
    ///
    /// Commands are applied between ticks; starting the countdown resets the
    /// interval so the first second is a full second.
    pub async fn run(
        mut self,
        mut requests: mpsc::Receiver<TimerRequest>,
        snapshot_tx: watch::Sender<TimerState>,
    ) {
        let mut ticker = interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;

                request = requests.recv() => {
                    let Some(TimerRequest { command, origin, reply }) = request else {
                        break;
                    };
                    let was_running = self.state.is_running();
                    let result = self.handle_command(command, origin);
                    if !was_running && self.state.is_running() {
                        ticker.reset();
                    }
                    let _ = reply.send(result);
                }
                _ = ticker.tick() => {
                    self.tick();
                }
            }

            snapshot_tx.send_if_modified(|published| {
                if *published == self.state {
                    return false;
                }
                *published = self.state.clone();
                true
            });
        }

        info!("Timer stopped");
    }

    /// Applies one command and returns the resulting state.
    ///
    /// # Errors
    ///
    /// Returns the reason the command was rejected; state is unchanged.
    pub fn handle_command(
        &mut self,
        command: TimerCommand,
        origin: Origin,
    ) -> Result<TimerState, TimerError> {
        match command {
            TimerCommand::SetSettings(settings) => self.set_settings(settings, origin)?,
            TimerCommand::Start => self.start(origin)?,
            TimerCommand::Pause => self.pause(origin)?,
            TimerCommand::Restart => self.restart(origin)?,
        }
        Ok(self.state.clone())
    }

    fn emit(&self, event: TimerEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("No listener for timer events");
        }
    }

    /// Replaces the settings and resets to Ready.
    ///
    /// A running countdown is paused first.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::InvalidSettings` if out of range.
    pub fn set_settings(&mut self, settings: TimerSettings, origin: Origin) -> Result<(), TimerError> {
        settings.validate().map_err(TimerError::InvalidSettings)?;

        if self.state.is_running() {
            self.state.status = TimerStatus::Paused;
            self.emit(TimerEvent::Paused { origin });
        }
        self.state.configure(settings);

        info!(
            "Timer set: {}m focus, {}m relax, {} iterations",
            settings.focus_minutes, settings.relax_minutes, settings.iterations
        );
        self.emit(TimerEvent::Configured { settings });
        Ok(())
    }

    /// Starts or resumes the countdown.
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` when idle, `IterationLimitReached` once
    /// completed and `InvalidState` when already running.
    pub fn start(&mut self, origin: Origin) -> Result<(), TimerError> {
        match self.state.status {
            TimerStatus::Idle => Err(TimerError::NotConfigured),
            TimerStatus::Completed => Err(TimerError::IterationLimitReached),
            TimerStatus::Running => Err(TimerError::InvalidState {
                action: "start",
                state: TimerStatus::Running.as_str(),
            }),
            TimerStatus::Ready | TimerStatus::Paused => {
                self.state.status = TimerStatus::Running;
                debug!(?origin, mode = self.state.mode.as_str(), "Timer started");
                self.emit(TimerEvent::Started { origin });
                Ok(())
            }
        }
    }

    /// Pauses the countdown.
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` when idle and `InvalidState` unless running.
    pub fn pause(&mut self, origin: Origin) -> Result<(), TimerError> {
        match self.state.status {
            TimerStatus::Running => {
                self.state.status = TimerStatus::Paused;
                debug!(?origin, "Timer paused");
                self.emit(TimerEvent::Paused { origin });
                Ok(())
            }
            TimerStatus::Idle => Err(TimerError::NotConfigured),
            other => Err(TimerError::InvalidState {
                action: "pause",
                state: other.as_str(),
            }),
        }
    }

    /// Resets to the start of the first focus period, not running.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::NotConfigured` when idle.
    pub fn restart(&mut self, origin: Origin) -> Result<(), TimerError> {
        if !self.state.is_configured() {
            return Err(TimerError::NotConfigured);
        }
        if self.state.is_running() {
            self.state.status = TimerStatus::Paused;
            self.emit(TimerEvent::Paused { origin });
        }
        self.state.reset();
        info!("Timer restarted");
        self.emit(TimerEvent::Restarted { origin });
        Ok(())
    }

    /// Advances the countdown by one second if running.
    pub fn tick(&mut self) {
        if !self.state.is_running() {
            return;
        }

        let completed = self.state.tick();
        self.emit(TimerEvent::Tick {
            remaining_seconds: self.state.remaining_seconds,
        });

        if completed {
            self.handle_period_complete();
        }
    }

    /// Handles a period reaching zero (mode transitions).
    fn handle_period_complete(&mut self) {
        match self.state.mode {
            TimerMode::Focus => {
                let limit_reached = self.state.complete_focus();
                let completed_iterations = self.state.completed_iterations;
                info!(
                    "Focus period {}/{} completed",
                    completed_iterations,
                    self.state.total_iterations()
                );
                self.emit(TimerEvent::FocusCompleted {
                    completed_iterations,
                });

                if limit_reached {
                    self.state.status = TimerStatus::Completed;
                    self.emit(TimerEvent::IterationLimitReached);
                } else {
                    self.state.enter_mode(TimerMode::Relax);
                    self.emit(TimerEvent::RelaxStarted);
                }
            }
            TimerMode::Relax => {
                self.emit(TimerEvent::RelaxCompleted);
                self.state.enter_mode(TimerMode::Focus);
                self.emit(TimerEvent::FocusStarted);
            }
        }
    }

    /// Returns a reference to the current timer state.
    pub fn state(&self) -> &TimerState {
        &self.state
    }
}

// ============================================================================
// Tests
// ============================================================================
