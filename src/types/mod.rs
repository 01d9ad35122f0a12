//! Core data types shared by the timer, the player and the console.
//!
//! This module defines the data structures used for:
//! - Interval timer state and settings with validation
//! - Playback status as seen from outside the coordinator
//! - Command origins used by the link between timer and player
//! - Application configuration assembled from the command line

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ============================================================================
// Origin
// ============================================================================

/// Who caused a command or state change.
///
/// The link between timer and player only mirrors changes made by the user;
/// changes it issued itself carry [`Origin::Link`] and are never echoed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Issued from the user-facing controls
    #[default]
    User,
    /// Issued by the timer/player link
    Link,
    /// Issued by a component on its own (autoplay, phase change)
    Internal,
}

impl Origin {
    /// Returns true if the change came from the user-facing controls.
    pub fn is_user(&self) -> bool {
        matches!(self, Origin::User)
    }
}

// ============================================================================
// TimerMode / TimerStatus
// ============================================================================

/// The period the interval timer is counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    /// Work period
    #[default]
    Focus,
    /// Break period
    Relax,
}

impl TimerMode {
    /// Returns the string representation of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::Focus => "focus",
            TimerMode::Relax => "relax",
        }
    }
}

/// Lifecycle status of the interval timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    /// No settings configured yet
    #[default]
    Idle,
    /// Configured and waiting for start
    Ready,
    /// Counting down
    Running,
    /// Countdown suspended
    Paused,
    /// All iterations completed
    Completed,
}

impl TimerStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerStatus::Idle => "idle",
            TimerStatus::Ready => "ready",
            TimerStatus::Running => "running",
            TimerStatus::Paused => "paused",
            TimerStatus::Completed => "completed",
        }
    }
}

// ============================================================================
// TimerSettings
// ============================================================================

/// Durations and iteration count for the interval timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    /// Focus duration in minutes (1-120)
    pub focus_minutes: u32,
    /// Relax duration in minutes (1-120)
    pub relax_minutes: u32,
    /// Number of focus periods to complete (1-99)
    pub iterations: u32,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            focus_minutes: 25,
            relax_minutes: 5,
            iterations: 4,
        }
    }
}

impl TimerSettings {
    /// Creates settings from minutes and an iteration count.
    pub fn new(focus_minutes: u32, relax_minutes: u32, iterations: u32) -> Self {
        Self {
            focus_minutes,
            relax_minutes,
            iterations,
        }
    }

    /// Focus duration in seconds.
    pub fn focus_seconds(&self) -> u32 {
        self.focus_minutes * 60
    }

    /// Relax duration in seconds.
    pub fn relax_seconds(&self) -> u32 {
        self.relax_minutes * 60
    }

    /// Full duration of the given mode in seconds.
    pub fn seconds_for(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Focus => self.focus_seconds(),
            TimerMode::Relax => self.relax_seconds(),
        }
    }

    /// Validates the settings.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.focus_minutes < 1 || self.focus_minutes > 120 {
            return Err("focus duration must be between 1 and 120 minutes".to_string());
        }
        if self.relax_minutes < 1 || self.relax_minutes > 120 {
            return Err("relax duration must be between 1 and 120 minutes".to_string());
        }
        if self.iterations < 1 || self.iterations > 99 {
            return Err("iterations must be between 1 and 99".to_string());
        }
        Ok(())
    }
}

// ============================================================================
// TimerState
// ============================================================================

/// Current state of the interval timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TimerState {
    /// Lifecycle status
    pub status: TimerStatus,
    /// Period currently counting down
    pub mode: TimerMode,
    /// Remaining seconds in the current period
    pub remaining_seconds: u32,
    /// Focus periods completed since the last (re)configuration
    pub completed_iterations: u32,
    /// Active settings, `None` until configured
    pub settings: Option<TimerSettings>,
}

impl TimerState {
    /// Creates an unconfigured timer state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the settings and resets to the start of the first focus period.
    pub fn configure(&mut self, settings: TimerSettings) {
        self.settings = Some(settings);
        self.reset();
    }

    /// Resets to the start of the first focus period, keeping the settings.
    ///
    /// Does nothing while unconfigured.
    pub fn reset(&mut self) {
        if let Some(settings) = self.settings {
            self.status = TimerStatus::Ready;
            self.mode = TimerMode::Focus;
            self.remaining_seconds = settings.focus_seconds();
            self.completed_iterations = 0;
        }
    }

    /// Switches to the given mode with its full duration.
    pub fn enter_mode(&mut self, mode: TimerMode) {
        self.mode = mode;
        self.remaining_seconds = self
            .settings
            .map(|settings| settings.seconds_for(mode))
            .unwrap_or(0);
    }

    /// Decrements the countdown by one second.
    ///
    /// Returns true if the current period has completed (reached 0).
    pub fn tick(&mut self) -> bool {
        if self.remaining_seconds > 0 {
            self.remaining_seconds -= 1;
        }
        self.remaining_seconds == 0
    }

    /// Records a completed focus period.
    ///
    /// Returns true if the iteration limit has been reached.
    pub fn complete_focus(&mut self) -> bool {
        let total = self.total_iterations();
        if self.completed_iterations < total {
            self.completed_iterations += 1;
        }
        self.completed_iterations >= total
    }

    /// Configured number of iterations (0 while unconfigured).
    pub fn total_iterations(&self) -> u32 {
        self.settings.map(|s| s.iterations).unwrap_or(0)
    }

    /// Returns true if the countdown is running.
    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    /// Returns true if the countdown is paused.
    pub fn is_paused(&self) -> bool {
        self.status == TimerStatus::Paused
    }

    /// Returns true if settings have been applied.
    pub fn is_configured(&self) -> bool {
        self.settings.is_some()
    }
}

// ============================================================================
// Playback status
// ============================================================================

/// Lifecycle status of a single playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Not started
    #[default]
    Idle,
    /// Output is playing
    Playing,
    /// Output is paused
    Paused,
    /// Output released
    Stopped,
}

impl SessionStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Playing => "playing",
            SessionStatus::Paused => "paused",
            SessionStatus::Stopped => "stopped",
        }
    }

    /// Returns true if the session still owns its output.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Playing | SessionStatus::Paused)
    }
}

/// Status of the playback coordinator as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    /// Nothing is playing
    #[default]
    NoSession,
    /// Waiting for the previous session to retire before starting the next
    Starting,
    /// A session is playing
    Playing,
    /// A session is paused
    Paused,
}

impl PlayerStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerStatus::NoSession => "stopped",
            PlayerStatus::Starting => "starting",
            PlayerStatus::Playing => "playing",
            PlayerStatus::Paused => "paused",
        }
    }
}

// ============================================================================
// AppConfig
// ============================================================================

/// Application configuration, assembled from command-line arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the music library
    pub library_path: PathBuf,
    /// Pick the next track at random
    pub shuffle: bool,
    /// Continue with the next track when one finishes
    pub autoplay: bool,
    /// Couple timer pause/resume with playback pause/resume
    pub link: bool,
    /// While linked, pause music during relax periods
    pub pause_during_relax: bool,
    /// Output volume (0.0-1.0)
    pub volume: f32,
    /// Interval timer settings applied at startup
    pub timer: TimerSettings,
    /// Session monitor poll interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            library_path: PathBuf::from("."),
            shuffle: false,
            autoplay: true,
            link: false,
            pause_during_relax: false,
            volume: 0.2,
            timer: TimerSettings::default(),
            poll_interval_ms: 1000,
        }
    }
}

impl AppConfig {
    /// Creates a configuration for the given library directory.
    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = path.into();
        self
    }

    /// Sets the interval timer settings.
    pub fn with_timer(mut self, timer: TimerSettings) -> Self {
        self.timer = timer;
        self
    }

    /// Sets the session monitor poll interval.
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.volume) {
            return Err("volume must be between 0.0 and 1.0".to_string());
        }
        if self.poll_interval_ms == 0 {
            return Err("poll interval must be greater than zero".to_string());
        }
        self.timer.validate()
    }
}

// ============================================================================
// Tests
// ============================================================================
