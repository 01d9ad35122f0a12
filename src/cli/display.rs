//! Display utilities for the pomotune console.
//!
//! This module provides formatted output for:
//! - Player and timer status
//! - The track list
//! - Event notifications
//! - Error messages

use serde::Serialize;

use crate::app::{AppEvent, LinkPolicy};
use crate::library::Track;
use crate::playback::{PlayerEvent, PlayerSnapshot};
use crate::timer::TimerEvent;
use crate::types::{Origin, TimerState, TimerStatus};

// ============================================================================
// StatusReport
// ============================================================================

/// Everything `status` shows, serializable for `status --json`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub player: PlayerSnapshot,
    pub timer: TimerState,
    pub link: LinkPolicy,
}

// ============================================================================
// Display
// ============================================================================

/// Display utilities for console output.
pub struct Display;

impl Display {
    /// Shows the console banner.
    pub fn show_welcome(report: &StatusReport) {
        println!(
            "pomotune: {} tracks loaded. Type `help` for commands.",
            report.player.track_count
        );
    }

    /// Shows the full status.
    pub fn show_status(report: &StatusReport) {
        print!("{}", Self::render_status(report));
    }

    /// Shows the status as JSON.
    pub fn show_status_json(report: &StatusReport) -> serde_json::Result<()> {
        println!("{}", serde_json::to_string_pretty(report)?);
        Ok(())
    }

    /// Shows every track, marking the one at the cursor.
    pub fn show_tracks(tracks: &[Track], position: Option<usize>) {
        print!("{}", Self::render_tracks(tracks, position));
    }

    /// Shows an event, unless it is too noisy to print.
    pub fn show_event(event: &AppEvent) {
        if let Some(line) = Self::describe_event(event) {
            println!("{}", line);
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("error: {}", message);
    }

    /// Renders the multi-line status block.
    pub fn render_status(report: &StatusReport) -> String {
        let player = &report.player;
        let timer = &report.timer;
        let mut out = String::new();

        out.push_str("Music\n");
        out.push_str(&format!("  status:   {}\n", player.status.as_str()));
        match (&player.current, player.position) {
            (Some(track), Some(position)) => out.push_str(&format!(
                "  track:    {}/{} {}\n",
                position + 1,
                player.track_count,
                track.display_name()
            )),
            _ => out.push_str("  track:    (library is empty)\n"),
        }
        out.push_str(&format!(
            "  shuffle:  {}  autoplay: {}  volume: {:.0}%\n",
            on_off(player.shuffle),
            on_off(player.autoplay),
            player.volume * 100.0
        ));

        out.push_str("Timer\n");
        out.push_str(&format!("  status:   {}\n", timer.status.as_str()));
        if timer.status != TimerStatus::Idle {
            out.push_str(&format!(
                "  {:<8}  {}\n",
                format!("{}:", timer.mode.as_str()),
                Self::format_clock(timer.remaining_seconds)
            ));
            out.push_str(&format!(
                "  done:     {}/{}\n",
                timer.completed_iterations,
                timer.total_iterations()
            ));
        }

        out.push_str(&format!(
            "Link: {}{}\n",
            on_off(report.link.linked),
            if report.link.linked && report.link.pause_during_relax {
                " (pause during relax)"
            } else {
                ""
            }
        ));
        out
    }

    /// Renders the numbered track list used by `list` and `select`.
    pub fn render_tracks(tracks: &[Track], position: Option<usize>) -> String {
        if tracks.is_empty() {
            return "(library is empty)\n".to_string();
        }
        let width = tracks.len().to_string().len();
        tracks
            .iter()
            .enumerate()
            .map(|(i, track)| {
                let marker = if position == Some(i) { '>' } else { ' ' };
                format!("{} {:>width$}. {}\n", marker, i + 1, track.display_name())
            })
            .collect()
    }

    /// One-line description of an event; `None` for timer ticks.
    pub fn describe_event(event: &AppEvent) -> Option<String> {
        let line = match event {
            AppEvent::Player(event) => match event {
                PlayerEvent::Started { index, track, .. } => {
                    format!("> Playing #{}: {}", index + 1, track.display_name())
                }
                PlayerEvent::Paused { .. } => "|| Music paused".to_string(),
                PlayerEvent::Resumed { .. } => "> Music resumed".to_string(),
                PlayerEvent::Stopped { .. } => "[] Music stopped".to_string(),
                PlayerEvent::TrackFinished { index } => format!("  Track #{} finished", index + 1),
                // Autoplay moves are followed by Started
                PlayerEvent::CursorMoved {
                    origin: Origin::Internal,
                    ..
                } => return None,
                PlayerEvent::CursorMoved { index, .. } => format!("  Track #{} selected", index + 1),
                PlayerEvent::PlaybackFailed { index, message } => {
                    format!("! Could not play track #{}: {}", index + 1, message)
                }
                PlayerEvent::QueueExhausted => "  End of playlist".to_string(),
            },
            AppEvent::Timer(event) => match event {
                TimerEvent::Configured { settings } => format!(
                    "  Timer set: {}m focus / {}m relax x{}",
                    settings.focus_minutes, settings.relax_minutes, settings.iterations
                ),
                TimerEvent::Started { .. } => "> Timer running".to_string(),
                TimerEvent::Paused { .. } => "|| Timer paused".to_string(),
                TimerEvent::Tick { .. } => return None,
                TimerEvent::FocusCompleted {
                    completed_iterations,
                } => format!("* Focus period {} done", completed_iterations),
                TimerEvent::RelaxStarted => "  Relax".to_string(),
                TimerEvent::RelaxCompleted => return None,
                TimerEvent::FocusStarted => "  Focus".to_string(),
                TimerEvent::Restarted { .. } => "  Timer restarted".to_string(),
                TimerEvent::IterationLimitReached => "* All focus periods done".to_string(),
            },
        };
        Some(line)
    }

    /// Formats seconds as `MM:SS`.
    pub fn format_clock(total_seconds: u32) -> String {
        let (minutes, seconds) = Self::format_time(total_seconds);
        format!("{:02}:{:02}", minutes, seconds)
    }

    /// Formats remaining seconds as (minutes, seconds).
    fn format_time(total_seconds: u32) -> (u32, u32) {
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;
        (minutes, seconds)
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

// ============================================================================
// Tests
// ============================================================================
