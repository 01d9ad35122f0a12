//! Command definitions for pomotune.
//!
//! Uses clap derive macro for both the process arguments and the commands
//! typed into the interactive console.

use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, Parser, Subcommand};

use crate::library::TrackTags;
use crate::types::{AppConfig, TimerSettings};

// ============================================================================
// CLI Structure
// ============================================================================

/// Focus timer with a music player that pauses along with it
#[derive(Parser, Debug)]
#[command(
    name = "pomotune",
    version,
    about = "Focus/relax interval timer coupled to a local music player",
    long_about = "Plays the audio files of a directory while a focus/relax interval timer \
                  runs. With --link, pausing either one pauses the other.\n\
                  Type `help` at the prompt for console commands.",
    subcommand_negates_reqs = true,
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// Directory with the music library
    #[arg(required = true)]
    pub library: Option<PathBuf>,

    /// Focus duration in minutes (1-120)
    #[arg(
        short,
        long,
        default_value = "25",
        value_parser = clap::value_parser!(u32).range(1..=120)
    )]
    pub focus: u32,

    /// Relax duration in minutes (1-120)
    #[arg(
        short,
        long,
        default_value = "5",
        value_parser = clap::value_parser!(u32).range(1..=120)
    )]
    pub relax: u32,

    /// Number of focus periods (1-99)
    #[arg(
        short,
        long,
        default_value = "4",
        value_parser = clap::value_parser!(u32).range(1..=99)
    )]
    pub iterations: u32,

    /// Play tracks in random order
    #[arg(short, long)]
    pub shuffle: bool,

    /// Stop after each track instead of continuing with the next
    #[arg(long)]
    pub no_autoplay: bool,

    /// Pausing the timer pauses the music and vice versa
    #[arg(short, long)]
    pub link: bool,

    /// While linked, pause the music during relax periods
    #[arg(long)]
    pub pause_during_relax: bool,

    /// Output volume (0.0-1.0)
    #[arg(long, default_value = "0.2", value_parser = parse_volume)]
    pub volume: f32,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Assembles the application configuration from the arguments.
    pub fn config(&self) -> AppConfig {
        AppConfig {
            library_path: self.library.clone().unwrap_or_default(),
            shuffle: self.shuffle,
            autoplay: !self.no_autoplay,
            link: self.link,
            pause_during_relax: self.pause_during_relax,
            volume: self.volume,
            timer: TimerSettings::new(self.focus, self.relax, self.iterations),
            ..AppConfig::default()
        }
    }
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Console commands
// ============================================================================

/// One line typed at the console prompt.
#[derive(Parser, Debug)]
#[command(
    name = "console",
    no_binary_name = true,
    disable_version_flag = true
)]
pub struct ConsoleLine {
    #[command(subcommand)]
    pub command: ConsoleCommand,
}

impl ConsoleLine {
    /// Parses a console line.
    ///
    /// Double quotes group words, so `tag --title "Two Words"` works.
    ///
    /// # Errors
    ///
    /// Returns the clap error (including help output) for invalid input.
    pub fn parse_line(line: &str) -> Result<Self, clap::Error> {
        Self::try_parse_from(split_line(line))
    }
}

/// Commands accepted at the console prompt
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    /// Start playing, or resume if paused
    Play,

    /// Pause the music
    Pause,

    /// Stop the music
    Stop,

    /// Skip to the next track
    Next,

    /// Go back to the previous track
    #[command(alias = "previous")]
    Prev,

    /// List every track in the library
    #[command(alias = "ls")]
    List,

    /// Jump to a track by its number in `list`
    Select {
        #[arg(value_parser = parse_track_number)]
        number: usize,
    },

    /// Turn shuffle on or off
    Shuffle {
        #[arg(action = ArgAction::Set, value_parser = BoolishValueParser::new())]
        enabled: bool,
    },

    /// Turn autoplay on or off
    Autoplay {
        #[arg(action = ArgAction::Set, value_parser = BoolishValueParser::new())]
        enabled: bool,
    },

    /// Link or unlink timer and music
    Link {
        #[arg(action = ArgAction::Set, value_parser = BoolishValueParser::new())]
        enabled: bool,
    },

    /// While linked, pause the music during relax periods
    RelaxPause {
        #[arg(action = ArgAction::Set, value_parser = BoolishValueParser::new())]
        enabled: bool,
    },

    /// Set the output volume (0.0-1.0)
    Volume {
        #[arg(value_parser = parse_volume)]
        level: f32,
    },

    /// Save tags for the current track
    Tag(TagArgs),

    /// Control the interval timer
    Timer {
        #[command(subcommand)]
        action: TimerAction,
    },

    /// Show player and timer state
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Exit pomotune
    #[command(alias = "exit")]
    Quit,
}

/// Timer subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum TimerAction {
    /// Apply new durations and reset
    Set {
        /// Focus minutes (1-120)
        #[arg(value_parser = clap::value_parser!(u32).range(1..=120))]
        focus: u32,
        /// Relax minutes (1-120)
        #[arg(value_parser = clap::value_parser!(u32).range(1..=120))]
        relax: u32,
        /// Focus periods (1-99)
        #[arg(value_parser = clap::value_parser!(u32).range(1..=99))]
        iterations: u32,
    },
    /// Start or resume the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Reset to the first focus period
    Restart,
}

/// Arguments for the tag command.
///
/// Omitted fields keep their current value; an empty value clears the field.
#[derive(Args, Debug, Clone, PartialEq, Default)]
pub struct TagArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub artist: Option<String>,
    #[arg(long)]
    pub album: Option<String>,
    #[arg(long)]
    pub genre: Option<String>,
}

impl From<TagArgs> for TrackTags {
    fn from(args: TagArgs) -> Self {
        TrackTags {
            title: args.title,
            artist: args.artist,
            album: args.album,
            genre: args.genre,
        }
    }
}

// ============================================================================
// Parsing helpers
// ============================================================================

fn parse_volume(s: &str) -> Result<f32, String> {
    let volume: f32 = s
        .parse()
        .map_err(|_| format!("`{}` is not a number", s))?;
    if !(0.0..=1.0).contains(&volume) {
        return Err("volume must be between 0.0 and 1.0".to_string());
    }
    Ok(volume)
}

fn parse_track_number(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("track numbers start at 1".to_string()),
        Ok(number) => Ok(number),
        Err(_) => Err(format!("`{}` is not a track number", s)),
    }
}

/// Splits on whitespace, keeping double-quoted runs together.
fn split_line(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut pending = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                pending = true;
            }
            c if c.is_whitespace() && !quoted => {
                if pending {
                    words.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }
    if pending {
        words.push(current);
    }
    words
}

// ============================================================================
// Tests
// ============================================================================
