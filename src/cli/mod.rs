//! CLI module for pomotune.
//!
//! This module provides the command-line interface:
//! - `commands`: Process arguments and console commands using clap derive
//! - `console`: Runs console commands against the application context
//! - `display`: Output formatting and display logic

pub mod commands;
pub mod console;
pub mod display;

pub use commands::{Cli, Commands, ConsoleCommand, ConsoleLine, TagArgs, TimerAction};
pub use console::{execute, status_report, Flow};
pub use display::{Display, StatusReport};
