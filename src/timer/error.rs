//! Timer error types.

use thiserror::Error;

/// Errors returned by the interval timer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    /// No settings have been applied yet.
    #[error("timer is not configured")]
    NotConfigured,

    /// The command is not valid in the current state.
    #[error("cannot {action} timer while {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },

    /// Every configured iteration has been completed; restart first.
    #[error("all iterations completed, restart the timer")]
    IterationLimitReached,

    /// Settings out of range.
    #[error("invalid timer settings: {0}")]
    InvalidSettings(String),

    /// The timer task has shut down.
    #[error("timer is not running")]
    Unavailable,
}
