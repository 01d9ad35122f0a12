//! Link between the timer and the player.
//!
//! When linked, user-driven pause/resume on one side is mirrored to the
//! other. Mirrored commands carry [`Origin::Link`], so the changes they cause
//! are never mirrored back. The two terminal events also pause the other
//! side: running out of tracks pauses the timer, and reaching the iteration
//! limit pauses the music.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use crate::playback::{PlayerCommand, PlayerEvent, PlayerHandle};
use crate::timer::{TimerCommand, TimerEvent, TimerHandle};
use crate::types::Origin;

use super::AppEvent;

// ============================================================================
// LinkAction
// ============================================================================

/// A command the link issues in response to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    /// Start or resume playback
    PlayMusic,
    /// Resume playback only if paused
    ResumeMusic,
    PauseMusic,
    StartTimer,
    PauseTimer,
}

// ============================================================================
// LinkPolicy
// ============================================================================

/// Decides which events are mirrored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkPolicy {
    pub linked: bool,
    /// Pause music while relaxing, resume it when focus begins
    pub pause_during_relax: bool,
}

impl LinkPolicy {
    /// Returns the mirrored action for `event`, if any.
    pub fn action_for(&self, event: &AppEvent) -> Option<LinkAction> {
        if !self.linked {
            return None;
        }

        match event {
            AppEvent::Player(event) => match event {
                PlayerEvent::Paused { origin } | PlayerEvent::Stopped { origin }
                    if origin.is_user() =>
                {
                    Some(LinkAction::PauseTimer)
                }
                PlayerEvent::Started { origin, .. } | PlayerEvent::Resumed { origin }
                    if origin.is_user() =>
                {
                    Some(LinkAction::StartTimer)
                }
                PlayerEvent::QueueExhausted => Some(LinkAction::PauseTimer),
                _ => None,
            },
            AppEvent::Timer(event) => match event {
                TimerEvent::Started { origin } if origin.is_user() => Some(LinkAction::PlayMusic),
                TimerEvent::Paused { origin } if origin.is_user() => Some(LinkAction::PauseMusic),
                TimerEvent::RelaxStarted if self.pause_during_relax => {
                    Some(LinkAction::PauseMusic)
                }
                TimerEvent::FocusStarted if self.pause_during_relax => {
                    Some(LinkAction::ResumeMusic)
                }
                TimerEvent::IterationLimitReached => Some(LinkAction::PauseMusic),
                _ => None,
            },
        }
    }
}

// ============================================================================
// LinkFlags
// ============================================================================

/// Link switches shared between the context and the bridge task.
#[derive(Debug, Clone, Default)]
pub struct LinkFlags {
    linked: Arc<AtomicBool>,
    pause_during_relax: Arc<AtomicBool>,
}

impl LinkFlags {
    pub fn new(linked: bool, pause_during_relax: bool) -> Self {
        Self {
            linked: Arc::new(AtomicBool::new(linked)),
            pause_during_relax: Arc::new(AtomicBool::new(pause_during_relax)),
        }
    }

    pub fn set_linked(&self, linked: bool) {
        self.linked.store(linked, Ordering::SeqCst);
    }

    pub fn set_pause_during_relax(&self, enabled: bool) {
        self.pause_during_relax.store(enabled, Ordering::SeqCst);
    }

    /// Current switch positions.
    pub fn policy(&self) -> LinkPolicy {
        LinkPolicy {
            linked: self.linked.load(Ordering::SeqCst),
            pause_during_relax: self.pause_during_relax.load(Ordering::SeqCst),
        }
    }
}

// ============================================================================
// Bridge task
// ============================================================================

/// Forwards both event streams to `out` and applies the link policy.
///
/// Runs until both streams close. A dropped `out` receiver does not stop the
/// link.
pub(crate) async fn run_bridge(
    player: PlayerHandle,
    timer: TimerHandle,
    flags: LinkFlags,
    mut player_events: mpsc::UnboundedReceiver<PlayerEvent>,
    mut timer_events: mpsc::UnboundedReceiver<TimerEvent>,
    out: mpsc::UnboundedSender<AppEvent>,
) {
    loop {
        let event = tokio::select! {
            Some(event) = player_events.recv() => AppEvent::Player(event),
            Some(event) = timer_events.recv() => AppEvent::Timer(event),
            else => break,
        };

        if let Some(action) = flags.policy().action_for(&event) {
            apply(action, &player, &timer).await;
        }
        let _ = out.send(event);
    }

    debug!("Link bridge exited");
}

async fn apply(action: LinkAction, player: &PlayerHandle, timer: &TimerHandle) {
    debug!(?action, "Mirroring");
    match action {
        LinkAction::PlayMusic => mirror_player(player, PlayerCommand::Play).await,
        LinkAction::ResumeMusic => mirror_player(player, PlayerCommand::Resume).await,
        LinkAction::PauseMusic => mirror_player(player, PlayerCommand::Pause).await,
        LinkAction::StartTimer => mirror_timer(timer, TimerCommand::Start).await,
        LinkAction::PauseTimer => mirror_timer(timer, TimerCommand::Pause).await,
    }
}

async fn mirror_player(player: &PlayerHandle, command: PlayerCommand) {
    if let Err(e) = player.send(command.clone(), Origin::Link).await {
        debug!(?command, "Linked player command ignored: {}", e);
    }
}

async fn mirror_timer(timer: &TimerHandle, command: TimerCommand) {
    if let Err(e) = timer.send(command, Origin::Link).await {
        debug!(?command, "Linked timer command ignored: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::Track;

    const LINKED: LinkPolicy = LinkPolicy {
        linked: true,
        pause_during_relax: false,
    };

    fn player(event: PlayerEvent) -> AppEvent {
        AppEvent::Player(event)
    }

    fn timer(event: TimerEvent) -> AppEvent {
        AppEvent::Timer(event)
    }

    #[test]
    fn test_unlinked_mirrors_nothing() {
        let policy = LinkPolicy::default();
        assert_eq!(
            policy.action_for(&player(PlayerEvent::Paused {
                origin: Origin::User
            })),
            None
        );
        assert_eq!(
            policy.action_for(&timer(TimerEvent::Started {
                origin: Origin::User
            })),
            None
        );
    }

    #[test]
    fn test_player_to_timer() {
        assert_eq!(
            LINKED.action_for(&player(PlayerEvent::Paused {
                origin: Origin::User
            })),
            Some(LinkAction::PauseTimer)
        );
        assert_eq!(
            LINKED.action_for(&player(PlayerEvent::Stopped {
                origin: Origin::User
            })),
            Some(LinkAction::PauseTimer)
        );
        assert_eq!(
            LINKED.action_for(&player(PlayerEvent::Resumed {
                origin: Origin::User
            })),
            Some(LinkAction::StartTimer)
        );
        assert_eq!(
            LINKED.action_for(&player(PlayerEvent::Started {
                index: 0,
                track: Track::new("/music/a.mp3"),
                origin: Origin::User,
            })),
            Some(LinkAction::StartTimer)
        );
    }

    #[test]
    fn test_timer_to_player() {
        assert_eq!(
            LINKED.action_for(&timer(TimerEvent::Started {
                origin: Origin::User
            })),
            Some(LinkAction::PlayMusic)
        );
        assert_eq!(
            LINKED.action_for(&timer(TimerEvent::Paused {
                origin: Origin::User
            })),
            Some(LinkAction::PauseMusic)
        );
    }

    #[test]
    fn test_link_origin_never_echoes() {
        for event in [
            player(PlayerEvent::Paused {
                origin: Origin::Link,
            }),
            player(PlayerEvent::Resumed {
                origin: Origin::Link,
            }),
            timer(TimerEvent::Started {
                origin: Origin::Link,
            }),
            timer(TimerEvent::Paused {
                origin: Origin::Link,
            }),
        ] {
            assert_eq!(LINKED.action_for(&event), None);
        }
    }

    #[test]
    fn test_autoplay_start_is_not_mirrored() {
        let event = player(PlayerEvent::Started {
            index: 1,
            track: Track::new("/music/b.mp3"),
            origin: Origin::Internal,
        });
        assert_eq!(LINKED.action_for(&event), None);
    }

    #[test]
    fn test_terminal_events_pause_other_side() {
        assert_eq!(
            LINKED.action_for(&player(PlayerEvent::QueueExhausted)),
            Some(LinkAction::PauseTimer)
        );
        assert_eq!(
            LINKED.action_for(&timer(TimerEvent::IterationLimitReached)),
            Some(LinkAction::PauseMusic)
        );
        assert_eq!(
            LinkPolicy::default().action_for(&player(PlayerEvent::QueueExhausted)),
            None
        );
    }

    #[test]
    fn test_pause_during_relax() {
        let policy = LinkPolicy {
            linked: true,
            pause_during_relax: true,
        };
        assert_eq!(
            policy.action_for(&timer(TimerEvent::RelaxStarted)),
            Some(LinkAction::PauseMusic)
        );
        assert_eq!(
            policy.action_for(&timer(TimerEvent::FocusStarted)),
            Some(LinkAction::ResumeMusic)
        );
        assert_eq!(LINKED.action_for(&timer(TimerEvent::RelaxStarted)), None);
    }

    #[test]
    fn test_flags_policy() {
        let flags = LinkFlags::new(false, false);
        let shared = flags.clone();
        shared.set_linked(true);
        shared.set_pause_during_relax(true);
        assert_eq!(
            flags.policy(),
            LinkPolicy {
                linked: true,
                pause_during_relax: true
            }
        );
    }
}
