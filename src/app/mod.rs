//! Application context: the player, the timer and the link between them.
//!
//! `main` builds one [`AppContext`]; nothing here is global.

mod link;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::audio::AudioBackend;
use crate::library::{Queue, TagService};
use crate::playback::{PlaybackOptions, PlayerEvent, PlayerHandle};
use crate::timer::{TimerError, TimerEvent, TimerHandle};
use crate::types::AppConfig;

pub use link::{LinkAction, LinkFlags, LinkPolicy};

/// Notification from either side, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Player(PlayerEvent),
    Timer(TimerEvent),
}

/// Errors building the application context.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Timer(#[from] TimerError),
}

/// Owns the player and timer handles and the link bridge task.
#[derive(Debug)]
pub struct AppContext {
    player: PlayerHandle,
    timer: TimerHandle,
    flags: LinkFlags,
    bridge: JoinHandle<()>,
}

impl AppContext {
    /// Spawns the coordinator, the timer and the link bridge.
    ///
    /// The timer starts out Ready with `config.timer`. Returns the context
    /// and the merged event stream.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `config` does not validate.
    pub fn start(
        config: &AppConfig,
        queue: Queue,
        backend: Arc<dyn AudioBackend>,
        tags: Arc<dyn TagService>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<AppEvent>), AppError> {
        config.validate().map_err(AppError::Config)?;

        let options = PlaybackOptions {
            autoplay: config.autoplay,
            volume: config.volume,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        };
        let (player, player_events) = PlayerHandle::spawn(queue, backend, tags, options);
        let (timer, timer_events) = TimerHandle::spawn(Some(config.timer))?;

        let flags = LinkFlags::new(config.link, config.pause_during_relax);
        let (out, events) = mpsc::unbounded_channel();
        let bridge = tokio::spawn(link::run_bridge(
            player.clone(),
            timer.clone(),
            flags.clone(),
            player_events,
            timer_events,
            out,
        ));

        Ok((
            Self {
                player,
                timer,
                flags,
                bridge,
            },
            events,
        ))
    }

    pub fn player(&self) -> &PlayerHandle {
        &self.player
    }

    pub fn timer(&self) -> &TimerHandle {
        &self.timer
    }

    /// Couples or decouples timer and player.
    pub fn set_link(&self, linked: bool) {
        self.flags.set_linked(linked);
        info!("Link {}", if linked { "enabled" } else { "disabled" });
    }

    pub fn set_pause_during_relax(&self, enabled: bool) {
        self.flags.set_pause_during_relax(enabled);
    }

    /// Current link switches.
    pub fn link_policy(&self) -> LinkPolicy {
        self.flags.policy()
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        // The bridge holds handle clones; stopping it lets both tasks exit.
        self.bridge.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MockAudioBackend;
    use crate::library::{MockTagService, Track};
    use crate::types::{PlayerStatus, TimerSettings, TimerStatus};
    use tokio::time::timeout;

    fn start(link: bool) -> (AppContext, mpsc::UnboundedReceiver<AppEvent>) {
        let queue = Queue::new(
            (0..3)
                .map(|i| Track::new(format!("/music/{}.mp3", i)))
                .collect(),
            false,
        );
        let mut config = AppConfig::default()
            .with_timer(TimerSettings::new(1, 1, 2))
            .with_poll_interval_ms(10);
        config.link = link;
        AppContext::start(
            &config,
            queue,
            Arc::new(MockAudioBackend::new()),
            Arc::new(MockTagService::new()),
        )
        .unwrap()
    }

    async fn wait_timer(ctx: &AppContext, status: TimerStatus) {
        let mut rx = ctx.timer().subscribe();
        timeout(Duration::from_secs(2), rx.wait_for(|s| s.status == status))
            .await
            .expect("timer did not reach expected status")
            .unwrap();
    }

    async fn wait_player(ctx: &AppContext, status: PlayerStatus) {
        let mut rx = ctx.player().subscribe();
        timeout(Duration::from_secs(2), rx.wait_for(|s| s.status == status))
            .await
            .expect("player did not reach expected status")
            .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let mut config = AppConfig::default();
        config.volume = 2.0;
        let result = AppContext::start(
            &config,
            Queue::new(Vec::new(), false),
            Arc::new(MockAudioBackend::new()),
            Arc::new(MockTagService::new()),
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_timer_starts_ready() {
        let (ctx, _events) = start(false);
        assert_eq!(ctx.timer().state().status, TimerStatus::Ready);
        assert_eq!(ctx.player().snapshot().track_count, 3);
    }

    #[tokio::test]
    async fn test_linked_player_drives_timer() {
        let (ctx, _events) = start(true);

        ctx.player().play().await.unwrap();
        wait_timer(&ctx, TimerStatus::Running).await;

        ctx.player().pause().await.unwrap();
        wait_timer(&ctx, TimerStatus::Paused).await;

        ctx.player().play().await.unwrap();
        wait_timer(&ctx, TimerStatus::Running).await;
    }

    #[tokio::test]
    async fn test_linked_timer_drives_player() {
        let (ctx, _events) = start(true);

        ctx.timer().start().await.unwrap();
        wait_player(&ctx, PlayerStatus::Playing).await;

        ctx.timer().pause().await.unwrap();
        wait_player(&ctx, PlayerStatus::Paused).await;

        ctx.timer().start().await.unwrap();
        wait_player(&ctx, PlayerStatus::Playing).await;
    }

    #[tokio::test]
    async fn test_unlinked_is_independent() {
        let (ctx, mut events) = start(false);

        ctx.player().play().await.unwrap();
        // The bridge has handled the Started event once it is forwarded
        loop {
            let forwarded = timeout(Duration::from_secs(2), events.recv())
                .await
                .unwrap()
                .unwrap();
            if matches!(forwarded, AppEvent::Player(PlayerEvent::Started { .. })) {
                break;
            }
        }
        assert_eq!(ctx.timer().state().status, TimerStatus::Ready);
    }

    #[tokio::test]
    async fn test_unlink_at_runtime() {
        let (ctx, _events) = start(true);
        ctx.set_link(false);
        assert!(!ctx.link_policy().linked);

        ctx.timer().start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(ctx.player().snapshot().status, PlayerStatus::NoSession);
    }

    #[tokio::test]
    async fn test_mirror_errors_are_ignored() {
        let (ctx, _events) = start(true);

        // Player pause with nothing playing is rejected; the timer is untouched
        assert!(ctx.player().pause().await.is_err());
        ctx.timer().start().await.unwrap();
        wait_player(&ctx, PlayerStatus::Playing).await;

        // Timer pause mirrors; the player pause then gets no echo back
        ctx.timer().pause().await.unwrap();
        wait_player(&ctx, PlayerStatus::Paused).await;
        assert_eq!(ctx.timer().state().status, TimerStatus::Paused);
    }
}
