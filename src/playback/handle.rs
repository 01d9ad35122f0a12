//! Cloneable front end for a running coordinator.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};

use crate::audio::AudioBackend;
use crate::library::{Queue, TagService, Track, TrackTags};
use crate::types::Origin;

use super::coordinator::{
    PlaybackCoordinator, PlaybackOptions, PlayerCommand, PlayerEvent, PlayerRequest,
    PlayerSnapshot,
};
use super::error::PlaybackError;

const REQUEST_CAPACITY: usize = 32;

/// Sends commands to the coordinator task and reads its snapshots.
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    requests: mpsc::Sender<PlayerRequest>,
    snapshots: watch::Receiver<PlayerSnapshot>,
    library: watch::Receiver<Vec<Track>>,
}

impl PlayerHandle {
    /// Spawns a coordinator task for `queue`.
    ///
    /// Returns the handle and the coordinator's event stream. The task ends
    /// once every handle is dropped.
    pub fn spawn(
        queue: Queue,
        backend: Arc<dyn AudioBackend>,
        tags: Arc<dyn TagService>,
        options: PlaybackOptions,
    ) -> (Self, mpsc::UnboundedReceiver<PlayerEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (coordinator, session_rx) =
            PlaybackCoordinator::new(queue, backend, tags, options, event_tx);
        let snapshots = coordinator.subscribe();
        let library = coordinator.subscribe_library();
        let (requests, request_rx) = mpsc::channel(REQUEST_CAPACITY);

        tokio::spawn(coordinator.run(request_rx, session_rx));

        (
            Self {
                requests,
                snapshots,
                library,
            },
            event_rx,
        )
    }

    /// Sends a command and waits for the result.
    ///
    /// # Errors
    ///
    /// Returns the coordinator's rejection, or `PlaybackError::Unavailable`
    /// if the task has stopped.
    pub async fn send(
        &self,
        command: PlayerCommand,
        origin: Origin,
    ) -> Result<PlayerSnapshot, PlaybackError> {
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(PlayerRequest {
                command,
                origin,
                reply,
            })
            .await
            .map_err(|_| PlaybackError::Unavailable)?;
        rx.await.map_err(|_| PlaybackError::Unavailable)?
    }

    pub async fn play(&self) -> Result<PlayerSnapshot, PlaybackError> {
        self.send(PlayerCommand::Play, Origin::User).await
    }

    pub async fn pause(&self) -> Result<PlayerSnapshot, PlaybackError> {
        self.send(PlayerCommand::Pause, Origin::User).await
    }

    pub async fn resume(&self) -> Result<PlayerSnapshot, PlaybackError> {
        self.send(PlayerCommand::Resume, Origin::User).await
    }

    pub async fn stop(&self) -> Result<PlayerSnapshot, PlaybackError> {
        self.send(PlayerCommand::Stop, Origin::User).await
    }

    pub async fn next(&self) -> Result<PlayerSnapshot, PlaybackError> {
        self.send(PlayerCommand::Next, Origin::User).await
    }

    pub async fn previous(&self) -> Result<PlayerSnapshot, PlaybackError> {
        self.send(PlayerCommand::Previous, Origin::User).await
    }

    /// Moves to the track at `index`, restarting playback if it was playing.
    pub async fn select(&self, index: usize) -> Result<PlayerSnapshot, PlaybackError> {
        self.send(PlayerCommand::Select(index), Origin::User).await
    }

    pub async fn set_shuffle(&self, shuffle: bool) -> Result<PlayerSnapshot, PlaybackError> {
        self.send(PlayerCommand::SetShuffle(shuffle), Origin::User)
            .await
    }

    pub async fn set_autoplay(&self, autoplay: bool) -> Result<PlayerSnapshot, PlaybackError> {
        self.send(PlayerCommand::SetAutoplay(autoplay), Origin::User)
            .await
    }

    pub async fn set_volume(&self, volume: f32) -> Result<PlayerSnapshot, PlaybackError> {
        self.send(PlayerCommand::SetVolume(volume), Origin::User)
            .await
    }

    pub async fn save_tags(&self, tags: TrackTags) -> Result<PlayerSnapshot, PlaybackError> {
        self.send(PlayerCommand::SaveTags(tags), Origin::User).await
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Every track in queue order, with current tags.
    pub fn tracks(&self) -> Vec<Track> {
        self.library.borrow().clone()
    }

    /// A fresh receiver for snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshots.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MockAudioBackend;
    use crate::library::{MockTagService, Track};
    use crate::types::PlayerStatus;
    use std::time::Duration;

    fn spawn(tracks: usize) -> (PlayerHandle, mpsc::UnboundedReceiver<PlayerEvent>, MockAudioBackend) {
        let backend = MockAudioBackend::new();
        let queue = Queue::new(
            (0..tracks)
                .map(|i| Track::new(format!("/music/{}.flac", i)))
                .collect(),
            false,
        );
        let options = PlaybackOptions {
            poll_interval: Duration::from_millis(10),
            ..PlaybackOptions::default()
        };
        let (handle, events) = PlayerHandle::spawn(
            queue,
            Arc::new(backend.clone()),
            Arc::new(MockTagService::new()),
            options,
        );
        (handle, events, backend)
    }

    #[tokio::test]
    async fn test_play_through_handle() {
        let (handle, mut events, backend) = spawn(2);

        let snapshot = handle.play().await.unwrap();
        assert_eq!(snapshot.status, PlayerStatus::Playing);
        assert_eq!(backend.open_count(), 1);
        assert!(matches!(
            events.recv().await,
            Some(PlayerEvent::Started { index: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_snapshot_published_after_command() {
        let (handle, _events, _backend) = spawn(2);
        let mut rx = handle.subscribe();

        handle.next().await.unwrap();
        rx.changed().await.unwrap();

        assert_eq!(handle.snapshot().position, Some(1));
    }

    #[tokio::test]
    async fn test_skip_completes_through_task() {
        let (handle, _events, backend) = spawn(3);
        let mut rx = handle.subscribe();
        handle.play().await.unwrap();

        let snapshot = handle.next().await.unwrap();
        assert_eq!(snapshot.status, PlayerStatus::Starting);

        tokio::time::timeout(
            Duration::from_secs(2),
            rx.wait_for(|s| s.status == PlayerStatus::Playing),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(backend.open_count(), 2);
    }

    #[tokio::test]
    async fn test_tracks_and_select() {
        let (handle, _events, backend) = spawn(3);
        let names: Vec<String> = handle.tracks().iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, vec!["0.flac", "1.flac", "2.flac"]);

        let snapshot = handle.select(2).await.unwrap();
        assert_eq!(snapshot.position, Some(2));
        assert_eq!(backend.open_count(), 0);
    }

    #[tokio::test]
    async fn test_rejection_is_returned() {
        let (handle, _events, _backend) = spawn(1);
        assert!(matches!(
            handle.pause().await,
            Err(PlaybackError::NoActiveSession)
        ));
    }

    #[tokio::test]
    async fn test_unavailable_after_task_exit() {
        let (requests, rx) = mpsc::channel(1);
        drop(rx);
        let (_, snapshots) = watch::channel(PlayerSnapshot::default());
        let (_, library) = watch::channel(Vec::new());
        let handle = PlayerHandle {
            requests,
            snapshots,
            library,
        };

        assert!(matches!(
            handle.play().await,
            Err(PlaybackError::Unavailable)
        ));
    }
}
