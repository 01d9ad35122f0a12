//! Cloneable front end for the timer task.

use tokio::sync::{mpsc, oneshot, watch};

use crate::types::{Origin, TimerSettings, TimerState};

use super::engine::{TimerCommand, TimerEngine, TimerEvent, TimerRequest};
use super::error::TimerError;

const REQUEST_CAPACITY: usize = 16;

/// Sends commands to the timer task and reads its state.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    requests: mpsc::Sender<TimerRequest>,
    state: watch::Receiver<TimerState>,
}

impl TimerHandle {
    /// Spawns the timer task.
    ///
    /// With `settings` the timer starts out Ready, otherwise Idle. Returns
    /// the handle and the timer's event stream.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::InvalidSettings` if `settings` are out of range.
    pub fn spawn(
        settings: Option<TimerSettings>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<TimerEvent>), TimerError> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let mut engine = TimerEngine::new(event_tx);
        if let Some(settings) = settings {
            engine.set_settings(settings, Origin::Internal)?;
        }

        let (snapshot_tx, state) = watch::channel(engine.state().clone());
        let (requests, request_rx) = mpsc::channel(REQUEST_CAPACITY);
        tokio::spawn(engine.run(request_rx, snapshot_tx));

        Ok((Self { requests, state }, event_rx))
    }

    /// Sends a command and waits for the result.
    ///
    /// # Errors
    ///
    /// Returns the timer's rejection, or `TimerError::Unavailable` if the
    /// task has stopped.
    pub async fn send(&self, command: TimerCommand, origin: Origin) -> Result<TimerState, TimerError> {
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(TimerRequest {
                command,
                origin,
                reply,
            })
            .await
            .map_err(|_| TimerError::Unavailable)?;
        rx.await.map_err(|_| TimerError::Unavailable)?
    }

    pub async fn set_settings(&self, settings: TimerSettings) -> Result<TimerState, TimerError> {
        self.send(TimerCommand::SetSettings(settings), Origin::User)
            .await
    }

    pub async fn start(&self) -> Result<TimerState, TimerError> {
        self.send(TimerCommand::Start, Origin::User).await
    }

    pub async fn pause(&self) -> Result<TimerState, TimerError> {
        self.send(TimerCommand::Pause, Origin::User).await
    }

    pub async fn restart(&self) -> Result<TimerState, TimerError> {
        self.send(TimerCommand::Restart, Origin::User).await
    }

    /// Latest published state.
    pub fn state(&self) -> TimerState {
        self.state.borrow().clone()
    }

    /// A fresh receiver for state changes.
    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TimerMode, TimerStatus};
    use tokio::time::{sleep, Duration};

    #[tokio::test]
    async fn test_spawn_unconfigured() {
        let (timer, _events) = TimerHandle::spawn(None).unwrap();
        assert_eq!(timer.state().status, TimerStatus::Idle);
        assert_eq!(timer.start().await, Err(TimerError::NotConfigured));
    }

    #[tokio::test]
    async fn test_spawn_rejects_invalid_settings() {
        let result = TimerHandle::spawn(Some(TimerSettings::new(0, 5, 4)));
        assert!(matches!(result, Err(TimerError::InvalidSettings(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_in_real_time() {
        let (timer, _events) = TimerHandle::spawn(Some(TimerSettings::new(1, 1, 2))).unwrap();

        let state = timer.start().await.unwrap();
        assert_eq!(state.status, TimerStatus::Running);

        sleep(Duration::from_millis(10_500)).await;
        assert_eq!(timer.state().remaining_seconds, 50);

        timer.pause().await.unwrap();
        sleep(Duration::from_secs(5)).await;
        assert_eq!(timer.state().remaining_seconds, 50);
        assert_eq!(timer.state().status, TimerStatus::Paused);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_to_completion() {
        let (timer, mut events) = TimerHandle::spawn(Some(TimerSettings::new(1, 1, 2))).unwrap();
        timer.start().await.unwrap();

        sleep(Duration::from_secs(181)).await;

        let state = timer.state();
        assert_eq!(state.status, TimerStatus::Completed);
        assert_eq!(state.completed_iterations, 2);
        assert_eq!(state.mode, TimerMode::Focus);

        let mut increments = 0;
        let mut limit_reached = false;
        while let Ok(event) = events.try_recv() {
            match event {
                TimerEvent::FocusCompleted { .. } => increments += 1,
                TimerEvent::IterationLimitReached => limit_reached = true,
                _ => {}
            }
        }
        assert_eq!(increments, 2);
        assert!(limit_reached);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_through_handle() {
        let (timer, _events) = TimerHandle::spawn(Some(TimerSettings::new(1, 1, 1))).unwrap();
        timer.start().await.unwrap();
        sleep(Duration::from_millis(3_500)).await;

        let state = timer.restart().await.unwrap();
        assert_eq!(state.status, TimerStatus::Ready);
        assert_eq!(state.remaining_seconds, 60);
    }

    #[tokio::test]
    async fn test_unavailable_after_task_exit() {
        let (requests, rx) = mpsc::channel(1);
        drop(rx);
        let (_, state) = watch::channel(TimerState::new());
        let timer = TimerHandle { requests, state };
        assert_eq!(timer.start().await, Err(TimerError::Unavailable));
    }
}
