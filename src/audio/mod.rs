//! Audio output capability used by playback sessions.
//!
//! Sessions never talk to a concrete audio library; they go through the
//! small [`AudioBackend`] / [`AudioOutput`] pair defined here.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐  open(path)  ┌──────────────────┐
//! │   AudioBackend   │─────────────▶│   AudioOutput    │
//! │ (rodio / mock)   │              │ play/pause/close │
//! └──────────────────┘              │ is_playing       │
//!                                   └──────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use pomotune::audio::{AudioBackend, RodioBackend};
//!
//! // The stream must outlive every output opened from the backend
//! let (_stream, backend) = RodioBackend::try_default().expect("audio init");
//! let mut output = backend.open(Path::new("song.mp3")).expect("open");
//! output.play();
//! ```

mod error;
mod rodio_backend;

pub use error::AudioError;
pub use rodio_backend::RodioBackend;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Factory for audio outputs.
///
/// Implementations must be shareable across tasks; a backend is handed to
/// the playback coordinator as `Arc<dyn AudioBackend>`.
pub trait AudioBackend: Send + Sync {
    /// Opens and decodes the file at `path`, returning a paused output.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or decoded, or if the
    /// output device cannot accept a new stream.
    fn open(&self, path: &Path) -> Result<Box<dyn AudioOutput>, AudioError>;
}

/// One decoded stream attached to the output device.
pub trait AudioOutput: Send {
    /// Starts or resumes output.
    fn play(&mut self);

    /// Suspends output, keeping the position.
    fn pause(&mut self);

    /// Releases the stream. Called at most once per output.
    fn close(&mut self);

    /// Returns true while samples are being written to the device.
    ///
    /// A paused or exhausted output is not playing.
    fn is_playing(&self) -> bool;

    /// Sets the output volume (0.0-1.0).
    fn set_volume(&mut self, volume: f32);
}

// ============================================================================
// MockAudioBackend
// ============================================================================

/// Mock audio backend for testing.
///
/// Outputs play until [`MockAudioBackend::finish_current`] marks the most
/// recently opened one as exhausted. Clones share state, so a test can keep
/// one clone and hand another to the coordinator.
#[derive(Debug, Default, Clone)]
pub struct MockAudioBackend {
    inner: Arc<MockBackendState>,
}

#[derive(Debug, Default)]
struct MockBackendState {
    outputs: Mutex<Vec<Arc<MockOutputState>>>,
    failing_paths: Mutex<Vec<PathBuf>>,
    should_fail: AtomicBool,
}

#[derive(Debug)]
struct MockOutputState {
    path: PathBuf,
    playing: AtomicBool,
    ended: AtomicBool,
    close_count: AtomicUsize,
    volume: Mutex<f32>,
}

impl MockAudioBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `open` fail with a decode error.
    pub fn set_should_fail(&self, should_fail: bool) {
        self.inner.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Makes `open` fail for one specific path.
    pub fn fail_path(&self, path: impl Into<PathBuf>) {
        self.inner.failing_paths.lock().unwrap().push(path.into());
    }

    /// Number of successful `open` calls.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.inner.outputs.lock().unwrap().len()
    }

    /// Paths opened so far, in order.
    #[must_use]
    pub fn opened_paths(&self) -> Vec<PathBuf> {
        self.inner
            .outputs
            .lock()
            .unwrap()
            .iter()
            .map(|o| o.path.clone())
            .collect()
    }

    /// Per-output `close` counts, in open order.
    #[must_use]
    pub fn close_counts(&self) -> Vec<usize> {
        self.inner
            .outputs
            .lock()
            .unwrap()
            .iter()
            .map(|o| o.close_count.load(Ordering::SeqCst))
            .collect()
    }

    /// Number of opened outputs that are playing right now.
    #[must_use]
    pub fn playing_count(&self) -> usize {
        self.inner
            .outputs
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.is_playing())
            .count()
    }

    /// Volume of the most recently opened output.
    #[must_use]
    pub fn last_volume(&self) -> Option<f32> {
        self.inner
            .outputs
            .lock()
            .unwrap()
            .last()
            .map(|o| *o.volume.lock().unwrap())
    }

    /// Marks the most recently opened output as played to the end.
    ///
    /// Returns false if nothing has been opened.
    pub fn finish_current(&self) -> bool {
        match self.inner.outputs.lock().unwrap().last() {
            Some(output) => {
                output.ended.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }
}

impl MockOutputState {
    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
            && !self.ended.load(Ordering::SeqCst)
            && self.close_count.load(Ordering::SeqCst) == 0
    }
}

impl AudioBackend for MockAudioBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn AudioOutput>, AudioError> {
        if self.inner.should_fail.load(Ordering::SeqCst) {
            return Err(AudioError::DecodeError("Mock failure".to_string()));
        }
        if self
            .inner
            .failing_paths
            .lock()
            .unwrap()
            .iter()
            .any(|p| p == path)
        {
            return Err(AudioError::FileNotFound(path.display().to_string()));
        }

        let state = Arc::new(MockOutputState {
            path: path.to_path_buf(),
            playing: AtomicBool::new(false),
            ended: AtomicBool::new(false),
            close_count: AtomicUsize::new(0),
            volume: Mutex::new(1.0),
        });
        self.inner.outputs.lock().unwrap().push(Arc::clone(&state));
        Ok(Box::new(MockOutput { state }))
    }
}

struct MockOutput {
    state: Arc<MockOutputState>,
}

impl AudioOutput for MockOutput {
    fn play(&mut self) {
        self.state.playing.store(true, Ordering::SeqCst);
    }

    fn pause(&mut self) {
        self.state.playing.store(false, Ordering::SeqCst);
    }

    fn close(&mut self) {
        self.state.playing.store(false, Ordering::SeqCst);
        self.state.close_count.fetch_add(1, Ordering::SeqCst);
    }

    fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    fn set_volume(&mut self, volume: f32) {
        *self.state.volume.lock().unwrap() = volume;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_open_starts_paused() {
        let backend = MockAudioBackend::new();
        let output = backend.open(Path::new("/music/a.mp3")).unwrap();

        assert!(!output.is_playing());
        assert_eq!(backend.open_count(), 1);
        assert_eq!(backend.opened_paths(), vec![PathBuf::from("/music/a.mp3")]);
    }

    #[test]
    fn test_mock_play_pause_close() {
        let backend = MockAudioBackend::new();
        let mut output = backend.open(Path::new("a.mp3")).unwrap();

        output.play();
        assert!(output.is_playing());
        assert_eq!(backend.playing_count(), 1);

        output.pause();
        assert!(!output.is_playing());

        output.play();
        output.close();
        assert!(!output.is_playing());
        assert_eq!(backend.close_counts(), vec![1]);
    }

    #[test]
    fn test_mock_finish_current() {
        let backend = MockAudioBackend::new();
        assert!(!backend.finish_current());

        let mut output = backend.open(Path::new("a.mp3")).unwrap();
        output.play();
        assert!(backend.finish_current());
        assert!(!output.is_playing());
    }

    #[test]
    fn test_mock_failures() {
        let backend = MockAudioBackend::new();
        backend.fail_path("bad.mp3");

        match backend.open(Path::new("bad.mp3")) {
            Err(err) => assert!(err.is_file_error()),
            Ok(_) => panic!("expected failure"),
        }
        assert!(backend.open(Path::new("good.mp3")).is_ok());

        backend.set_should_fail(true);
        assert!(backend.open(Path::new("good.mp3")).is_err());
        assert_eq!(backend.open_count(), 1);
    }

    #[test]
    fn test_mock_volume() {
        let backend = MockAudioBackend::new();
        assert_eq!(backend.last_volume(), None);

        let mut output = backend.open(Path::new("a.mp3")).unwrap();
        output.set_volume(0.3);
        assert_eq!(backend.last_volume(), Some(0.3));
    }

    #[test]
    fn test_clones_share_state() {
        let backend = MockAudioBackend::new();
        let shared: Arc<dyn AudioBackend> = Arc::new(backend.clone());
        shared.open(Path::new("a.mp3")).unwrap();
        assert_eq!(backend.open_count(), 1);
    }
}
