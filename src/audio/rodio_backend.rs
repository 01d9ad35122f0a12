//! Audio backend implementation using rodio.
//!
//! This module provides the `RodioBackend`, which opens one paused `Sink`
//! per track on a shared output stream.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::debug;

use super::error::AudioError;
use super::{AudioBackend, AudioOutput};

/// Audio backend that decodes files with rodio.
///
/// The `OutputStream` returned by [`RodioBackend::try_default`] must be kept
/// alive by the caller for as long as the backend is used; dropping it
/// silences every sink.
#[derive(Clone)]
pub struct RodioBackend {
    /// Handle to the output stream for creating sinks.
    stream_handle: OutputStreamHandle,
}

impl RodioBackend {
    /// Opens the default output device.
    ///
    /// # Errors
    ///
    /// Returns `AudioError::DeviceNotAvailable` if no audio output device
    /// is available.
    pub fn try_default() -> Result<(OutputStream, Self), AudioError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| AudioError::DeviceNotAvailable(e.to_string()))?;

        debug!("Audio output stream initialized");

        Ok((stream, Self { stream_handle }))
    }
}

impl AudioBackend for RodioBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn AudioOutput>, AudioError> {
        let file = File::open(path)
            .map_err(|e| AudioError::FileNotFound(format!("{}: {}", path.display(), e)))?;

        let decoder = Decoder::new(BufReader::new(file))
            .map_err(|e| AudioError::DecodeError(format!("{}: {}", path.display(), e)))?;

        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| AudioError::StreamError(e.to_string()))?;

        // Sessions decide when to start.
        sink.pause();
        sink.append(decoder);

        debug!("Opened sink for {}", path.display());
        Ok(Box::new(RodioOutput { sink }))
    }
}

impl std::fmt::Debug for RodioBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioBackend").finish_non_exhaustive()
    }
}

/// A single track's sink.
struct RodioOutput {
    sink: Sink,
}

impl AudioOutput for RodioOutput {
    fn play(&mut self) {
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn close(&mut self) {
        self.sink.stop();
    }

    fn is_playing(&self) -> bool {
        !self.sink.is_paused() && !self.sink.empty()
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }
}
