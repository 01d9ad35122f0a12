//! Tag read/write service.
//!
//! The library only needs four display fields, so the service boundary is
//! kept to `read` and `write` of [`TrackTags`].

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use lofty::config::WriteOptions;
use lofty::prelude::*;
use lofty::tag::Tag;
use tracing::debug;

use super::error::TagError;
use super::track::TrackTags;

/// Reads and writes display tags for audio files.
pub trait TagService: Send + Sync {
    /// Reads the tags of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed.
    fn read(&self, path: &Path) -> Result<TrackTags, TagError>;

    /// Writes `tags` into the file at `path`.
    ///
    /// `None` fields are removed from the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or saved.
    fn write(&self, path: &Path, tags: &TrackTags) -> Result<(), TagError>;
}

// ============================================================================
// LoftyTagService
// ============================================================================

/// Tag service backed by lofty (ID3v2, Vorbis comments, MP4 atoms, ...).
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyTagService;

fn non_empty(value: Option<Cow<'_, str>>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl TagService for LoftyTagService {
    fn read(&self, path: &Path) -> Result<TrackTags, TagError> {
        let tagged = lofty::read_from_path(path)
            .map_err(|e| TagError::Read(format!("{}: {}", path.display(), e)))?;

        let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
            return Ok(TrackTags::default());
        };

        Ok(TrackTags {
            title: non_empty(tag.title()),
            artist: non_empty(tag.artist()),
            album: non_empty(tag.album()),
            genre: non_empty(tag.genre()),
        })
    }

    fn write(&self, path: &Path, tags: &TrackTags) -> Result<(), TagError> {
        let mut tagged = lofty::read_from_path(path)
            .map_err(|e| TagError::Write(format!("{}: {}", path.display(), e)))?;

        if tagged.primary_tag().is_none() {
            let tag_type = tagged.primary_tag_type();
            tagged.insert_tag(Tag::new(tag_type));
        }
        let tag = tagged
            .primary_tag_mut()
            .ok_or_else(|| TagError::Write(format!("{}: no writable tag", path.display())))?;

        match &tags.title {
            Some(v) => tag.set_title(v.clone()),
            None => tag.remove_title(),
        }
        match &tags.artist {
            Some(v) => tag.set_artist(v.clone()),
            None => tag.remove_artist(),
        }
        match &tags.album {
            Some(v) => tag.set_album(v.clone()),
            None => tag.remove_album(),
        }
        match &tags.genre {
            Some(v) => tag.set_genre(v.clone()),
            None => tag.remove_genre(),
        }

        tag.save_to_path(path, WriteOptions::default())
            .map_err(|e| TagError::Write(format!("{}: {}", path.display(), e)))?;

        debug!("Saved tags for {}", path.display());
        Ok(())
    }
}

// ============================================================================
// MockTagService
// ============================================================================

/// In-memory tag service for testing.
#[derive(Debug, Default)]
pub struct MockTagService {
    tags: Mutex<HashMap<PathBuf, TrackTags>>,
    write_calls: Mutex<Vec<PathBuf>>,
    should_fail: std::sync::atomic::AtomicBool,
}

impl MockTagService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the tags returned for `path`.
    pub fn insert(&self, path: impl Into<PathBuf>, tags: TrackTags) {
        self.tags.lock().unwrap().insert(path.into(), tags);
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail
            .store(should_fail, std::sync::atomic::Ordering::SeqCst);
    }

    #[must_use]
    pub fn write_count(&self) -> usize {
        self.write_calls.lock().unwrap().len()
    }
}

impl TagService for MockTagService {
    fn read(&self, path: &Path) -> Result<TrackTags, TagError> {
        if self.should_fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(TagError::Read("Mock failure".to_string()));
        }
        Ok(self
            .tags
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_default())
    }

    fn write(&self, path: &Path, tags: &TrackTags) -> Result<(), TagError> {
        if self.should_fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(TagError::Write("Mock failure".to_string()));
        }
        self.write_calls.lock().unwrap().push(path.to_path_buf());
        self.insert(path, tags.clone());
        Ok(())
    }
}
