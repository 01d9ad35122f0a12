//! Ordered track queue with a navigation cursor.
//!
//! The cursor is owned by the playback coordinator; nothing else mutates it.

use std::path::Path;

use rand::Rng;
use tracing::{debug, info, warn};

use super::error::LibraryError;
use super::tags::TagService;
use super::track::{Track, TrackTags};

/// File extensions picked up when listing a library directory.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg", "wav", "m4a", "aac", "opus", "aiff"];

/// Navigation direction for sequential advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Ordered collection of tracks plus a cursor.
///
/// Invariant: `cursor < tracks.len()` whenever the queue is non-empty.
#[derive(Debug, Clone, Default)]
pub struct Queue {
    tracks: Vec<Track>,
    cursor: usize,
    shuffle: bool,
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            AUDIO_EXTENSIONS.iter().any(|e| *e == ext)
        })
        .unwrap_or(false)
}

impl Queue {
    /// Creates a queue over `tracks`.
    ///
    /// With `shuffle` the cursor starts at a uniformly random index,
    /// otherwise at 0.
    pub fn new(tracks: Vec<Track>, shuffle: bool) -> Self {
        let cursor = if shuffle && !tracks.is_empty() {
            rand::thread_rng().gen_range(0..tracks.len())
        } else {
            0
        };
        Self {
            tracks,
            cursor,
            shuffle,
        }
    }

    /// Lists `dir` (non-recursive) and builds a queue from its audio files.
    ///
    /// Files are ordered by name. A file whose tags cannot be read is still
    /// added, with its title taken from the file name.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Load` if the directory cannot be read.
    pub fn load_from_directory(
        dir: &Path,
        shuffle: bool,
        tags: &dyn TagService,
    ) -> Result<Self, LibraryError> {
        let entries = std::fs::read_dir(dir).map_err(|source| LibraryError::Load {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<_> = entries
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.path()),
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    None
                }
            })
            .filter(|path| path.is_file() && is_audio_file(path))
            .collect();
        paths.sort();

        let tracks: Vec<Track> = paths
            .into_iter()
            .map(|path| {
                debug!("Adding track {} to queue", path.display());
                let track_tags = tags.read(&path).unwrap_or_else(|e| {
                    debug!("No tags for {}: {}", path.display(), e);
                    TrackTags::default()
                });
                Track::new(path).with_tags(track_tags)
            })
            .collect();

        info!("Loaded {} tracks from {}", tracks.len(), dir.display());
        Ok(Self::new(tracks, shuffle))
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Cursor position, `None` when the queue is empty.
    pub fn position(&self) -> Option<usize> {
        (!self.tracks.is_empty()).then_some(self.cursor)
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffle
    }

    pub fn set_shuffle(&mut self, shuffle: bool) {
        self.shuffle = shuffle;
    }

    /// Returns true if advancing forward would land on another track.
    ///
    /// In shuffle mode any other track qualifies, so this holds whenever
    /// there are at least two tracks.
    pub fn has_next(&self) -> bool {
        if self.shuffle {
            self.tracks.len() > 1
        } else {
            !self.tracks.is_empty() && self.cursor < self.tracks.len() - 1
        }
    }

    /// Track at the cursor.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Empty` if the queue has no tracks.
    pub fn current(&self) -> Result<&Track, LibraryError> {
        self.tracks.get(self.cursor).ok_or(LibraryError::Empty)
    }

    /// Moves the cursor one step in `direction`.
    ///
    /// Returns the new cursor position.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::OutOfRange` (cursor unchanged) when already at
    /// the respective end, or `LibraryError::Empty` for an empty queue.
    pub fn advance(&mut self, direction: Direction) -> Result<usize, LibraryError> {
        if self.tracks.is_empty() {
            return Err(LibraryError::Empty);
        }
        let out_of_range = LibraryError::OutOfRange {
            position: self.cursor,
            len: self.tracks.len(),
        };
        match direction {
            Direction::Next => {
                if self.cursor + 1 >= self.tracks.len() {
                    return Err(out_of_range);
                }
                self.cursor += 1;
            }
            Direction::Previous => {
                if self.cursor == 0 {
                    return Err(out_of_range);
                }
                self.cursor -= 1;
            }
        }
        Ok(self.cursor)
    }

    /// Moves the cursor to a uniformly random index other than the current.
    ///
    /// With a single track this is a no-op and returns the current index.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Empty` for an empty queue.
    pub fn advance_random(&mut self) -> Result<usize, LibraryError> {
        let len = self.tracks.len();
        if len == 0 {
            return Err(LibraryError::Empty);
        }
        if len == 1 {
            return Ok(self.cursor);
        }
        // Draw from the other len-1 slots and skip over the cursor.
        let mut next = rand::thread_rng().gen_range(0..len - 1);
        if next >= self.cursor {
            next += 1;
        }
        self.cursor = next;
        Ok(self.cursor)
    }

    /// Moves forward according to the shuffle setting.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::OutOfRange` when there is no next track.
    pub fn advance_next(&mut self) -> Result<usize, LibraryError> {
        if !self.has_next() {
            if self.tracks.is_empty() {
                return Err(LibraryError::Empty);
            }
            return Err(LibraryError::OutOfRange {
                position: self.cursor,
                len: self.tracks.len(),
            });
        }
        if self.shuffle {
            self.advance_random()
        } else {
            self.advance(Direction::Next)
        }
    }

    /// Moves the cursor to `index`.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::OutOfRange` (cursor unchanged) if `index` is not
    /// in the queue, or `LibraryError::Empty` for an empty queue.
    pub fn select(&mut self, index: usize) -> Result<usize, LibraryError> {
        if self.tracks.is_empty() {
            return Err(LibraryError::Empty);
        }
        if index >= self.tracks.len() {
            return Err(LibraryError::OutOfRange {
                position: index,
                len: self.tracks.len(),
            });
        }
        self.cursor = index;
        Ok(self.cursor)
    }

    /// Replaces the cached metadata of the track at `index`.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::OutOfRange` if `index` is not in the queue.
    pub fn update_tags(&mut self, index: usize, tags: TrackTags) -> Result<(), LibraryError> {
        let len = self.tracks.len();
        let track = self
            .tracks
            .get_mut(index)
            .ok_or(LibraryError::OutOfRange {
                position: index,
                len,
            })?;
        track.set_tags(tags);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::tags::{LoftyTagService, MockTagService};

    fn tracks(n: usize) -> Vec<Track> {
        (0..n)
            .map(|i| Track::new(format!("/music/{:02}.mp3", i)))
            .collect()
    }

    mod load_tests {
        use super::*;

        #[test]
        fn test_load_filters_and_sorts() {
            let dir = tempfile::tempdir().unwrap();
            for name in ["b.mp3", "a.flac", "notes.txt", "c.OGG"] {
                std::fs::write(dir.path().join(name), b"x").unwrap();
            }
            std::fs::create_dir(dir.path().join("sub.mp3")).unwrap();

            let queue = Queue::load_from_directory(dir.path(), false, &LoftyTagService).unwrap();

            let names: Vec<_> = queue.tracks().iter().map(|t| t.name()).collect();
            assert_eq!(names, vec!["a.flac", "b.mp3", "c.OGG"]);
            assert_eq!(queue.position(), Some(0));
            assert!(queue.has_next());
        }

        #[test]
        fn test_load_uses_tag_service() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("a.mp3");
            std::fs::write(&path, b"x").unwrap();

            let tags = MockTagService::new();
            tags.insert(
                path.clone(),
                TrackTags {
                    title: Some("Tagged".into()),
                    ..TrackTags::default()
                },
            );

            let queue = Queue::load_from_directory(dir.path(), false, &tags).unwrap();
            assert_eq!(queue.current().unwrap().title(), "Tagged");
        }

        #[test]
        fn test_load_tag_failure_falls_back_to_name() {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("song.mp3"), b"x").unwrap();

            let tags = MockTagService::new();
            tags.set_should_fail(true);

            let queue = Queue::load_from_directory(dir.path(), false, &tags).unwrap();
            assert_eq!(queue.current().unwrap().title(), "song");
        }

        #[test]
        fn test_load_missing_directory() {
            let result =
                Queue::load_from_directory(Path::new("/nonexistent/music"), false, &LoftyTagService);
            assert!(matches!(result, Err(LibraryError::Load { .. })));
        }

        #[test]
        fn test_load_empty_directory() {
            let dir = tempfile::tempdir().unwrap();
            let queue = Queue::load_from_directory(dir.path(), false, &LoftyTagService).unwrap();
            assert!(queue.is_empty());
            assert_eq!(queue.position(), None);
            assert!(!queue.has_next());
            assert!(matches!(queue.current(), Err(LibraryError::Empty)));
        }

        #[test]
        fn test_shuffle_start_is_in_range() {
            for _ in 0..50 {
                let queue = Queue::new(tracks(5), true);
                assert!(queue.position().unwrap() < 5);
            }
        }
    }

    mod advance_tests {
        use super::*;

        #[test]
        fn test_next_until_end() {
            let mut queue = Queue::new(tracks(3), false);
            assert_eq!(queue.advance(Direction::Next).unwrap(), 1);
            assert!(queue.has_next());
            assert_eq!(queue.advance(Direction::Next).unwrap(), 2);
            assert!(!queue.has_next());

            let err = queue.advance(Direction::Next).unwrap_err();
            assert!(matches!(err, LibraryError::OutOfRange { position: 2, len: 3 }));
            assert_eq!(queue.position(), Some(2));
        }

        #[test]
        fn test_previous_reaches_index_zero() {
            let mut queue = Queue::new(tracks(3), false);
            queue.advance(Direction::Next).unwrap();

            // Index 1 -> 0 must be allowed
            assert_eq!(queue.advance(Direction::Previous).unwrap(), 0);
        }

        #[test]
        fn test_previous_at_zero_is_noop() {
            let mut queue = Queue::new(tracks(3), false);
            assert!(queue.advance(Direction::Previous).is_err());
            assert_eq!(queue.position(), Some(0));
        }

        #[test]
        fn test_cursor_stays_in_bounds() {
            let mut queue = Queue::new(tracks(4), false);
            let mut rng = rand::thread_rng();
            for _ in 0..500 {
                let direction = if rng.gen_bool(0.5) {
                    Direction::Next
                } else {
                    Direction::Previous
                };
                let _ = queue.advance(direction);
                assert!(queue.position().unwrap() < queue.len());
            }
        }

        #[test]
        fn test_advance_empty() {
            let mut queue = Queue::new(Vec::new(), false);
            assert!(matches!(
                queue.advance(Direction::Next),
                Err(LibraryError::Empty)
            ));
            assert!(matches!(queue.advance_random(), Err(LibraryError::Empty)));
            assert!(matches!(queue.advance_next(), Err(LibraryError::Empty)));
        }

        #[test]
        fn test_random_never_repeats_current() {
            let mut queue = Queue::new(tracks(3), true);
            for _ in 0..1000 {
                let before = queue.position().unwrap();
                let after = queue.advance_random().unwrap();
                assert_ne!(before, after);
                assert!(after < 3);
            }
        }

        #[test]
        fn test_random_reaches_every_other_track() {
            let mut queue = Queue::new(tracks(4), false);
            let mut seen = [false; 4];
            for _ in 0..1000 {
                seen[queue.advance_random().unwrap()] = true;
            }
            assert!(seen.iter().all(|s| *s));
        }

        #[test]
        fn test_random_single_track_is_noop() {
            let mut queue = Queue::new(tracks(1), true);
            assert_eq!(queue.advance_random().unwrap(), 0);
            assert!(!queue.has_next());
            assert!(queue.advance_next().is_err());
        }

        #[test]
        fn test_advance_next_respects_shuffle() {
            let mut queue = Queue::new(tracks(2), false);
            queue.advance_next().unwrap();
            assert!(queue.advance_next().is_err());

            queue.set_shuffle(true);
            assert!(queue.has_next());
            assert_eq!(queue.advance_next().unwrap(), 0);
        }

        #[test]
        fn test_select_moves_cursor() {
            let mut queue = Queue::new(tracks(3), false);
            assert_eq!(queue.select(2).unwrap(), 2);
            assert!(!queue.has_next());
            assert_eq!(queue.select(0).unwrap(), 0);
        }

        #[test]
        fn test_select_out_of_range_keeps_cursor() {
            let mut queue = Queue::new(tracks(3), false);
            queue.select(1).unwrap();

            let err = queue.select(3).unwrap_err();
            assert!(matches!(err, LibraryError::OutOfRange { position: 3, len: 3 }));
            assert_eq!(queue.position(), Some(1));

            let mut empty = Queue::new(Vec::new(), false);
            assert!(matches!(empty.select(0), Err(LibraryError::Empty)));
        }
    }

    mod tag_update_tests {
        use super::*;

        #[test]
        fn test_update_tags() {
            let mut queue = Queue::new(tracks(2), false);
            let tags = TrackTags {
                genre: Some("Ambient".into()),
                ..TrackTags::default()
            };
            queue.update_tags(1, tags.clone()).unwrap();
            assert_eq!(queue.tracks()[1].tags(), &tags);
            assert!(queue.update_tags(5, tags).is_err());
        }
    }
}
