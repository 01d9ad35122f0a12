//! Track model.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Display metadata cached from the file's tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackTags {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

impl TrackTags {
    /// Returns these tags with every field set in `update` replaced.
    ///
    /// An empty string in `update` clears the field.
    #[must_use]
    pub fn merged(&self, update: TrackTags) -> TrackTags {
        TrackTags {
            title: merge_field(&self.title, update.title),
            artist: merge_field(&self.artist, update.artist),
            album: merge_field(&self.album, update.album),
            genre: merge_field(&self.genre, update.genre),
        }
    }
}

fn merge_field(current: &Option<String>, update: Option<String>) -> Option<String> {
    match update {
        Some(value) if value.is_empty() => None,
        Some(value) => Some(value),
        None => current.clone(),
    }
}

/// One playable file in the library.
///
/// `name` and `path` never change after loading. `tags` is only replaced
/// through the tag-save path of the playback coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    name: String,
    path: PathBuf,
    tags: TrackTags,
}

impl Track {
    /// Creates a track for `path` with empty metadata.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string();
        Self {
            name,
            path,
            tags: TrackTags::default(),
        }
    }

    /// Attaches metadata read from the tag service.
    pub fn with_tags(mut self, tags: TrackTags) -> Self {
        self.tags = tags;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tags(&self) -> &TrackTags {
        &self.tags
    }

    /// Title from the tags, falling back to the file stem.
    pub fn title(&self) -> String {
        if let Some(title) = &self.tags.title {
            return title.clone();
        }
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
            .to_string()
    }

    /// "Artist - Title" when the artist is known, otherwise the title.
    pub fn display_name(&self) -> String {
        match &self.tags.artist {
            Some(artist) => format!("{} - {}", artist, self.title()),
            None => self.title(),
        }
    }

    pub(crate) fn set_tags(&mut self, tags: TrackTags) {
        self.tags = tags;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_file_name() {
        let track = Track::new("/music/01 Intro.mp3");
        assert_eq!(track.name(), "01 Intro.mp3");
        assert_eq!(track.path(), Path::new("/music/01 Intro.mp3"));
        assert_eq!(track.tags(), &TrackTags::default());
    }

    #[test]
    fn test_title_falls_back_to_stem() {
        let track = Track::new("/music/01 Intro.mp3");
        assert_eq!(track.title(), "01 Intro");
        assert_eq!(track.display_name(), "01 Intro");
    }

    #[test]
    fn test_display_name_with_tags() {
        let track = Track::new("/music/a.mp3").with_tags(TrackTags {
            title: Some("Song".into()),
            artist: Some("Band".into()),
            ..TrackTags::default()
        });
        assert_eq!(track.title(), "Song");
        assert_eq!(track.display_name(), "Band - Song");
    }

    #[test]
    fn test_merged_keeps_unset_fields() {
        let current = TrackTags {
            title: Some("Old".into()),
            artist: Some("Band".into()),
            album: Some("Record".into()),
            genre: None,
        };
        let merged = current.merged(TrackTags {
            title: Some("New".into()),
            genre: Some("Jazz".into()),
            ..TrackTags::default()
        });

        assert_eq!(merged.title.as_deref(), Some("New"));
        assert_eq!(merged.artist.as_deref(), Some("Band"));
        assert_eq!(merged.album.as_deref(), Some("Record"));
        assert_eq!(merged.genre.as_deref(), Some("Jazz"));

        let cleared = merged.merged(TrackTags {
            album: Some(String::new()),
            ..TrackTags::default()
        });
        assert_eq!(cleared.album, None);
        assert_eq!(cleared.title.as_deref(), Some("New"));
    }

    #[test]
    fn test_serialize_skips_missing_tags() {
        let track = Track::new("a.mp3");
        let json = serde_json::to_string(&track).unwrap();
        assert!(json.contains("\"name\":\"a.mp3\""));
        assert!(!json.contains("artist"));
    }
}
