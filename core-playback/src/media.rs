//! Media items and content kinds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// The two mutually exclusive kinds of content a session can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Track,
    AudioBookChapter,
}

impl ContentKind {
    pub const ALL: [ContentKind; 2] = [ContentKind::Track, ContentKind::AudioBookChapter];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Track => "track",
            ContentKind::AudioBookChapter => "audio_book_chapter",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A playable item.
///
/// Equality and hashing only consider the kind and the playable locator, so two
/// search results pointing at the same preview are the same item even when
/// their display metadata differs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaItem {
    Track {
        title: String,
        artist: String,
        artwork_url: String,
        locator: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        genre: Option<String>,
    },
    AudioBookChapter {
        title: String,
        artist: String,
        artwork_url: String,
        locator: String,
    },
}

impl MediaItem {
    pub fn track(
        title: impl Into<String>,
        artist: impl Into<String>,
        artwork_url: impl Into<String>,
        locator: impl Into<String>,
    ) -> Self {
        MediaItem::Track {
            title: title.into(),
            artist: artist.into(),
            artwork_url: artwork_url.into(),
            locator: locator.into(),
            genre: None,
        }
    }

    pub fn audio_book_chapter(
        title: impl Into<String>,
        artist: impl Into<String>,
        artwork_url: impl Into<String>,
        locator: impl Into<String>,
    ) -> Self {
        MediaItem::AudioBookChapter {
            title: title.into(),
            artist: artist.into(),
            artwork_url: artwork_url.into(),
            locator: locator.into(),
        }
    }

    /// Attach a genre tag. Has no effect on audio-book chapters.
    pub fn with_genre(mut self, tag: impl Into<String>) -> Self {
        if let MediaItem::Track { genre, .. } = &mut self {
            *genre = Some(tag.into());
        }
        self
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            MediaItem::Track { .. } => ContentKind::Track,
            MediaItem::AudioBookChapter { .. } => ContentKind::AudioBookChapter,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            MediaItem::Track { title, .. } | MediaItem::AudioBookChapter { title, .. } => title,
        }
    }

    pub fn artist(&self) -> &str {
        match self {
            MediaItem::Track { artist, .. } | MediaItem::AudioBookChapter { artist, .. } => artist,
        }
    }

    pub fn artwork_url(&self) -> &str {
        match self {
            MediaItem::Track { artwork_url, .. }
            | MediaItem::AudioBookChapter { artwork_url, .. } => artwork_url,
        }
    }

    pub fn locator(&self) -> &str {
        match self {
            MediaItem::Track { locator, .. } | MediaItem::AudioBookChapter { locator, .. } => {
                locator
            }
        }
    }

    pub fn genre(&self) -> Option<&str> {
        match self {
            MediaItem::Track { genre, .. } => genre.as_deref(),
            MediaItem::AudioBookChapter { .. } => None,
        }
    }

    /// Identity used for de-duplication.
    pub fn key(&self) -> MediaKey {
        MediaKey {
            kind: self.kind(),
            locator: self.locator().to_string(),
        }
    }
}

impl PartialEq for MediaItem {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.locator() == other.locator()
    }
}

impl Eq for MediaItem {}

impl Hash for MediaItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        self.locator().hash(state);
    }
}

/// `(kind, locator)` identity of a [`MediaItem`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaKey {
    pub kind: ContentKind,
    pub locator: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn identity_ignores_display_metadata() {
        let a = MediaItem::track("A", "X", "art1", "https://p/1.m4a");
        let b = MediaItem::track("A (Remastered)", "Y", "art2", "https://p/1.m4a");
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(!set.insert(b));
    }

    #[test]
    fn identity_includes_kind() {
        let track = MediaItem::track("A", "X", "", "https://p/1.m4a");
        let chapter = MediaItem::audio_book_chapter("A", "X", "", "https://p/1.m4a");
        assert_ne!(track, chapter);
        assert_ne!(track.key(), chapter.key());
    }

    #[test]
    fn genre_only_applies_to_tracks() {
        let track = MediaItem::track("A", "X", "", "https://p/1").with_genre("Jazz");
        assert_eq!(track.genre(), Some("Jazz"));

        let chapter = MediaItem::audio_book_chapter("B", "Y", "", "https://p/2").with_genre("Jazz");
        assert_eq!(chapter.genre(), None);
    }

    #[test]
    fn serializes_with_kind_tag() {
        let item = MediaItem::audio_book_chapter("Ch 1", "Author", "https://a/1.jpg", "https://p/1");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"], "audio_book_chapter");
        assert_eq!(json["locator"], "https://p/1");
    }
}
