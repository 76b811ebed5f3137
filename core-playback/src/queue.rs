//! Ordered items of one content kind plus a cursor.

use crate::error::{PlaybackError, Result};
use crate::media::{MediaItem, MediaKey};

/// Queue of items with an optional cursor.
///
/// The cursor is always `None` for an empty queue and always a valid index
/// otherwise. Failed mutations leave both items and cursor untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaQueue {
    items: Vec<MediaItem>,
    current_index: Option<usize>,
}

impl MediaQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue holding `items` with no current item.
    pub fn from_items(items: Vec<MediaItem>) -> Self {
        Self {
            items,
            current_index: None,
        }
    }

    /// Replace every item and point the cursor at `starting_at`.
    pub fn replace(&mut self, items: Vec<MediaItem>, starting_at: usize) -> Result<()> {
        if items.is_empty() {
            return Err(PlaybackError::EmptyQueue);
        }
        if starting_at >= items.len() {
            return Err(PlaybackError::IndexOutOfRange {
                index: starting_at,
                len: items.len(),
            });
        }

        self.items = items;
        self.current_index = Some(starting_at);
        Ok(())
    }

    /// Move the cursor forward, wrapping to the start.
    ///
    /// Without a cursor the first item becomes current.
    pub fn advance(&mut self) -> Result<usize> {
        let len = self.items.len();
        if len == 0 {
            return Err(PlaybackError::EmptyQueue);
        }
        let next = match self.current_index {
            Some(index) => (index + 1) % len,
            None => 0,
        };
        self.current_index = Some(next);
        Ok(next)
    }

    /// Move the cursor backward, wrapping to the end.
    ///
    /// Without a cursor the last item becomes current.
    pub fn retreat(&mut self) -> Result<usize> {
        let len = self.items.len();
        if len == 0 {
            return Err(PlaybackError::EmptyQueue);
        }
        let previous = match self.current_index {
            Some(index) => (index + len - 1) % len,
            None => len - 1,
        };
        self.current_index = Some(previous);
        Ok(previous)
    }

    /// Append an item, leaving the cursor where it is.
    pub fn push(&mut self, item: MediaItem) {
        self.items.push(item);
    }

    /// Drop items past `len`, clamping the cursor to the new end.
    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
        self.current_index = match (self.current_index, self.items.len()) {
            (_, 0) => None,
            (Some(index), len) if index >= len => Some(len - 1),
            (index, _) => index,
        };
    }

    pub fn current(&self) -> Option<&MediaItem> {
        self.current_index.and_then(|index| self.items.get(index))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn position_of(&self, key: &MediaKey) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.kind() == key.kind && item.locator() == key.locator)
    }
}
