//! Queue store
//!
//! The controller only consumes the queue through `QueueStore`; storage,
//! persistence and shuffling belong to whoever implements it.
//! `MemoryQueue` is the plain in-memory implementation.

use crate::types::QueueItem;

/// Ordered items plus the current position and navigation flags
///
/// Invariant: `position() < len()` whenever the queue is non-empty, and
/// `position() == 0` when it is empty.
pub trait QueueStore: Send {
    /// Number of items
    fn len(&self) -> usize;

    /// Item at `index`
    fn get(&self, index: usize) -> Option<&QueueItem>;

    /// Current position
    fn position(&self) -> usize;

    /// Move the current position. Out-of-range values are clamped.
    fn set_position(&mut self, position: usize);

    /// Advance automatically when an item ends or fails
    fn auto_next(&self) -> bool;

    /// Rewind the current item instead of stepping back when past 10 seconds
    fn smart_previous(&self) -> bool;

    fn set_auto_next(&mut self, enabled: bool);

    fn set_smart_previous(&mut self, enabled: bool);

    /// Add an item at the end
    fn append(&mut self, item: QueueItem);

    /// Remove the item at `index`, keeping the position valid
    fn remove_at(&mut self, index: usize) -> Option<QueueItem>;

    /// Remove every item and reset the position
    fn clear(&mut self);

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Item at the current position
    fn current(&self) -> Option<&QueueItem> {
        self.get(self.position())
    }

    /// Position of the item with the given identity
    fn index_of(&self, id: &str) -> Option<usize> {
        (0..self.len()).find(|&index| self.get(index).is_some_and(|item| item.id == id))
    }
}

/// In-memory queue
#[derive(Debug, Clone)]
pub struct MemoryQueue {
    items: Vec<QueueItem>,
    position: usize,
    auto_next: bool,
    smart_previous: bool,
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryQueue {
    /// Create an empty queue with auto-next on and smart-previous off
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            position: 0,
            auto_next: true,
            smart_previous: false,
        }
    }

    /// Create a queue from items
    pub fn from_items(items: Vec<QueueItem>) -> Self {
        Self {
            items,
            ..Self::new()
        }
    }

    /// Builder-style `auto_next`
    pub fn with_auto_next(mut self, enabled: bool) -> Self {
        self.auto_next = enabled;
        self
    }

    /// Builder-style `smart_previous`
    pub fn with_smart_previous(mut self, enabled: bool) -> Self {
        self.smart_previous = enabled;
        self
    }

    /// Append several items
    pub fn extend(&mut self, items: impl IntoIterator<Item = QueueItem>) {
        self.items.extend(items);
    }

    /// All items in order
    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }
}

impl QueueStore for MemoryQueue {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn get(&self, index: usize) -> Option<&QueueItem> {
        self.items.get(index)
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    fn position(&self) -> usize {
        self.position
    }

    fn set_position(&mut self, position: usize) {
        self.position = position.min(self.items.len().saturating_sub(1));
    }

    fn auto_next(&self) -> bool {
        self.auto_next
    }

    fn smart_previous(&self) -> bool {
        self.smart_previous
    }

    fn set_auto_next(&mut self, enabled: bool) {
        self.auto_next = enabled;
    }

    fn set_smart_previous(&mut self, enabled: bool) {
        self.smart_previous = enabled;
    }

    fn append(&mut self, item: QueueItem) {
        self.items.push(item);
    }

    fn remove_at(&mut self, index: usize) -> Option<QueueItem> {
        if index >= self.items.len() {
            return None;
        }

        let item = self.items.remove(index);

        // Keep pointing at the same item when something before it goes away
        if index < self.position {
            self.position -= 1;
        }
        self.position = self.position.min(self.items.len().saturating_sub(1));

        Some(item)
    }

    fn clear(&mut self) {
        self.items.clear();
        self.position = 0;
    }
}
