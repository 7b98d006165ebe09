//! In-memory entity store for the active session.
//!
//! Both sequences are newest-first by construction: new records are inserted at the
//! head and nothing is ever re-sorted. Hydration trusts the source order.

use crate::thought::types::{FavoriteSummary, StoreSnapshot, Thought};

#[derive(Debug, Default, Clone)]
pub struct EntityStore {
    thoughts: Vec<Thought>,
    favorites: Vec<FavoriteSummary>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the head. Colliding ids are logged but accepted.
    pub fn add_thought(&mut self, thought: Thought) {
        if self.thoughts.iter().any(|t| t.id == thought.id) {
            tracing::warn!(id = %thought.id, "thought id collision, keeping both records");
        }
        self.thoughts.insert(0, thought);
    }

    pub fn thoughts(&self) -> &[Thought] {
        &self.thoughts
    }

    pub fn thought(&self, id: &str) -> Option<&Thought> {
        self.thoughts.iter().find(|t| t.id == id)
    }

    /// Insert at the head. No `(theme, summary)` uniqueness check happens here.
    pub fn add_favorite(&mut self, favorite: FavoriteSummary) {
        self.favorites.insert(0, favorite);
    }

    /// Drop every favorite with this id. Returns whether anything was removed.
    pub fn remove_favorite(&mut self, id: &str) -> bool {
        let before = self.favorites.len();
        self.favorites.retain(|f| f.id != id);
        before != self.favorites.len()
    }

    pub fn favorites(&self) -> &[FavoriteSummary] {
        &self.favorites
    }

    /// Replace all in-memory state with a hydrated set.
    pub fn replace_all(&mut self, thoughts: Vec<Thought>, favorites: Vec<FavoriteSummary>) {
        self.thoughts = thoughts;
        self.favorites = favorites;
    }

    pub fn clear(&mut self) {
        self.thoughts.clear();
        self.favorites.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.thoughts.is_empty() && self.favorites.is_empty()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            thoughts: self.thoughts.clone(),
            favorites: self.favorites.clone(),
        }
    }
}
