//! Durable backing stores for the entity store.
//!
//! One capability interface, [`PersistenceAdapter`], with two implementations:
//! [`remote::RemoteDocumentStore`] writes each change as a single upsert or delete,
//! [`local::LocalSlotStore`] rewrites the whole snapshot after every change. The
//! adapter declares which it wants through [`WritePolicy`], and the session builds
//! only what that policy needs.

pub mod local;
pub mod remote;

use async_trait::async_trait;

use crate::error::PersistenceError;
use crate::thought::types::{FavoriteSummary, StoreSnapshot, Thought};

/// Owner key used for demo-mode storage, which has no identity.
pub const DEMO_OWNER: &str = "demo";

/// How an adapter wants mutations delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    /// One write or delete per change.
    PerChange,
    /// The full store contents after each change.
    Snapshot,
}

/// A single in-memory mutation, as seen by a per-change adapter.
#[derive(Debug, Clone, Copy)]
pub enum Change<'a> {
    ThoughtAdded(&'a Thought),
    FavoriteAdded(&'a FavoriteSummary),
    FavoriteRemoved(&'a str),
}

impl Change<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ThoughtAdded(_) => "thought_added",
            Self::FavoriteAdded(_) => "favorite_added",
            Self::FavoriteRemoved(_) => "favorite_removed",
        }
    }
}

/// Durable store for one session's thoughts and favorites.
///
/// Fetches return newest-first sequences. Writes are best-effort from the session's
/// point of view: a failure is reported back but never rolled back in memory.
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    fn write_policy(&self) -> WritePolicy;

    async fn fetch_thoughts(&self, owner: &str) -> Result<Vec<Thought>, PersistenceError>;

    async fn fetch_favorites(&self, owner: &str) -> Result<Vec<FavoriteSummary>, PersistenceError>;

    /// Apply one change. Only called under [`WritePolicy::PerChange`].
    async fn apply_change(
        &self,
        _owner: &str,
        _change: Change<'_>,
    ) -> Result<(), PersistenceError> {
        Ok(())
    }

    /// Overwrite everything with `snapshot`. Only called under [`WritePolicy::Snapshot`].
    async fn save_snapshot(
        &self,
        _owner: &str,
        _snapshot: &StoreSnapshot,
    ) -> Result<(), PersistenceError> {
        Ok(())
    }
}
