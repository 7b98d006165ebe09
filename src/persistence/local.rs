//! Demo-mode storage: two named JSON slots in a local directory.
//!
//! Reads never fail on bad data. A missing slot or a payload that does not parse is
//! treated as an empty sequence. Writes replace the whole slot through a uniquely named temp file
//! that is renamed over the destination.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{PersistenceAdapter, WritePolicy};
use crate::error::PersistenceError;
use crate::thought::types::{FavoriteSummary, StoreSnapshot, Thought};

pub const THOUGHTS_SLOT: &str = "thoughts_demo";
pub const FAVORITES_SLOT: &str = "favorites_demo";

#[derive(Debug, Clone)]
pub struct LocalSlotStore {
    dir: PathBuf,
}

impl LocalSlotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn slot_path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{slot}.json"))
    }

    async fn read_slot<T: DeserializeOwned>(&self, slot: &str) -> Vec<T> {
        let path = self.slot_path(slot);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(slot, error = %e, "failed to read local slot, starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(slot, error = %e, "corrupt local slot, starting empty");
                Vec::new()
            }
        }
    }

    async fn write_slot<T: Serialize>(
        &self,
        slot: &str,
        items: &[T],
    ) -> Result<(), PersistenceError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_vec(items)?;
        write_atomic(&self.dir, &self.slot_path(slot), json).await
    }
}

async fn write_atomic(dir: &Path, dest: &Path, bytes: Vec<u8>) -> Result<(), PersistenceError> {
    let dir = dir.to_path_buf();
    let dest = dest.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<(), PersistenceError> {
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&dest).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| PersistenceError::internal(format!("slot write task failed: {e}")))?
}

#[async_trait]
impl PersistenceAdapter for LocalSlotStore {
    fn write_policy(&self) -> WritePolicy {
        WritePolicy::Snapshot
    }

    async fn fetch_thoughts(&self, _owner: &str) -> Result<Vec<Thought>, PersistenceError> {
        Ok(self.read_slot(THOUGHTS_SLOT).await)
    }

    async fn fetch_favorites(
        &self,
        _owner: &str,
    ) -> Result<Vec<FavoriteSummary>, PersistenceError> {
        Ok(self.read_slot(FAVORITES_SLOT).await)
    }

    async fn save_snapshot(
        &self,
        _owner: &str,
        snapshot: &StoreSnapshot,
    ) -> Result<(), PersistenceError> {
        self.write_slot(THOUGHTS_SLOT, &snapshot.thoughts).await?;
        self.write_slot(FAVORITES_SLOT, &snapshot.favorites).await?;
        tracing::debug!(
            thoughts = snapshot.thoughts.len(),
            favorites = snapshot.favorites.len(),
            "local slots written"
        );
        Ok(())
    }
}
