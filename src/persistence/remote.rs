//! Signed-in storage: per-user document collections in SQLite.
//!
//! Each thought or favorite is one JSON document keyed by `(owner, collection, id)`.
//! Writes are upserts by id, deletes are by id, and collection reads come back
//! ordered by `createdAt` / `favoritedAt` descending. The connection is opened
//! lazily so an unreachable store surfaces as an `unavailable` failure at load time.

use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::{Change, PersistenceAdapter, WritePolicy};
use crate::error::PersistenceError;
use crate::thought::types::{FavoriteSummary, Thought};

pub const THOUGHTS_COLLECTION: &str = "thoughts";
pub const FAVORITES_COLLECTION: &str = "favorites";

#[derive(Clone)]
pub struct RemoteDocumentStore {
    path: Option<PathBuf>,
    conn: Arc<Mutex<Option<Connection>>>,
}

impl RemoteDocumentStore {
    /// A store backed by the database file at `path`, opened on first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            conn: Arc::new(Mutex::new(None)),
        }
    }

    /// An already-open in-memory store.
    pub fn in_memory() -> Result<Self, PersistenceError> {
        let conn = crate::db::open_memory_database()
            .map_err(|e| PersistenceError::unavailable(format!("{e:#}")))?;
        Ok(Self {
            path: None,
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }

    /// Run `f` against the connection on the blocking pool, opening it if needed.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, PersistenceError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, PersistenceError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|e| {
                PersistenceError::internal(format!("connection lock poisoned: {e}"))
            })?;

            if guard.is_none() {
                let path =
                    path.ok_or_else(|| PersistenceError::unavailable("store has no location"))?;
                let opened = crate::db::open_database(&path)
                    .map_err(|e| PersistenceError::unavailable(format!("{e:#}")))?;
                *guard = Some(opened);
            }

            match guard.as_mut() {
                Some(conn) => f(conn),
                None => Err(PersistenceError::unavailable("store is not open")),
            }
        })
        .await
        .map_err(|e| PersistenceError::internal(format!("store task failed: {e}")))?
    }

    async fn fetch_collection<T>(
        &self,
        owner: &str,
        collection: &'static str,
    ) -> Result<Vec<T>, PersistenceError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let owner = owner.to_string();
        self.with_conn(move |conn| list_documents(conn, &owner, collection))
            .await
    }

    async fn upsert<T>(
        &self,
        owner: &str,
        collection: &'static str,
        id: &str,
        sort_key: &str,
        doc: &T,
    ) -> Result<(), PersistenceError>
    where
        T: serde::Serialize,
    {
        let body = serde_json::to_string(doc)?;
        let owner = owner.to_string();
        let id = id.to_string();
        let sort_key = sort_key.to_string();
        self.with_conn(move |conn| {
            upsert_document(conn, &owner, collection, &id, &sort_key, &body)
        })
        .await
    }

    async fn delete(
        &self,
        owner: &str,
        collection: &'static str,
        id: &str,
    ) -> Result<(), PersistenceError> {
        let owner = owner.to_string();
        let id = id.to_string();
        self.with_conn(move |conn| delete_document(conn, &owner, collection, &id))
            .await
    }
}

#[async_trait]
impl PersistenceAdapter for RemoteDocumentStore {
    fn write_policy(&self) -> WritePolicy {
        WritePolicy::PerChange
    }

    async fn fetch_thoughts(&self, owner: &str) -> Result<Vec<Thought>, PersistenceError> {
        self.fetch_collection(owner, THOUGHTS_COLLECTION).await
    }

    async fn fetch_favorites(&self, owner: &str) -> Result<Vec<FavoriteSummary>, PersistenceError> {
        self.fetch_collection(owner, FAVORITES_COLLECTION).await
    }

    async fn apply_change(&self, owner: &str, change: Change<'_>) -> Result<(), PersistenceError> {
        match change {
            Change::ThoughtAdded(thought) => {
                self.upsert(owner, THOUGHTS_COLLECTION, &thought.id, &thought.created_at, thought)
                    .await
            }
            Change::FavoriteAdded(favorite) => {
                let sort_key = &favorite.favorited_at;
                self.upsert(owner, FAVORITES_COLLECTION, &favorite.id, sort_key, favorite)
                    .await
            }
            Change::FavoriteRemoved(id) => self.delete(owner, FAVORITES_COLLECTION, id).await,
        }
    }
}

/// All documents of one collection, newest first.
fn list_documents<T: DeserializeOwned>(
    conn: &Connection,
    owner: &str,
    collection: &str,
) -> Result<Vec<T>, PersistenceError> {
    let mut stmt = conn.prepare(
        "SELECT body FROM documents WHERE owner = ?1 AND collection = ?2 ORDER BY sort_key DESC",
    )?;

    let bodies: Vec<String> = stmt
        .query_map(params![owner, collection], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;

    bodies
        .iter()
        .map(|body| serde_json::from_str(body).map_err(PersistenceError::from))
        .collect()
}

fn upsert_document(
    conn: &Connection,
    owner: &str,
    collection: &str,
    id: &str,
    sort_key: &str,
    body: &str,
) -> Result<(), PersistenceError> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO documents (owner, collection, id, sort_key, body, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
         ON CONFLICT(owner, collection, id) DO UPDATE SET \
         sort_key = excluded.sort_key, body = excluded.body, updated_at = excluded.updated_at",
        params![owner, collection, id, sort_key, body, now],
    )?;
    Ok(())
}

fn delete_document(
    conn: &Connection,
    owner: &str,
    collection: &str,
    id: &str,
) -> Result<(), PersistenceError> {
    let rows = conn.execute(
        "DELETE FROM documents WHERE owner = ?1 AND collection = ?2 AND id = ?3",
        params![owner, collection, id],
    )?;
    if rows == 0 {
        tracing::debug!(collection, id, "delete matched no document");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CODE_UNAVAILABLE;

    fn thought_at(id: &str, created_at: &str) -> Thought {
        Thought {
            id: id.into(),
            title: format!("title {id}"),
            content: "c".into(),
            tags: vec!["t".into()],
            created_at: created_at.into(),
        }
    }

    fn favorite_at(id: &str, favorited_at: &str) -> FavoriteSummary {
        FavoriteSummary {
            id: id.into(),
            theme: "t".into(),
            summary: format!("summary {id}"),
            favorited_at: favorited_at.into(),
        }
    }

    #[tokio::test]
    async fn reads_are_newest_first() {
        let store = RemoteDocumentStore::in_memory().unwrap();
        for (id, ts) in [
            ("b", "2024-01-02T00:00:00.000Z"),
            ("c", "2024-01-03T00:00:00.000Z"),
            ("a", "2024-01-01T00:00:00.000Z"),
        ] {
            let t = thought_at(id, ts);
            store.apply_change("u1", Change::ThoughtAdded(&t)).await.unwrap();
        }

        let ids: Vec<String> = store
            .fetch_thoughts("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn collections_are_scoped_per_owner() {
        let store = RemoteDocumentStore::in_memory().unwrap();
        let t = thought_at("a", "2024-01-01T00:00:00.000Z");
        store.apply_change("u1", Change::ThoughtAdded(&t)).await.unwrap();

        assert_eq!(store.fetch_thoughts("u1").await.unwrap().len(), 1);
        assert!(store.fetch_thoughts("u2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upsert_overwrites_same_id() {
        let store = RemoteDocumentStore::in_memory().unwrap();
        let first = thought_at("a", "2024-01-01T00:00:00.000Z");
        let mut second = first.clone();
        second.title = "rewritten".into();

        store.apply_change("u1", Change::ThoughtAdded(&first)).await.unwrap();
        store.apply_change("u1", Change::ThoughtAdded(&second)).await.unwrap();

        let thoughts = store.fetch_thoughts("u1").await.unwrap();
        assert_eq!(thoughts.len(), 1);
        assert_eq!(thoughts[0].title, "rewritten");
    }

    #[tokio::test]
    async fn favorites_delete_by_id() {
        let store = RemoteDocumentStore::in_memory().unwrap();
        let older = favorite_at("f1", "2024-01-01T00:00:00.000Z");
        let newer = favorite_at("f2", "2024-02-01T00:00:00.000Z");
        store.apply_change("u1", Change::FavoriteAdded(&older)).await.unwrap();
        store.apply_change("u1", Change::FavoriteAdded(&newer)).await.unwrap();

        let favorites = store.fetch_favorites("u1").await.unwrap();
        assert_eq!(favorites[0].id, "f2");

        store.apply_change("u1", Change::FavoriteRemoved("f1")).await.unwrap();
        store.apply_change("u1", Change::FavoriteRemoved("missing")).await.unwrap();
        let favorites = store.fetch_favorites("u1").await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].id, "f2");
    }

    #[tokio::test]
    async fn unopenable_path_is_unavailable() {
        let tmp = tempfile::TempDir::new().unwrap();
        // A directory cannot be opened as a database file
        let store = RemoteDocumentStore::new(tmp.path());
        let err = store.fetch_thoughts("u1").await.unwrap_err();
        assert_eq!(err.code, CODE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn opens_lazily_on_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let db_path = tmp.path().join("nested").join("thoughts.db");
        let store = RemoteDocumentStore::new(&db_path);
        assert!(!db_path.exists());

        let t = thought_at("a", "2024-01-01T00:00:00.000Z");
        store.apply_change("u1", Change::ThoughtAdded(&t)).await.unwrap();
        assert!(db_path.exists());

        let reopened = RemoteDocumentStore::new(&db_path);
        assert_eq!(reopened.fetch_thoughts("u1").await.unwrap(), vec![t]);
    }
}
