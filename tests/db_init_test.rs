use rusqlite::params;
use tempfile::TempDir;

use thoughtweave::db;
use thoughtweave::db::migrations::{get_schema_version, CURRENT_SCHEMA_VERSION};
use thoughtweave::persistence::remote::RemoteDocumentStore;
use thoughtweave::persistence::{Change, PersistenceAdapter};
use thoughtweave::thought::types::FavoriteSummary;

#[test]
fn open_creates_new_db_at_nonexistent_path() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("subdir").join("new.db");
    assert!(!db_path.exists());

    let conn = db::open_database(&db_path).unwrap();
    assert!(db_path.exists());

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
}

#[test]
fn busy_timeout_is_set() {
    let tmp = TempDir::new().unwrap();
    let conn = db::open_database(tmp.path().join("test.db")).unwrap();

    let timeout: i64 = conn
        .pragma_query_value(None, "busy_timeout", |row| row.get(0))
        .unwrap();
    assert_eq!(timeout, 5000);
}

#[test]
fn reopening_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("test.db");
    drop(db::open_database(&db_path).unwrap());

    let conn = db::open_database(&db_path).unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
}

#[test]
fn unknown_collection_is_rejected() {
    let conn = db::open_memory_database().unwrap();
    let result = conn.execute(
        "INSERT INTO documents (owner, collection, id, sort_key, body, updated_at) \
         VALUES ('u1', 'notes', 'x', '2024', '{}', '2024')",
        params![],
    );
    assert!(result.is_err());
}

#[tokio::test]
async fn writes_touch_only_the_documents_table() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("docs.db");
    let store = RemoteDocumentStore::new(&db_path);

    let favorite = FavoriteSummary {
        id: "f1".into(),
        theme: "calm".into(),
        summary: "breathe".into(),
        favorited_at: "2024-03-01T00:00:00.000Z".into(),
    };
    store
        .apply_change("u1", Change::FavoriteAdded(&favorite))
        .await
        .unwrap();
    assert_eq!(store.fetch_favorites("u1").await.unwrap(), vec![favorite]);

    store
        .apply_change("u1", Change::FavoriteRemoved("f1"))
        .await
        .unwrap();
    // deleting an absent id is not an error
    store
        .apply_change("u1", Change::FavoriteRemoved("f1"))
        .await
        .unwrap();
    assert!(store.fetch_favorites("u1").await.unwrap().is_empty());

    let conn = db::open_database(&db_path).unwrap();
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .unwrap();
    let tables: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(tables, vec!["documents", "schema_meta"]);
}
