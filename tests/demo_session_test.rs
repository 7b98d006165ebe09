mod helpers;

use std::sync::Arc;
use tempfile::TempDir;

use thoughtweave::persistence::local::{LocalSlotStore, FAVORITES_SLOT, THOUGHTS_SLOT};
use thoughtweave::persistence::{WritePolicy, DEMO_OWNER};
use thoughtweave::session::state::{Mode, SessionState};
use thoughtweave::session::Session;
use thoughtweave::thought::types::{DailySummary, FavoriteSummary, Thought};

use helpers::{session_with, MemoryAdapter, ScriptedGateway};

fn demo_session(dir: &TempDir) -> (Session, LocalSlotStore) {
    let store = LocalSlotStore::new(dir.path());
    let session = session_with(
        Mode::Demo,
        Arc::new(store.clone()),
        Arc::new(ScriptedGateway::new()),
        None,
    );
    (session, store)
}

fn read_slot<T: serde::de::DeserializeOwned>(store: &LocalSlotStore, slot: &str) -> Vec<T> {
    let raw = std::fs::read_to_string(store.slot_path(slot)).unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[tokio::test]
async fn starts_ready_without_identity() {
    let tmp = TempDir::new().unwrap();
    let (session, _) = demo_session(&tmp);

    assert_eq!(session.start().await.unwrap(), SessionState::Ready);
    assert!(session.identity().is_none());
    assert!(session.load_error().is_none());
    assert!(session.thoughts().is_empty());
}

#[tokio::test]
async fn corrupt_slot_starts_empty() {
    let tmp = TempDir::new().unwrap();
    let (session, store) = demo_session(&tmp);
    std::fs::write(store.slot_path(THOUGHTS_SLOT), "{not json").unwrap();
    std::fs::write(store.slot_path(FAVORITES_SLOT), "[{\"theme\": 3}]").unwrap();

    assert_eq!(session.start().await.unwrap(), SessionState::Ready);
    assert!(session.thoughts().is_empty());
    assert!(session.favorites().is_empty());
    assert!(session.load_error().is_none());
}

#[tokio::test]
async fn every_mutation_rewrites_both_slots() {
    let tmp = TempDir::new().unwrap();
    let (session, store) = demo_session(&tmp);
    session.start().await.unwrap();

    let committed = session.add_thought("water the plants #home").await.unwrap();
    assert!(committed.write.is_persisted());
    let thoughts: Vec<Thought> = read_slot(&store, THOUGHTS_SLOT);
    assert_eq!(thoughts, session.thoughts());
    let favorites: Vec<FavoriteSummary> = read_slot(&store, FAVORITES_SLOT);
    assert!(favorites.is_empty());

    let daily = DailySummary {
        theme: "home".into(),
        summary: "Keep things alive.".into(),
    };
    let favorite = session.favorite(&daily).await.unwrap().unwrap();
    let favorites: Vec<FavoriteSummary> = read_slot(&store, FAVORITES_SLOT);
    assert_eq!(favorites, vec![favorite.value.clone()]);

    session.unfavorite(&favorite.value.id).await.unwrap();
    let favorites: Vec<FavoriteSummary> = read_slot(&store, FAVORITES_SLOT);
    assert!(favorites.is_empty());
    let thoughts: Vec<Thought> = read_slot(&store, THOUGHTS_SLOT);
    assert_eq!(thoughts.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_favorites_leave_the_newest_state_on_disk() {
    let tmp = TempDir::new().unwrap();
    let (session, store) = demo_session(&tmp);
    session.start().await.unwrap();
    let session = Arc::new(session);

    let mut tasks = Vec::new();
    for n in 0..24 {
        let session = session.clone();
        tasks.push(tokio::spawn(async move {
            let daily = DailySummary {
                theme: format!("theme-{n}"),
                summary: format!("summary {n}"),
            };
            session.favorite(&daily).await
        }));
    }
    for task in tasks {
        let committed = task.await.unwrap().unwrap().unwrap();
        assert!(committed.write.is_persisted());
    }

    let on_disk: Vec<FavoriteSummary> = read_slot(&store, FAVORITES_SLOT);
    assert_eq!(on_disk.len(), 24);
    assert_eq!(on_disk, session.favorites());
}

#[tokio::test]
async fn data_survives_restart() {
    let tmp = TempDir::new().unwrap();
    {
        let (session, _) = demo_session(&tmp);
        session.start().await.unwrap();
        session.add_thought("first idea #a").await.unwrap();
        session.add_thought("second idea #b").await.unwrap();
    }

    let (session, _) = demo_session(&tmp);
    session.start().await.unwrap();
    let titles: Vec<String> = session.thoughts().into_iter().map(|t| t.title).collect();
    assert_eq!(titles, vec!["second idea #b", "first idea #a"]);
}

#[tokio::test]
async fn snapshot_adapter_never_sees_single_changes() {
    let adapter = Arc::new(MemoryAdapter::new(WritePolicy::Snapshot));
    let session = session_with(
        Mode::Demo,
        adapter.clone(),
        Arc::new(ScriptedGateway::new()),
        None,
    );
    session.start().await.unwrap();

    session.add_thought("one #x").await.unwrap();
    session.add_thought("two #y").await.unwrap();

    assert!(adapter.change_log().is_empty());
    let snapshots = adapter.snapshots.lock().unwrap();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0].thoughts.len(), 1);
    assert_eq!(snapshots[1].thoughts.len(), 2);
}

#[tokio::test]
async fn demo_owner_is_used_for_storage() {
    let adapter = Arc::new(MemoryAdapter::new(WritePolicy::PerChange));
    let session = session_with(
        Mode::Demo,
        adapter.clone(),
        Arc::new(ScriptedGateway::new()),
        None,
    );
    session.start().await.unwrap();
    session.add_thought("note #z").await.unwrap();
    assert_eq!(adapter.change_log(), vec![format!("{DEMO_OWNER}:thought_added")]);
}
