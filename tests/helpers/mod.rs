#![allow(dead_code)]

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use thoughtweave::config::ViewsConfig;
use thoughtweave::enrichment::EnrichmentGateway;
use thoughtweave::error::{EnrichmentError, PersistenceError};
use thoughtweave::persistence::{Change, PersistenceAdapter, WritePolicy};
use thoughtweave::session::auth::{ConfiguredAuth, UserIdentity};
use thoughtweave::session::state::Mode;
use thoughtweave::session::Session;
use thoughtweave::thought::types::{
    ClassifiedThought, DailySummary, FavoriteSummary, StoreSnapshot, SynthesisResult, Thought,
};

/// Build a thought with a fixed timestamp.
pub fn thought(id: &str, title: &str, content: &str, tags: &[&str]) -> Thought {
    Thought {
        id: id.into(),
        title: title.into(),
        content: content.into(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        created_at: format!("2024-01-01T00:00:{:02}.000Z", id.len() % 60),
    }
}

pub fn identity(uid: &str) -> UserIdentity {
    UserIdentity {
        uid: uid.into(),
        display_name: None,
    }
}

/// Deterministic stand-in for the model.
///
/// `classify` titles a note with its first three words and tags it with every
/// `#word` it contains. Text containing `FAIL` is rejected with an API error.
#[derive(Default)]
pub struct ScriptedGateway {
    pub synthesis: Mutex<Option<SynthesisResult>>,
    pub themes_requested: Mutex<Vec<String>>,
    pub classify_calls: AtomicUsize,
    /// When set, `synthesize` waits for a notification before answering.
    pub gate: Option<Arc<Notify>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn answer_with(&self, summary: &str, source_ids: &[&str]) {
        *self.synthesis.lock().unwrap() = Some(SynthesisResult {
            summary: summary.into(),
            source_ids: source_ids.iter().map(|s| s.to_string()).collect(),
        });
    }
}

#[async_trait]
impl EnrichmentGateway for ScriptedGateway {
    async fn classify(&self, text: &str) -> Result<ClassifiedThought, EnrichmentError> {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        if text.contains("FAIL") {
            return Err(EnrichmentError::Api {
                status: 500,
                message: "scripted failure".into(),
            });
        }
        let words: Vec<&str> = text.split_whitespace().collect();
        Ok(ClassifiedThought {
            title: words.iter().take(3).copied().collect::<Vec<_>>().join(" "),
            content: "model echo".into(),
            tags: words
                .iter()
                .filter_map(|w| w.strip_prefix('#'))
                .map(str::to_string)
                .collect(),
        })
    }

    async fn synthesize(
        &self,
        _query: &str,
        thoughts: &[Thought],
    ) -> Result<SynthesisResult, EnrichmentError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let scripted = self.synthesis.lock().unwrap().clone();
        Ok(scripted.unwrap_or_else(|| SynthesisResult {
            summary: format!("{} thoughts considered", thoughts.len()),
            source_ids: thoughts.iter().map(|t| t.id.clone()).collect(),
        }))
    }

    async fn daily_summary(
        &self,
        theme: &str,
        thoughts: &[Thought],
    ) -> Result<DailySummary, EnrichmentError> {
        self.themes_requested.lock().unwrap().push(theme.to_string());
        Ok(DailySummary {
            theme: "model-picked".into(),
            summary: format!("Reflection on {theme} across {} thoughts", thoughts.len()),
        })
    }
}

/// In-memory adapter that records every write it receives.
pub struct MemoryAdapter {
    pub policy: WritePolicy,
    pub thoughts: Mutex<Vec<Thought>>,
    pub favorites: Mutex<Vec<FavoriteSummary>>,
    pub changes: Mutex<Vec<String>>,
    pub snapshots: Mutex<Vec<StoreSnapshot>>,
    pub fetch_error: Mutex<Option<PersistenceError>>,
    pub fail_writes: AtomicBool,
    /// When set, `fetch_thoughts` waits for a notification before answering.
    pub fetch_gate: Mutex<Option<Arc<Notify>>>,
}

impl MemoryAdapter {
    pub fn new(policy: WritePolicy) -> Self {
        Self {
            policy,
            thoughts: Mutex::new(Vec::new()),
            favorites: Mutex::new(Vec::new()),
            changes: Mutex::new(Vec::new()),
            snapshots: Mutex::new(Vec::new()),
            fetch_error: Mutex::new(None),
            fail_writes: AtomicBool::new(false),
            fetch_gate: Mutex::new(None),
        }
    }

    pub fn seeded(policy: WritePolicy, thoughts: Vec<Thought>) -> Self {
        let adapter = Self::new(policy);
        *adapter.thoughts.lock().unwrap() = thoughts;
        adapter
    }

    pub fn failing_fetch(err: PersistenceError) -> Self {
        let adapter = Self::new(WritePolicy::PerChange);
        *adapter.fetch_error.lock().unwrap() = Some(err);
        adapter
    }

    pub fn change_log(&self) -> Vec<String> {
        self.changes.lock().unwrap().clone()
    }

    fn write_guard(&self) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(PersistenceError::internal("write rejected"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PersistenceAdapter for MemoryAdapter {
    fn write_policy(&self) -> WritePolicy {
        self.policy
    }

    async fn fetch_thoughts(&self, _owner: &str) -> Result<Vec<Thought>, PersistenceError> {
        let gate = self.fetch_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(err) = self.fetch_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.thoughts.lock().unwrap().clone())
    }

    async fn fetch_favorites(
        &self,
        _owner: &str,
    ) -> Result<Vec<FavoriteSummary>, PersistenceError> {
        if let Some(err) = self.fetch_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.favorites.lock().unwrap().clone())
    }

    async fn apply_change(&self, owner: &str, change: Change<'_>) -> Result<(), PersistenceError> {
        self.changes
            .lock()
            .unwrap()
            .push(format!("{owner}:{}", change.kind()));
        self.write_guard()
    }

    async fn save_snapshot(
        &self,
        _owner: &str,
        snapshot: &StoreSnapshot,
    ) -> Result<(), PersistenceError> {
        self.snapshots.lock().unwrap().push(snapshot.clone());
        self.write_guard()
    }
}

/// A session over `adapter` with a seeded RNG.
pub fn session_with(
    mode: Mode,
    adapter: Arc<dyn PersistenceAdapter>,
    gateway: Arc<dyn EnrichmentGateway>,
    uid: Option<&str>,
) -> Session {
    Session::new(
        mode,
        adapter,
        Arc::new(ConfiguredAuth::new(uid.map(identity))),
        gateway,
        ViewsConfig::default(),
    )
    .with_rng(StdRng::seed_from_u64(42))
}

/// A started remote session for `u1` over a fresh [`MemoryAdapter`].
pub async fn ready_remote(gateway: Arc<ScriptedGateway>) -> (Session, Arc<MemoryAdapter>) {
    let adapter = Arc::new(MemoryAdapter::new(WritePolicy::PerChange));
    let session = session_with(Mode::Remote, adapter.clone(), gateway, Some("u1"));
    session.start().await.unwrap();
    (session, adapter)
}
