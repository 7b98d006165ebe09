//! Session/mode controller.
//!
//! [`Session`] owns the entity store for one session and drives it through the
//! lifecycle in [`state::SessionState`]. It is the only place that talks to both the
//! enrichment gateway and the persistence adapter: every mutation happens in memory
//! first, then goes to the adapter as a best-effort write whose outcome is handed
//! back to the caller as a [`WriteOutcome`] instead of being rolled back.
//!
//! All methods take `&self`. The in-memory state sits behind a mutex that is never
//! held across an await, and each enrichment-backed action is single-flight.

pub mod auth;
pub mod guard;
pub mod state;

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::ViewsConfig;
use crate::enrichment::EnrichmentGateway;
use crate::error::{Action, EnrichmentError, LoadFailure, PersistenceError, SessionError};
use crate::persistence::{Change, PersistenceAdapter, WritePolicy, DEMO_OWNER};
use crate::thought::store::EntityStore;
use crate::thought::types::{
    DailySummary, FavoriteSummary, ResolvedSynthesis, StoreSnapshot, TagAggregate, Thought,
};
use crate::thought::{split_notes, views};
use auth::{AuthProvider, UserIdentity};
use guard::InFlight;
use state::{Mode, SessionState};

/// What happened to the durable copy of a mutation that already landed in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Persisted,
    /// The write failed. In-memory state keeps the mutation anyway.
    Diverged(PersistenceError),
}

impl WriteOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted)
    }
}

/// A mutation applied in memory, plus the fate of its durable write.
#[derive(Debug, Clone)]
pub struct Committed<T> {
    pub value: T,
    pub write: WriteOutcome,
}

/// The "thought of the day" slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DailyView {
    /// No thoughts, or no tags to pick a theme from.
    Unavailable,
    Ready(DailySummary),
}

/// Result of importing pasted multi-note text.
#[derive(Debug)]
pub struct ImportReport {
    pub total: usize,
    pub imported: Vec<Committed<Thought>>,
    /// Index of the note that failed to classify, and why. Import stops there.
    pub failed: Option<(usize, EnrichmentError)>,
}

#[derive(Debug, Default, Clone)]
struct SearchState {
    active_filter: String,
    recent: Vec<String>,
}

impl SearchState {
    fn remember(&mut self, term: &str, limit: usize) {
        self.recent.retain(|t| t != term);
        self.recent.insert(0, term.to_string());
        self.recent.truncate(limit);
    }
}

struct Inner {
    state: SessionState,
    identity: Option<UserIdentity>,
    store: EntityStore,
    load_error: Option<LoadFailure>,
    daily: Option<DailySummary>,
    search: SearchState,
    rng: StdRng,
    /// Bumped on every identity change; a load started under an older value is stale.
    generation: u64,
}

pub struct Session {
    mode: Mode,
    adapter: Arc<dyn PersistenceAdapter>,
    auth: Arc<dyn AuthProvider>,
    gateway: Arc<dyn EnrichmentGateway>,
    views: ViewsConfig,
    inner: Mutex<Inner>,
    in_flight: InFlight,
    /// Orders demo snapshot writes so the last one on disk is the newest state.
    snapshot_lock: tokio::sync::Mutex<()>,
}

impl Session {
    pub fn new(
        mode: Mode,
        adapter: Arc<dyn PersistenceAdapter>,
        auth: Arc<dyn AuthProvider>,
        gateway: Arc<dyn EnrichmentGateway>,
        views: ViewsConfig,
    ) -> Self {
        Self {
            mode,
            adapter,
            auth,
            gateway,
            views,
            inner: Mutex::new(Inner {
                state: SessionState::Uninitialized,
                identity: None,
                store: EntityStore::new(),
                load_error: None,
                daily: None,
                search: SearchState::default(),
                rng: StdRng::from_entropy(),
                generation: 0,
            }),
            in_flight: InFlight::new(),
            snapshot_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Replace the theme-selection RNG, e.g. with a seeded one.
    pub fn with_rng(self, rng: StdRng) -> Self {
        self.lock().rng = rng;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(
        inner: &mut Inner,
        next: SessionState,
        event: &'static str,
    ) -> Result<(), SessionError> {
        if !inner.state.can_transition_to(next) {
            return Err(SessionError::InvalidTransition {
                from: inner.state.as_str(),
                event,
            });
        }
        tracing::debug!(from = %inner.state, to = %next, event, "session transition");
        inner.state = next;
        Ok(())
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub fn identity(&self) -> Option<UserIdentity> {
        self.lock().identity.clone()
    }

    /// Session-level hydration failure, if the last load failed.
    pub fn load_error(&self) -> Option<LoadFailure> {
        self.lock().load_error
    }

    /// Resolve auth (or enter demo mode) and hydrate. Returns the state reached.
    pub async fn start(&self) -> Result<SessionState, SessionError> {
        Self::transition(&mut self.lock(), SessionState::AuthResolving, "start")?;
        tracing::info!(mode = %self.mode, "session starting");

        match self.mode {
            Mode::Demo => {
                let generation = {
                    let mut inner = self.lock();
                    Self::transition(&mut inner, SessionState::DemoMode, "demo_selected")?;
                    Self::transition(&mut inner, SessionState::DataLoading, "load")?;
                    inner.generation
                };
                self.hydrate(DEMO_OWNER, generation).await
            }
            Mode::Remote => match self.auth.current_identity().await {
                Ok(identity) => self.identity_changed(identity).await,
                Err(e) => {
                    let mut inner = self.lock();
                    Self::transition(&mut inner, SessionState::Unauthenticated, "auth_failed")?;
                    Err(e)
                }
            },
        }
    }

    /// React to the auth provider reporting a new identity (or none).
    pub async fn identity_changed(
        &self,
        identity: Option<UserIdentity>,
    ) -> Result<SessionState, SessionError> {
        if self.mode == Mode::Demo {
            return Err(SessionError::InvalidTransition {
                from: self.state().as_str(),
                event: "identity_changed",
            });
        }

        let Some(identity) = identity else {
            let mut inner = self.lock();
            if inner.state != SessionState::Unauthenticated {
                Self::transition(&mut inner, SessionState::Unauthenticated, "signed_out")?;
            }
            inner.generation += 1;
            inner.identity = None;
            inner.store.clear();
            inner.daily = None;
            inner.load_error = None;
            inner.search.active_filter.clear();
            tracing::info!("signed out, session data cleared");
            return Ok(SessionState::Unauthenticated);
        };

        let generation = {
            let mut inner = self.lock();
            if inner.state == SessionState::Ready {
                if inner.identity.as_ref().map(|i| &i.uid) == Some(&identity.uid) {
                    return Ok(SessionState::Ready);
                }
                return Err(SessionError::InvalidTransition {
                    from: inner.state.as_str(),
                    event: "identity_changed",
                });
            }
            Self::transition(&mut inner, SessionState::Authenticated, "signed_in")?;
            inner.identity = Some(identity.clone());
            Self::transition(&mut inner, SessionState::DataLoading, "load")?;
            inner.generation += 1;
            inner.generation
        };

        tracing::info!(uid = %identity.uid, "signed in, loading data");
        self.hydrate(&identity.uid, generation).await
    }

    /// Sign out of remote mode. Clears the store whatever the adapter holds.
    pub async fn sign_out(&self) -> Result<(), SessionError> {
        if self.mode == Mode::Demo {
            return Err(SessionError::SignOutUnsupported);
        }
        self.auth.sign_out().await?;
        self.identity_changed(None).await?;
        Ok(())
    }

    /// Fetch both collections concurrently and move to `Ready` whatever the outcome.
    ///
    /// If the identity changed while the fetch was running, the result belongs to a
    /// session that no longer exists: it is dropped and the current state returned.
    async fn hydrate(&self, owner: &str, generation: u64) -> Result<SessionState, SessionError> {
        let result = tokio::try_join!(
            self.adapter.fetch_thoughts(owner),
            self.adapter.fetch_favorites(owner),
        );

        let mut inner = self.lock();
        if inner.generation != generation {
            tracing::debug!(owner, "identity changed during load, discarding fetched data");
            return Ok(inner.state);
        }
        match result {
            Ok((thoughts, favorites)) => {
                tracing::info!(
                    thoughts = thoughts.len(),
                    favorites = favorites.len(),
                    "session hydrated"
                );
                inner.store.replace_all(thoughts, favorites);
                inner.load_error = None;
            }
            Err(e) if self.mode == Mode::Demo => {
                tracing::warn!(error = %e, "local load failed, starting empty");
                inner.store.clear();
            }
            Err(e) => {
                let failure = LoadFailure::classify(&e);
                tracing::error!(
                    code = %e.code,
                    error = %e.message,
                    ?failure,
                    "failed to load session data"
                );
                inner.store.clear();
                inner.load_error = Some(failure);
            }
        }
        Self::transition(&mut inner, SessionState::Ready, "loaded")?;
        Ok(SessionState::Ready)
    }

    /// Storage owner key, provided the session is ready for mutations.
    fn ready_owner(&self) -> Result<String, SessionError> {
        let inner = self.lock();
        if inner.state != SessionState::Ready {
            return Err(SessionError::NotReady(inner.state.as_str()));
        }
        match self.mode {
            Mode::Demo => Ok(DEMO_OWNER.to_string()),
            Mode::Remote => inner
                .identity
                .as_ref()
                .map(|i| i.uid.clone())
                .ok_or(SessionError::NotReady(inner.state.as_str())),
        }
    }

    /// Best-effort durable write of a change that is already in memory.
    async fn persist(&self, owner: &str, change: Change<'_>) -> WriteOutcome {
        let result = match self.adapter.write_policy() {
            WritePolicy::PerChange => self.adapter.apply_change(owner, change).await,
            WritePolicy::Snapshot => {
                // the snapshot is taken under the write lock so writes land in order
                let _serial = self.snapshot_lock.lock().await;
                let snapshot = self.lock().store.snapshot();
                self.adapter.save_snapshot(owner, &snapshot).await
            }
        };

        match result {
            Ok(()) => WriteOutcome::Persisted,
            Err(e) => {
                tracing::warn!(
                    change = change.kind(),
                    code = %e.code,
                    error = %e.message,
                    "durable write failed, keeping in-memory state"
                );
                WriteOutcome::Diverged(e)
            }
        }
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    pub fn thoughts(&self) -> Vec<Thought> {
        self.lock().store.thoughts().to_vec()
    }

    pub fn favorites(&self) -> Vec<FavoriteSummary> {
        self.lock().store.favorites().to_vec()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.lock().store.snapshot()
    }

    /// Tag aggregate truncated to the configured cloud size.
    pub fn tag_cloud(&self) -> Vec<TagAggregate> {
        let mut cloud = views::aggregate_tags(self.lock().store.thoughts());
        cloud.truncate(self.views.tag_cloud_limit);
        cloud
    }

    // ── Search ───────────────────────────────────────────────────────────────

    /// Commit a search term as the active filter. Blank terms clear it.
    pub fn commit_search(&self, term: &str) -> String {
        let trimmed = term.trim();
        let mut inner = self.lock();
        if trimmed.is_empty() {
            inner.search.active_filter.clear();
            return String::new();
        }
        inner.search.active_filter = trimmed.to_string();
        inner.search.remember(trimmed, self.views.recent_search_limit);
        trimmed.to_string()
    }

    /// Filter by a clicked tag.
    pub fn filter_by_tag(&self, tag: &str) -> String {
        let filter = format!("#{tag}");
        self.lock().search.active_filter = filter.clone();
        filter
    }

    pub fn clear_filter(&self) {
        self.lock().search.active_filter.clear();
    }

    pub fn active_filter(&self) -> String {
        self.lock().search.active_filter.clone()
    }

    /// Committed search terms, most recent first.
    pub fn recent_searches(&self) -> Vec<String> {
        self.lock().search.recent.clone()
    }

    /// Thoughts matching the active filter, in store order.
    pub fn visible_thoughts(&self) -> Vec<Thought> {
        let inner = self.lock();
        views::filter_thoughts(inner.store.thoughts(), &inner.search.active_filter)
            .into_iter()
            .cloned()
            .collect()
    }

    // ── Thoughts ─────────────────────────────────────────────────────────────

    /// Classify `text` and add the result as a new thought.
    pub async fn add_thought(&self, text: &str) -> Result<Committed<Thought>, SessionError> {
        let _token = self.in_flight.acquire(Action::CaptureThought)?;
        self.capture(text).await
    }

    async fn capture(&self, text: &str) -> Result<Committed<Thought>, SessionError> {
        if text.trim().is_empty() {
            return Err(EnrichmentError::EmptyInput.into());
        }
        let owner = self.ready_owner()?;

        let classified = self.gateway.classify(text).await.map_err(|e| {
            tracing::warn!(error = %e, "failed to classify thought");
            e
        })?;
        let title = classified.title.trim();
        if title.is_empty() {
            return Err(EnrichmentError::Unusable("empty title".into()).into());
        }

        // the session may have been torn down while the model was working
        if self.ready_owner()? != owner {
            return Err(SessionError::NotReady(self.state().as_str()));
        }

        let thought = Thought::new(title, text, classified.tags);
        self.lock().store.add_thought(thought.clone());
        let write = self.persist(&owner, Change::ThoughtAdded(&thought)).await;

        tracing::info!(id = %thought.id, tags = thought.tags.len(), "thought captured");
        Ok(Committed {
            value: thought,
            write,
        })
    }

    /// Split pasted text into notes and capture each in order.
    ///
    /// Stops at the first note the model cannot classify; notes captured before it stay.
    pub async fn import_notes<F>(
        &self,
        text: &str,
        mut on_progress: F,
    ) -> Result<ImportReport, SessionError>
    where
        F: FnMut(usize, usize) + Send,
    {
        let _token = self.in_flight.acquire(Action::Import)?;
        let notes = split_notes(text);
        if notes.is_empty() {
            return Err(EnrichmentError::EmptyInput.into());
        }

        let total = notes.len();
        let mut report = ImportReport {
            total,
            imported: Vec::with_capacity(total),
            failed: None,
        };

        for (index, note) in notes.iter().enumerate() {
            match self.capture(note).await {
                Ok(committed) => report.imported.push(committed),
                Err(SessionError::Enrichment(e)) => {
                    tracing::warn!(index, error = %e, "import stopped");
                    report.failed = Some((index, e));
                    break;
                }
                Err(other) => return Err(other),
            }
            on_progress(index + 1, total);
        }

        tracing::info!(imported = report.imported.len(), total, "import finished");
        Ok(report)
    }

    // ── Synthesis ────────────────────────────────────────────────────────────

    /// Answer `query` across every thought, with citations resolved against the
    /// store as it is when the answer arrives.
    pub async fn synthesize(&self, query: &str) -> Result<ResolvedSynthesis, SessionError> {
        let _token = self.in_flight.acquire(Action::Synthesize)?;
        let query = query.trim();
        if query.is_empty() {
            return Err(EnrichmentError::EmptyInput.into());
        }
        self.ready_owner()?;

        let thoughts = self.thoughts();
        let result = self.gateway.synthesize(query, &thoughts).await.map_err(|e| {
            tracing::warn!(error = %e, "synthesis failed");
            e
        })?;

        let inner = self.lock();
        Ok(views::resolve_sources(&result, inner.store.thoughts()))
    }

    // ── Daily summary & favorites ────────────────────────────────────────────

    /// Generate a new thought of the day, avoiding `exclude` when possible.
    pub async fn daily_summary(&self, exclude: Option<&str>) -> Result<DailyView, SessionError> {
        let _token = self.in_flight.acquire(Action::DailySummary)?;
        self.ready_owner()?;

        let (theme, related) = {
            let mut inner = self.lock();
            let aggregates = views::aggregate_tags(inner.store.thoughts());
            let theme = views::select_theme(
                &aggregates,
                exclude,
                self.views.theme_candidates,
                &mut inner.rng,
            );
            let Some(theme) = theme else {
                inner.daily = None;
                return Ok(DailyView::Unavailable);
            };
            let related = views::thoughts_for_theme(inner.store.thoughts(), &theme);
            (theme, related)
        };

        tracing::debug!(%theme, related = related.len(), "generating daily summary");
        let generated = self
            .gateway
            .daily_summary(&theme, &related)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "daily summary failed");
                e
            })?;

        let summary = generated.summary.trim();
        if summary.is_empty() {
            return Err(EnrichmentError::Unusable("empty summary".into()).into());
        }

        let daily = DailySummary {
            theme,
            summary: summary.to_string(),
        };
        self.lock().daily = Some(daily.clone());
        Ok(DailyView::Ready(daily))
    }

    /// New summary on a different theme than the one currently shown.
    pub async fn refresh_daily_summary(&self) -> Result<DailyView, SessionError> {
        let exclude = self.current_daily().map(|d| d.theme);
        self.daily_summary(exclude.as_deref()).await
    }

    pub fn current_daily(&self) -> Option<DailySummary> {
        self.lock().daily.clone()
    }

    pub fn is_favorited(&self, daily: &DailySummary) -> bool {
        self.lock().store.favorites().iter().any(|f| f.matches(daily))
    }

    pub fn is_current_daily_favorited(&self) -> bool {
        self.current_daily()
            .map(|d| self.is_favorited(&d))
            .unwrap_or(false)
    }

    /// Keep `daily` as a favorite. `None` when the same pair is already kept.
    pub async fn favorite(
        &self,
        daily: &DailySummary,
    ) -> Result<Option<Committed<FavoriteSummary>>, SessionError> {
        let owner = self.ready_owner()?;

        let favorite = {
            let mut inner = self.lock();
            if inner.store.favorites().iter().any(|f| f.matches(daily)) {
                tracing::debug!(theme = %daily.theme, "summary already favorited");
                return Ok(None);
            }
            let favorite = FavoriteSummary::from_daily(daily);
            inner.store.add_favorite(favorite.clone());
            favorite
        };

        let write = self.persist(&owner, Change::FavoriteAdded(&favorite)).await;
        Ok(Some(Committed {
            value: favorite,
            write,
        }))
    }

    /// Remove a favorite by id. Unknown ids are a no-op in memory; the delete is
    /// still sent so a stale durable copy goes away too.
    pub async fn unfavorite(&self, id: &str) -> Result<Committed<bool>, SessionError> {
        let owner = self.ready_owner()?;
        let removed = self.lock().store.remove_favorite(id);
        let write = self.persist(&owner, Change::FavoriteRemoved(id)).await;
        Ok(Committed {
            value: removed,
            write,
        })
    }
}
