pub mod record;
pub mod summaries;
pub mod thoughts;
pub mod transfer;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use thoughtweave::config::ThoughtsConfig;
use thoughtweave::enrichment::{create_gateway, EnrichmentGateway};
use thoughtweave::error::EnrichmentError;
use thoughtweave::persistence::local::LocalSlotStore;
use thoughtweave::persistence::remote::RemoteDocumentStore;
use thoughtweave::persistence::PersistenceAdapter;
use thoughtweave::session::auth::ConfiguredAuth;
use thoughtweave::session::state::{Mode, SessionState};
use thoughtweave::session::{Session, WriteOutcome};
use thoughtweave::thought::types::{ClassifiedThought, DailySummary, SynthesisResult, Thought};

/// Stand-in gateway when no model is configured, so read-only commands still work.
struct Unconfigured {
    reason: String,
}

impl Unconfigured {
    fn fail<T>(&self) -> Result<T, EnrichmentError> {
        Err(EnrichmentError::Request(self.reason.clone()))
    }
}

#[async_trait]
impl EnrichmentGateway for Unconfigured {
    async fn classify(&self, _text: &str) -> Result<ClassifiedThought, EnrichmentError> {
        self.fail()
    }

    async fn synthesize(
        &self,
        _query: &str,
        _thoughts: &[Thought],
    ) -> Result<SynthesisResult, EnrichmentError> {
        self.fail()
    }

    async fn daily_summary(
        &self,
        _theme: &str,
        _thoughts: &[Thought],
    ) -> Result<DailySummary, EnrichmentError> {
        self.fail()
    }
}

/// Pick the mode, wire up storage, auth and the model, then hydrate.
pub async fn open_session(config: &ThoughtsConfig) -> Result<Session> {
    let mode = Mode::select(&config.session, Mode::detect_embedded());

    let adapter: Arc<dyn PersistenceAdapter> = match mode {
        Mode::Remote => Arc::new(RemoteDocumentStore::new(config.resolved_db_path())),
        Mode::Demo => Arc::new(LocalSlotStore::new(config.resolved_local_dir())),
    };

    let gateway: Arc<dyn EnrichmentGateway> = match create_gateway(&config.enrichment) {
        Ok(gateway) => Arc::from(gateway),
        Err(e) => {
            tracing::debug!(error = %e, "enrichment unavailable");
            Arc::new(Unconfigured {
                reason: format!("{e:#}"),
            })
        }
    };

    let auth = Arc::new(ConfiguredAuth::from_config(&config.session));
    let session = Session::new(mode, adapter, auth, gateway, config.views.clone());

    if session.start().await? == SessionState::Unauthenticated {
        anyhow::bail!(
            "not signed in: set [session].user_id or THOUGHTWEAVE_USER, or use --mode demo"
        );
    }
    if let Some(failure) = session.load_error() {
        eprintln!("Warning: {failure}");
    }

    Ok(session)
}

/// Tell the user when a change did not make it to durable storage.
pub fn report_write(outcome: &WriteOutcome) {
    if let WriteOutcome::Diverged(e) = outcome {
        eprintln!("Warning: change was not saved ({e})");
    }
}

/// Single-line preview, cut at a char boundary.
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > max_chars {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{cut}...")
    } else {
        flat
    }
}
