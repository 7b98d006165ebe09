//! Model-backed enrichment.
//!
//! [`EnrichmentGateway`] covers the three single-shot requests the session makes:
//! classify raw text, synthesize an answer across thoughts, and write a daily
//! reflection for one theme. [`transcription`] holds the separate streaming channel.

pub mod gemini;
pub mod prompt;
pub mod transcription;

use anyhow::Result;
use async_trait::async_trait;

use crate::error::EnrichmentError;
use crate::thought::types::{ClassifiedThought, DailySummary, SynthesisResult, Thought};

#[async_trait]
pub trait EnrichmentGateway: Send + Sync {
    /// Derive a title and tags for raw text.
    async fn classify(&self, text: &str) -> Result<ClassifiedThought, EnrichmentError>;

    /// Answer `query` from `thoughts`, citing the ids used.
    async fn synthesize(
        &self,
        query: &str,
        thoughts: &[Thought],
    ) -> Result<SynthesisResult, EnrichmentError>;

    /// Reflect on the thoughts carrying `theme`.
    async fn daily_summary(
        &self,
        theme: &str,
        thoughts: &[Thought],
    ) -> Result<DailySummary, EnrichmentError>;
}

/// Create a gateway from config.
///
/// Currently only `"gemini"` is supported. Fails if no API key is configured.
pub fn create_gateway(
    config: &crate::config::EnrichmentConfig,
) -> Result<Box<dyn EnrichmentGateway>> {
    match config.provider.as_str() {
        "gemini" => {
            anyhow::ensure!(
                !config.api_key.is_empty(),
                "no API key configured: set GEMINI_API_KEY or [enrichment].api_key"
            );
            let gateway = gemini::GeminiGateway::new(config)?;
            Ok(Box::new(gateway))
        }
        other => anyhow::bail!("unknown enrichment provider: {other}. Supported: gemini"),
    }
}
