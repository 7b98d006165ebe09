use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{prompt, EnrichmentGateway};
use crate::config::EnrichmentConfig;
use crate::error::EnrichmentError;
use crate::thought::types::{ClassifiedThought, DailySummary, SynthesisResult, Thought};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Gemini `generateContent` with JSON-schema constrained output.
pub struct GeminiGateway {
    client: Client,
    api_base_url: String,
    api_key: String,
    model: String,
}

impl GeminiGateway {
    pub fn new(config: &EnrichmentConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_base_url: config.api_base_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    fn api_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base_url.trim_end_matches('/'),
            self.model
        )
    }

    /// Send one prompt and parse the JSON text of the first candidate as `T`.
    async fn generate<T: DeserializeOwned>(
        &self,
        prompt: String,
        schema: serde_json::Value,
    ) -> Result<T, EnrichmentError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
            },
        };

        let response = self
            .client
            .post(self.api_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EnrichmentError::Request("request timed out".into())
                } else if e.is_connect() {
                    EnrichmentError::Request(format!("connection failed: {e}"))
                } else {
                    EnrichmentError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "no response body".to_string());
            return Err(EnrichmentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| EnrichmentError::Unusable(format!("invalid response envelope: {e}")))?;

        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.iter().find_map(|p| p.text.as_deref()))
            .ok_or_else(|| EnrichmentError::Unusable("response has no text".into()))?;

        parse_json_payload(text)
    }
}

/// Parse the model's JSON text, tolerating surrounding whitespace.
pub(crate) fn parse_json_payload<T: DeserializeOwned>(text: &str) -> Result<T, EnrichmentError> {
    serde_json::from_str(text.trim())
        .map_err(|e| EnrichmentError::Unusable(format!("invalid JSON payload: {e}")))
}

#[async_trait]
impl EnrichmentGateway for GeminiGateway {
    async fn classify(&self, text: &str) -> Result<ClassifiedThought, EnrichmentError> {
        let classified: ClassifiedThought = self
            .generate(prompt::classify_prompt(text), prompt::classify_schema())
            .await?;
        if classified.title.trim().is_empty() {
            return Err(EnrichmentError::Unusable("empty title".into()));
        }
        tracing::debug!(
            title = %classified.title,
            tags = classified.tags.len(),
            "thought classified"
        );
        Ok(classified)
    }

    async fn synthesize(
        &self,
        query: &str,
        thoughts: &[Thought],
    ) -> Result<SynthesisResult, EnrichmentError> {
        self.generate(
            prompt::synthesis_prompt(query, thoughts),
            prompt::synthesis_schema(),
        )
        .await
    }

    async fn daily_summary(
        &self,
        theme: &str,
        thoughts: &[Thought],
    ) -> Result<DailySummary, EnrichmentError> {
        self.generate(
            prompt::daily_summary_prompt(theme, thoughts),
            prompt::daily_summary_schema(),
        )
        .await
    }
}
