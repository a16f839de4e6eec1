//! Embedding clients behind the core [`EmbeddingProvider`] seam.
//!
//! Only `gwc search` embeds anything. Two providers exist:
//!
//! | `[embedding].provider` | Type | Behaviour |
//! |------------------------|------|-----------|
//! | `"disabled"` | [`DisabledProvider`] | every call fails with a config hint |
//! | `"ollama"` | [`OllamaProvider`] | `POST {url}/api/embed`, batched |
//!
//! Ollama requests are retried on HTTP 429, 5xx and transport errors with
//! exponential backoff (1s doubling, capped at 32s). Other 4xx responses
//! fail at once.
//!
//! ```rust,no_run
//! # use groundwater_corpus::config::EmbeddingConfig;
//! # use groundwater_corpus::embedding::create_provider;
//! let provider = create_provider(&EmbeddingConfig::default()).unwrap();
//! assert_eq!(provider.model_name(), "disabled");
//! ```

use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use groundwater_core::embedding::EmbeddingProvider;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EmbeddingConfig;

/// Stand-in used while `[embedding]` is not configured.
pub struct DisabledProvider;

#[async_trait]
impl EmbeddingProvider for DisabledProvider {
    fn model_name(&self) -> &str {
        "disabled"
    }

    fn dims(&self) -> usize {
        0
    }

    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        bail!("Embedding provider is disabled. Set [embedding].provider = \"ollama\" in the config.")
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// What one HTTP attempt came back with.
enum Attempt {
    Done(Vec<Vec<f32>>),
    Retry(anyhow::Error),
}

/// Client for a local Ollama server (`ollama pull nomic-embed-text`).
pub struct OllamaProvider {
    model: String,
    dims: usize,
    endpoint: String,
    batch_size: usize,
    max_retries: u32,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let Some(model) = config.model.clone() else {
            bail!("embedding.model required for Ollama provider");
        };
        let Some(dims) = config.dims else {
            bail!("embedding.dims required for Ollama provider");
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            model,
            dims,
            endpoint: format!("{}/api/embed", config.url.trim_end_matches('/')),
            batch_size: config.batch_size.max(1),
            max_retries: config.max_retries,
            client,
        })
    }

    async fn attempt(&self, texts: &[String]) -> Result<Attempt> {
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };
        let response = match self.client.post(&self.endpoint).json(&request).send().await {
            Ok(response) => response,
            Err(e) => {
                return Ok(Attempt::Retry(anyhow!(
                    "Ollama connection error (is Ollama running at {}?): {}",
                    self.endpoint,
                    e
                )))
            }
        };

        let status = response.status();
        if status.is_success() {
            let parsed: EmbedResponse = response
                .json()
                .await
                .map_err(|e| anyhow!("Invalid Ollama response: {}", e))?;
            return Ok(Attempt::Done(parsed.embeddings));
        }

        let detail = response.text().await.unwrap_or_default();
        let err = anyhow!("Ollama API error {}: {}", status, detail);
        if status.as_u16() == 429 || status.is_server_error() {
            Ok(Attempt::Retry(err))
        } else {
            Err(err)
        }
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut attempt = 0;
        loop {
            match self.attempt(texts).await? {
                Attempt::Done(vectors) => return Ok(vectors),
                Attempt::Retry(err) if attempt >= self.max_retries => return Err(err),
                Attempt::Retry(err) => {
                    attempt += 1;
                    let delay = backoff(attempt);
                    debug!(attempt, delay_secs = delay.as_secs(), error = %err, "retrying embedding request");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn check_batch(&self, inputs: usize, vectors: &[Vec<f32>]) -> Result<()> {
        if vectors.len() != inputs {
            bail!("Ollama returned {} embeddings for {} inputs", vectors.len(), inputs);
        }
        if let Some(v) = vectors.iter().find(|v| v.len() != self.dims) {
            bail!(
                "Ollama returned {}-dimensional embeddings; embedding.dims is {}",
                v.len(),
                self.dims
            );
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let vectors = self.embed_batch(batch).await?;
            self.check_batch(batch.len(), &vectors)?;
            out.extend(vectors);
        }
        Ok(out)
    }
}

/// Delay before retry `attempt` (1-based): 1s, 2s, 4s, ... capped at 32s.
fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1 << (attempt.saturating_sub(1)).min(5))
}

/// Embed a single query text.
pub async fn embed_query(provider: &dyn EmbeddingProvider, text: &str) -> Result<Vec<f32>> {
    provider
        .embed(&[text.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Empty embedding response"))
}

/// Build the provider named by `[embedding].provider`.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledProvider)),
        "ollama" => Ok(Box::new(OllamaProvider::new(config)?)),
        other => bail!("Unknown embedding provider: {}", other),
    }
}
