//! Ollama HTTP clients for embeddings (`/api/embeddings`) and completions
//! (`/api/generate`). Any non-2xx response is a hard failure; nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use ragapi_core::config::Settings;
use ragapi_core::traits::{Embedder, Generator};
use ragapi_core::types::GenerationOptions;
use ragapi_core::{sanitize, Error, Result};

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    options: &'a GenerationOptions,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

async fn ensure_success(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Provider(format!("{what} returned {status}: {body}")))
}

pub struct OllamaEmbedder {
    client: Client,
    url: String,
    model: String,
    id: String,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build embedding HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: endpoint(base_url, "/api/embeddings"),
            model: model.to_string(),
            id: format!("ollama:{model}"),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(&settings.embedding.base_url, &settings.embedding.model, settings.embedding_timeout())
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model_id(&self) -> &str { &self.id }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let prompt = sanitize(text);
        let response = self
            .client
            .post(&self.url)
            .json(&EmbeddingRequest { model: &self.model, prompt: &prompt })
            .send()
            .await
            .map_err(|e| Error::Provider(format!("embedding request failed: {e}")))?;
        let response = ensure_success(response, "embedding provider").await?;
        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("malformed embedding response: {e}")))?;
        if body.embedding.is_empty() {
            return Err(Error::Provider(format!("model '{}' returned an empty embedding", self.model)));
        }
        debug!(model = %self.model, dim = body.embedding.len(), chars = prompt.chars().count(), "embedded text");
        Ok(body.embedding)
    }
}

pub struct OllamaGenerator {
    client: Client,
    url: String,
    model: String,
}

impl OllamaGenerator {
    /// Generation waits as long as the model needs, so this client has no timeout.
    pub fn new(base_url: &str, model: &str) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build generation HTTP client: {e}")))?;
        Ok(Self { client, url: endpoint(base_url, "/api/generate"), model: model.to_string() })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(settings.generation_base_url(), &settings.generation.model)
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        let response = self
            .client
            .post(&self.url)
            .json(&GenerateRequest { model: &self.model, prompt, options, stream: false })
            .send()
            .await
            .map_err(|e| Error::Provider(format!("generation request failed: {e}")))?;
        let response = ensure_success(response, "generation provider").await?;
        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("malformed generation response: {e}")))?;
        Ok(body.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        assert_eq!(endpoint("http://ollama:11434/", "/api/generate"), "http://ollama:11434/api/generate");
        assert_eq!(endpoint("http://ollama:11434", "/api/embeddings"), "http://ollama:11434/api/embeddings");
    }

    #[test]
    fn generate_request_shape() {
        let options = GenerationOptions { num_predict: 64, num_gpu: 0 };
        let body = serde_json::to_value(GenerateRequest { model: "m", prompt: "p", options: &options, stream: false }).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"model": "m", "prompt": "p", "options": {"num_predict": 64, "num_gpu": 0}, "stream": false})
        );
    }
}
