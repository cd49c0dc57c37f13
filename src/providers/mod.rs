//! Capability interfaces the pipeline is built against.
//!
//! The orchestrator takes these as trait objects so that production wiring
//! (the `remote` clients) and test doubles plug in interchangeably.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::source::Source;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("API rate limit exceeded")]
    RateLimited,

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("API key not set")]
    ApiKeyNotSet,
}

/// Authenticated caller identity. Search providers scope results per user;
/// a run without one cannot reach the search stage.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub uid: String,
    pub preferred_locale: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSearchRequest {
    pub query: String,
    pub limit: usize,
    pub locale: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebHit {
    pub url: String,
    pub name: String,
    pub snippet: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibrarySearchMode {
    Keyword,
    Vector,
    Hybrid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibrarySearchRequest {
    pub query: String,
    pub limit: usize,
    pub mode: LibrarySearchMode,
    pub domains: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<String>>,
}

/// One raw library hit; `snippets` are the matching fragments of the entity.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryHit {
    pub id: String,
    pub domain: String,
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub snippets: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LibrarySearchOptions {
    pub enable_reranker: bool,
    pub whole_space: bool,
}

/// Chat model invoked with a JSON schema constraining its output.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn structured(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError>;
}

#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    async fn web_search(
        &self,
        user: &UserContext,
        request: WebSearchRequest,
    ) -> Result<Vec<WebHit>, ProviderError>;
}

#[async_trait]
pub trait LibrarySearchProvider: Send + Sync {
    async fn search(
        &self,
        user: &UserContext,
        request: LibrarySearchRequest,
        options: LibrarySearchOptions,
    ) -> Result<Vec<LibraryHit>, ProviderError>;
}

#[async_trait]
pub trait RerankProvider: Send + Sync {
    /// Reorders (and possibly truncates) `sources` by relevance to `query`.
    async fn rerank(
        &self,
        query: &str,
        sources: &[Source],
        top_n: usize,
        relevance_threshold: f32,
    ) -> Result<Vec<Source>, ProviderError>;
}

#[async_trait]
pub trait TranslateProvider: Send + Sync {
    /// Order-preserving: must return exactly one entry per input text.
    /// Callers verify the arity and treat a mismatch as a failed call.
    async fn batch_translate(
        &self,
        texts: &[String],
        target_locale: &str,
        source_locale: &str,
    ) -> Result<Vec<String>, ProviderError>;
}
