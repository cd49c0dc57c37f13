//! HTTP-backed implementations of the provider capabilities.
//!
//! All endpoints share one JSON envelope (`{data, error}`) and one retry
//! policy: bounded attempts with equal-jitter backoff on 429/5xx, a hard
//! per-request timeout, and classified errors.

mod chat;
mod library;
mod rerank;
mod translate;
mod web;

pub use chat::RemoteChatModel;
pub use library::RemoteLibrarySearch;
pub use rerank::RemoteRerank;
pub use translate::RemoteTranslate;
pub use web::RemoteWebSearch;

use std::env;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::providers::ProviderError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 1000;

/// API key wrapper that cannot leak through Debug output.
#[derive(Clone)]
struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Debug, serde::Deserialize)]
struct ApiErrorBody {
    code: Option<u16>,
    message: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    error: Option<ApiErrorBody>,
}

/// Shared transport for all remote provider endpoints.
#[derive(Clone, Debug)]
pub struct RemoteClient {
    http: Client,
    api_key: ApiKey,
    base_url: String,
}

impl RemoteClient {
    pub fn new(http: Client, api_key: &str, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey(api_key.trim().to_string()),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Reads `PROSPECTOR_API_KEY` and optional `PROSPECTOR_API_URL`.
    pub fn from_env(http: Client, default_base_url: &str) -> Result<Self, ProviderError> {
        let api_key = env::var("PROSPECTOR_API_KEY").map_err(|_| ProviderError::ApiKeyNotSet)?;
        if api_key.trim().is_empty() {
            return Err(ProviderError::ApiKeyNotSet);
        }
        let base_url = env::var("PROSPECTOR_API_URL")
            .ok()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| default_base_url.to_string());
        Ok(Self::new(http, &api_key, &base_url))
    }

    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ProviderError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let mut last_err = None;
        for attempt in 0..MAX_ATTEMPTS {
            match self.post_once(path, body).await {
                Ok(value) => return Ok(value),
                Err(e) if is_retriable(&e) => {
                    last_err = Some(e);
                    if attempt + 1 < MAX_ATTEMPTS {
                        let delay_ms = jittered_backoff(attempt);
                        debug!(
                            attempt = attempt + 1,
                            delay_ms, path, "retrying after transient error"
                        );
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or(ProviderError::RateLimited))
    }

    async fn post_once<B, T>(&self, path: &str, body: &B) -> Result<T, ProviderError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);

        debug_assert!(
            url.starts_with("https://") || cfg!(test),
            "API key must only be sent over HTTPS"
        );

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key.0))
            .header("User-Agent", crate::USER_AGENT)
            .json(body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!(path, "remote API rate limited");
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if let Ok(envelope) = serde_json::from_str::<Envelope<serde_json::Value>>(&text)
                && let Some(err) = envelope.error
            {
                let classified = classify_api_error(err);
                warn!(path, error = %classified, "remote API error");
                return Err(classified);
            }
            let snippet = if text.len() > 200 { &text[..200] } else { &text };
            warn!(path, status = %status, "remote API error (no structured body)");
            return Err(ProviderError::Api {
                code: status.as_u16(),
                message: format!("HTTP {status}: {snippet}"),
            });
        }

        let envelope: Envelope<T> = response.json().await?;
        if let Some(err) = envelope.error {
            let classified = classify_api_error(err);
            warn!(path, error = %classified, "remote API error in 200 response");
            return Err(classified);
        }
        envelope
            .data
            .ok_or_else(|| ProviderError::InvalidResponse("missing data field".to_string()))
    }
}

fn is_retriable(e: &ProviderError) -> bool {
    matches!(
        e,
        ProviderError::RateLimited
            | ProviderError::Api {
                code: 500..=599,
                ..
            }
    )
}

/// Equal jitter backoff: base/2 + rand(0, base/2).
fn jittered_backoff(attempt: u32) -> u64 {
    let base = INITIAL_BACKOFF_MS * 2u64.pow(attempt);
    let half = base / 2;
    half + fastrand::u64(..half.max(1))
}

fn classify_api_error(err: ApiErrorBody) -> ProviderError {
    let message = err.message.unwrap_or_else(|| "Unknown error".to_string());
    match err.code {
        Some(429) => ProviderError::RateLimited,
        Some(code) => ProviderError::Api { code, message },
        None => ProviderError::Api {
            code: 0,
            message: format!("Unknown error (no status code): {message}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_429_as_rate_limited() {
        let err = ApiErrorBody {
            code: Some(429),
            message: Some("Resource exhausted".into()),
        };
        assert!(matches!(
            classify_api_error(err),
            ProviderError::RateLimited
        ));
    }

    #[test]
    fn classify_other_codes_as_api_error() {
        let err = ApiErrorBody {
            code: Some(500),
            message: Some("Internal server error".into()),
        };
        match classify_api_error(err) {
            ProviderError::Api { code, message } => {
                assert_eq!(code, 500);
                assert_eq!(message, "Internal server error");
            }
            other => panic!("expected Api error, got: {other:?}"),
        }
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey("super-secret".into());
        assert_eq!(format!("{key:?}"), "[REDACTED]");
    }

    #[test]
    fn retriable_covers_rate_limit_and_5xx() {
        assert!(is_retriable(&ProviderError::RateLimited));
        assert!(is_retriable(&ProviderError::Api {
            code: 503,
            message: String::new()
        }));
        assert!(!is_retriable(&ProviderError::Api {
            code: 400,
            message: String::new()
        }));
    }
}
