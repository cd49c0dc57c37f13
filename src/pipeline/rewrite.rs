use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::providers::ChatModel;

const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct RewriteOutput {
    #[allow(dead_code)]
    analysis: String,
    queries: RewriteQueries,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct RewriteQueries {
    rewritten_queries: Vec<String>,
}

fn rewrite_prompt(query: &str) -> String {
    format!(
        "Break the user query into at most three focused search queries. \
         Keep each query self-contained and specific. Respond with JSON only.\n\n\
         User query: {query}"
    )
}

/// Turns one raw query into focused sub-queries.
///
/// A non-empty caller override short-circuits the model call entirely. Schema
/// validation failures are retried up to three attempts; any other failure, or
/// exhausted retries, falls back to `[query]`. Never propagates an error.
pub async fn rewrite_query(
    chat: &dyn ChatModel,
    query: &str,
    override_queries: Option<&[String]>,
    enabled: bool,
) -> Vec<String> {
    if let Some(queries) = override_queries
        && !queries.is_empty()
    {
        debug!(count = queries.len(), "using caller-supplied rewritten queries");
        return queries.to_vec();
    }
    if !enabled {
        return vec![query.to_string()];
    }

    let schema = match serde_json::to_value(schema_for!(RewriteOutput)) {
        Ok(schema) => schema,
        Err(e) => {
            warn!(error = %e, "rewrite schema serialization failed; using original query");
            return vec![query.to_string()];
        }
    };

    for attempt in 0..MAX_ATTEMPTS {
        match chat.structured(&rewrite_prompt(query), &schema).await {
            Ok(value) => match serde_json::from_value::<RewriteOutput>(value) {
                Ok(output) if !output.queries.rewritten_queries.is_empty() => {
                    debug!(
                        count = output.queries.rewritten_queries.len(),
                        "query rewrite complete"
                    );
                    return output.queries.rewritten_queries;
                }
                Ok(_) => warn!(attempt, "rewrite returned an empty query list"),
                Err(e) => {
                    warn!(attempt, error = %e, "rewrite output failed schema validation")
                }
            },
            Err(e) => {
                // only validation failures are retried
                warn!(error = %e, "rewrite call failed; using original query");
                return vec![query.to_string()];
            }
        }
    }
    warn!("rewrite retries exhausted; using original query");
    vec![query.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct MockChat {
        responses: Mutex<VecDeque<Result<serde_json::Value, ProviderError>>>,
        calls: Mutex<u32>,
    }

    impl MockChat {
        fn with(responses: Vec<Result<serde_json::Value, ProviderError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(0),
            }
        }

        fn call_count(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ChatModel for MockChat {
        async fn structured(
            &self,
            _prompt: &str,
            _schema: &serde_json::Value,
        ) -> Result<serde_json::Value, ProviderError> {
            *self.calls.lock().unwrap() += 1;
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ProviderError::RateLimited))
        }
    }

    fn valid_output(queries: &[&str]) -> serde_json::Value {
        serde_json::json!({
            "analysis": "split into aspects",
            "queries": {"rewrittenQueries": queries}
        })
    }

    #[tokio::test]
    async fn override_short_circuits_the_model() {
        let chat = MockChat::with(vec![]);
        let out = rewrite_query(
            &chat,
            "original",
            Some(&["a".to_string(), "b".to_string()]),
            true,
        )
        .await;
        assert_eq!(out, vec!["a", "b"]);
        assert_eq!(chat.call_count(), 0);
    }

    #[tokio::test]
    async fn disabled_without_override_returns_original() {
        let chat = MockChat::with(vec![]);
        let out = rewrite_query(&chat, "original", None, false).await;
        assert_eq!(out, vec!["original"]);
        assert_eq!(chat.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_override_does_not_short_circuit() {
        let chat = MockChat::with(vec![Ok(valid_output(&["x"]))]);
        let out = rewrite_query(&chat, "original", Some(&[]), true).await;
        assert_eq!(out, vec!["x"]);
        assert_eq!(chat.call_count(), 1);
    }

    #[tokio::test]
    async fn valid_output_is_used() {
        let chat = MockChat::with(vec![Ok(valid_output(&["rust traits", "rust dyn"]))]);
        let out = rewrite_query(&chat, "rust polymorphism", None, true).await;
        assert_eq!(out, vec!["rust traits", "rust dyn"]);
    }

    #[tokio::test]
    async fn invalid_output_retries_then_falls_back() {
        let chat = MockChat::with(vec![
            Ok(serde_json::json!({"nonsense": true})),
            Ok(serde_json::json!({"queries": {}})),
            Ok(serde_json::json!([1, 2, 3])),
        ]);
        let out = rewrite_query(&chat, "original", None, true).await;
        assert_eq!(out, vec!["original"]);
        assert_eq!(chat.call_count(), 3);
    }

    #[tokio::test]
    async fn validation_recovers_on_later_attempt() {
        let chat = MockChat::with(vec![
            Ok(serde_json::json!({"broken": 1})),
            Ok(valid_output(&["fixed"])),
        ]);
        let out = rewrite_query(&chat, "original", None, true).await;
        assert_eq!(out, vec!["fixed"]);
        assert_eq!(chat.call_count(), 2);
    }

    #[tokio::test]
    async fn call_failure_falls_back_without_retry() {
        let chat = MockChat::with(vec![Err(ProviderError::RateLimited)]);
        let out = rewrite_query(&chat, "original", None, true).await;
        assert_eq!(out, vec!["original"]);
        assert_eq!(chat.call_count(), 1);
    }
}
