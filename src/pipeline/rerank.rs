use tracing::{debug, warn};

use crate::providers::RerankProvider;
use crate::source::Source;

/// Reorders sources by relevance to the original (non-rewritten) query.
/// A failed rerank call keeps the incoming order; never propagates.
pub async fn apply_rerank(
    provider: &dyn RerankProvider,
    query: &str,
    sources: Vec<Source>,
    top_n: usize,
    relevance_threshold: f32,
) -> Vec<Source> {
    if sources.is_empty() {
        return sources;
    }
    match provider
        .rerank(query, &sources, top_n, relevance_threshold)
        .await
    {
        Ok(reranked) => {
            debug!(
                before = sources.len(),
                after = reranked.len(),
                "rerank complete"
            );
            reranked
        }
        Err(e) => {
            warn!(error = %e, "rerank failed; keeping pre-rerank order");
            sources
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderError;
    use crate::source::{SearchOrigin, SourceMetadata};
    use async_trait::async_trait;

    fn source(title: &str) -> Source {
        Source {
            url: format!("https://{title}.com"),
            title: title.into(),
            page_content: String::new(),
            metadata: SourceMetadata {
                original_locale: "en".into(),
                original_query: "q".into(),
                translated_query: None,
                is_translated: false,
                source: SearchOrigin::Web,
                entity_id: None,
                entity_type: None,
                translated_display_locale: None,
            },
        }
    }

    /// Reverses and truncates to top_n, or fails outright.
    struct MockRerank {
        fail: bool,
    }

    #[async_trait]
    impl RerankProvider for MockRerank {
        async fn rerank(
            &self,
            _query: &str,
            sources: &[Source],
            top_n: usize,
            _relevance_threshold: f32,
        ) -> Result<Vec<Source>, ProviderError> {
            if self.fail {
                return Err(ProviderError::RateLimited);
            }
            let mut reversed: Vec<Source> = sources.iter().rev().cloned().collect();
            reversed.truncate(top_n);
            Ok(reversed)
        }
    }

    #[tokio::test]
    async fn success_replaces_order_and_truncates() {
        let provider = MockRerank { fail: false };
        let out = apply_rerank(
            &provider,
            "query",
            vec![source("a"), source("b"), source("c")],
            2,
            0.1,
        )
        .await;
        let titles: Vec<&str> = out.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "b"]);
    }

    #[tokio::test]
    async fn failure_keeps_pre_rerank_order() {
        let provider = MockRerank { fail: true };
        let out = apply_rerank(
            &provider,
            "query",
            vec![source("a"), source("b"), source("c")],
            2,
            0.1,
        )
        .await;
        let titles: Vec<&str> = out.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn empty_input_skips_provider() {
        struct Panicking;
        #[async_trait]
        impl RerankProvider for Panicking {
            async fn rerank(
                &self,
                _query: &str,
                _sources: &[Source],
                _top_n: usize,
                _relevance_threshold: f32,
            ) -> Result<Vec<Source>, ProviderError> {
                panic!("rerank must not be called for empty input");
            }
        }
        let out = apply_rerank(&Panicking, "query", Vec::new(), 5, 0.1).await;
        assert!(out.is_empty());
    }
}
