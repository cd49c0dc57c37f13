use serde::{Deserialize, Serialize};

/// Configuration for one pipeline run. Cloned at run start and treated as
/// immutable for the run's duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// Per-query result cap passed to the search provider.
    pub search_limit: usize,
    /// Locales to fan out across when no display locale drives selection.
    pub search_locale_list: Vec<String>,
    /// Locale results are presented in; `"auto"` follows the user preference.
    pub result_display_locale: String,
    pub enable_rerank: bool,
    pub enable_translate_query: bool,
    pub enable_translate_result: bool,
    pub rerank_relevance_threshold: f32,
    pub rerank_limit: Option<usize>,
    pub translate_concurrency_limit: usize,
    pub search_concurrency_limit: usize,
    /// Result-translation batch size (distinct from the library call batch).
    pub batch_size: usize,
    /// Widens locale selection from two to three locales.
    pub enable_deep_search: bool,
    pub enable_query_rewrite: bool,
    /// Library backend only: search the whole space instead of scoped entities.
    pub enable_search_whole_space: bool,
    /// Caller-supplied rewrite override; skips the rewrite model entirely.
    pub rewritten_queries: Option<Vec<String>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            search_limit: 10,
            search_locale_list: vec!["en".to_string()],
            result_display_locale: crate::locale::AUTO.to_string(),
            enable_rerank: false,
            enable_translate_query: false,
            enable_translate_result: false,
            rerank_relevance_threshold: 0.1,
            rerank_limit: None,
            translate_concurrency_limit: 10,
            search_concurrency_limit: 3,
            batch_size: 5,
            enable_deep_search: false,
            enable_query_rewrite: true,
            enable_search_whole_space: false,
            rewritten_queries: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_contract() {
        let c = PipelineConfig::default();
        assert_eq!(c.search_limit, 10);
        assert_eq!(c.search_locale_list, vec!["en"]);
        assert_eq!(c.result_display_locale, "auto");
        assert_eq!(c.rerank_relevance_threshold, 0.1);
        assert_eq!(c.translate_concurrency_limit, 10);
        assert_eq!(c.search_concurrency_limit, 3);
        assert_eq!(c.batch_size, 5);
        assert!(c.enable_query_rewrite);
        assert!(!c.enable_rerank);
        assert!(c.rewritten_queries.is_none());
    }

    #[test]
    fn deserializes_partial_camel_case() {
        let c: PipelineConfig = serde_json::from_str(
            r#"{"searchLimit": 5, "enableRerank": true, "rerankLimit": 8}"#,
        )
        .unwrap();
        assert_eq!(c.search_limit, 5);
        assert!(c.enable_rerank);
        assert_eq!(c.rerank_limit, Some(8));
        // untouched fields keep their defaults
        assert_eq!(c.batch_size, 5);
        assert!(c.enable_query_rewrite);
    }
}
