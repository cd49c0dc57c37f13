//! Stage sequencing for one retrieval run.
//!
//! Stages run strictly sequentially; concurrency lives inside each stage.
//! Nearly every failure is absorbed at its stage boundary, so almost every
//! run completes with at least partial results. Only a missing user before
//! the search stage or a rejected result-translation join aborts the run,
//! and even those are converted into an empty result set rather than an
//! error: [`SearchPipeline::run`] never fails.

pub mod merge;
pub mod rerank;
pub mod rewrite;
pub mod search;
pub mod translate;

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, error};

use crate::config::PipelineConfig;
use crate::events::{EventSink, StageEvent};
use crate::locale;
use crate::providers::{
    ChatModel, LibrarySearchOptions, LibrarySearchProvider, RerankProvider, TranslateProvider,
    UserContext, WebSearchProvider,
};
use crate::source::Source;
use crate::timing::{StepSummary, TimeTracker};

/// Stage keys, as emitted to the event sink.
pub mod stage {
    pub const REWRITE: &str = "rewriteQuery";
    pub const LOCALE_SELECT: &str = "selectLocales";
    pub const TRANSLATE_QUERY: &str = "translateQuery";
    pub const SEARCH: &str = "search";
    pub const MERGE: &str = "mergeResults";
    pub const TRANSLATE_RESULTS: &str = "translateResults";
    pub const RERANK: &str = "rerank";
    pub const DEDUP: &str = "dedupResults";
}

/// Which retrieval backend a run fans out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBackend {
    Web,
    Library,
}

/// Immutable per-run context.
pub struct RunContext {
    pub query: String,
    pub user: Option<UserContext>,
    pub sink: Arc<dyn EventSink>,
}

#[derive(Debug, Default)]
pub struct SearchOutput {
    pub sources: Vec<Source>,
    pub summary: StepSummary,
}

#[derive(Debug, thiserror::Error)]
enum PipelineError {
    #[error("no authenticated user; search requires a user context")]
    MissingUser,

    #[error(transparent)]
    TranslateResults(#[from] translate::TranslateResultsError),
}

/// Orchestrates the multi-locale retrieval pipeline over injected
/// capability providers.
pub struct SearchPipeline {
    backend: SearchBackend,
    chat: Arc<dyn ChatModel>,
    web: Arc<dyn WebSearchProvider>,
    library: Arc<dyn LibrarySearchProvider>,
    reranker: Arc<dyn RerankProvider>,
    translator: Arc<dyn TranslateProvider>,
}

impl SearchPipeline {
    pub fn new(
        backend: SearchBackend,
        chat: Arc<dyn ChatModel>,
        web: Arc<dyn WebSearchProvider>,
        library: Arc<dyn LibrarySearchProvider>,
        reranker: Arc<dyn RerankProvider>,
        translator: Arc<dyn TranslateProvider>,
    ) -> Self {
        Self {
            backend,
            chat,
            web,
            library,
            reranker,
            translator,
        }
    }

    /// Runs the full pipeline. Degraded results (untranslated, unreranked,
    /// or empty) are preferable to an error: this never fails.
    pub async fn run(&self, config: &PipelineConfig, ctx: &RunContext) -> SearchOutput {
        let mut tracker = TimeTracker::new();
        match self.run_inner(config, ctx, &mut tracker).await {
            Ok(sources) => SearchOutput {
                sources,
                summary: tracker.summary(),
            },
            Err(e) => {
                error!(error = %e, "search pipeline failed; returning empty result set");
                SearchOutput {
                    sources: Vec::new(),
                    summary: tracker.summary(),
                }
            }
        }
    }

    async fn run_inner(
        &self,
        config: &PipelineConfig,
        ctx: &RunContext,
        tracker: &mut TimeTracker,
    ) -> Result<Vec<Source>, PipelineError> {
        tracker.start_step(stage::REWRITE);
        let rewritten = rewrite::rewrite_query(
            self.chat.as_ref(),
            &ctx.query,
            config.rewritten_queries.as_deref(),
            config.enable_query_rewrite,
        )
        .await;
        emit(ctx, tracker, stage::REWRITE, json!({ "queryCount": rewritten.len() }));

        tracker.start_step(stage::LOCALE_SELECT);
        let display_locale = resolve_display_locale(config, ctx);
        let locales = select_locales(config, &display_locale);
        emit(
            ctx,
            tracker,
            stage::LOCALE_SELECT,
            json!({ "locales": locales, "displayLocale": display_locale }),
        );

        tracker.start_step(stage::TRANSLATE_QUERY);
        let query_map = translate::build_query_map(
            self.translator.as_ref(),
            &rewritten,
            &locales,
            &display_locale,
            config.enable_translate_query,
        )
        .await;
        emit(
            ctx,
            tracker,
            stage::TRANSLATE_QUERY,
            json!({ "localeCount": query_map.len() }),
        );

        let user = ctx.user.as_ref().ok_or(PipelineError::MissingUser)?;

        tracker.start_step(stage::SEARCH);
        let branches = match self.backend {
            SearchBackend::Web => {
                search::web_search(
                    self.web.as_ref(),
                    user,
                    &query_map,
                    &rewritten,
                    config.search_limit,
                    config.search_concurrency_limit,
                )
                .await
            }
            SearchBackend::Library => {
                search::library_search(
                    self.library.as_ref(),
                    user,
                    &query_map,
                    &rewritten,
                    config.search_limit,
                    config.search_concurrency_limit,
                    LibrarySearchOptions {
                        enable_reranker: config.enable_rerank,
                        whole_space: config.enable_search_whole_space,
                    },
                )
                .await
            }
        };
        emit(
            ctx,
            tracker,
            stage::SEARCH,
            json!({ "branchCount": branches.len() }),
        );

        tracker.start_step(stage::MERGE);
        let mut sources = merge::merge(branches);
        emit(
            ctx,
            tracker,
            stage::MERGE,
            json!({ "resultCount": sources.len() }),
        );

        if config.enable_translate_result {
            tracker.start_step(stage::TRANSLATE_RESULTS);
            sources = translate::translate_results(
                self.translator.as_ref(),
                sources,
                &display_locale,
                config.translate_concurrency_limit,
                config.batch_size,
            )
            .await?;
            emit(
                ctx,
                tracker,
                stage::TRANSLATE_RESULTS,
                json!({ "resultCount": sources.len() }),
            );
        }

        if config.enable_rerank {
            tracker.start_step(stage::RERANK);
            let top_n = config.rerank_limit.unwrap_or(sources.len());
            sources = rerank::apply_rerank(
                self.reranker.as_ref(),
                &ctx.query,
                sources,
                top_n,
                config.rerank_relevance_threshold,
            )
            .await;
            emit(
                ctx,
                tracker,
                stage::RERANK,
                json!({ "resultCount": sources.len() }),
            );
        }

        tracker.start_step(stage::DEDUP);
        let sources = merge::dedup_by_title(sources);
        emit(
            ctx,
            tracker,
            stage::DEDUP,
            json!({ "resultCount": sources.len() }),
        );

        Ok(sources)
    }
}

fn emit(ctx: &RunContext, tracker: &mut TimeTracker, stage: &'static str, detail: serde_json::Value) {
    let duration_ms = tracker.end_step(stage).unwrap_or(0);
    debug!(stage, duration_ms, "stage complete");
    ctx.sink.emit(StageEvent {
        stage,
        duration_ms,
        detail,
    });
}

fn resolve_display_locale(config: &PipelineConfig, ctx: &RunContext) -> String {
    if config.result_display_locale != locale::AUTO {
        return config.result_display_locale.clone();
    }
    ctx.user
        .as_ref()
        .and_then(|u| u.preferred_locale.clone())
        .unwrap_or_else(|| "en".to_string())
}

/// A caller-pinned display locale or deep search drives locale selection;
/// otherwise the configured locale list is used as-is.
fn select_locales(config: &PipelineConfig, display_locale: &str) -> Vec<String> {
    let explicit_display = config.result_display_locale != locale::AUTO;
    if !explicit_display && !config.enable_deep_search && !config.search_locale_list.is_empty() {
        return locale::sanitize_list(&config.search_locale_list);
    }
    let breadth = if config.enable_deep_search { 3 } else { 2 };
    locale::select_search_locales(display_locale, breadth)
}
