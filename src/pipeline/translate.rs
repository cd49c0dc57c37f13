use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, warn};

use crate::locale;
use crate::providers::{ProviderError, TranslateProvider};
use crate::source::{QueryMap, Source};

/// Translates each rewritten query into each target locale.
///
/// A locale matching the display locale (after normalization) passes through
/// without any provider call. One failed locale falls back to the
/// untranslated queries without affecting its siblings.
///
/// The loop is deliberately sequential: at most three locales are ever
/// requested, and per-locale fallback stays trivially isolated.
pub async fn build_query_map(
    translator: &dyn TranslateProvider,
    queries: &[String],
    target_locales: &[String],
    display_locale: &str,
    enabled: bool,
) -> QueryMap {
    let mut map = QueryMap::default();
    let display = locale::normalize(display_locale);
    for target in target_locales {
        if !enabled || locale::normalize(target) == display {
            map.insert(target.clone(), queries.to_vec());
            continue;
        }
        match translator
            .batch_translate(queries, target, display_locale)
            .await
        {
            Ok(translated) if translated.len() == queries.len() => {
                debug!(locale = %target, "query translation complete");
                map.insert(target.clone(), translated);
            }
            Ok(translated) => {
                warn!(
                    locale = %target,
                    sent = queries.len(),
                    received = translated.len(),
                    "query translation arity mismatch; keeping untranslated queries"
                );
                map.insert(target.clone(), queries.to_vec());
            }
            Err(e) => {
                warn!(locale = %target, error = %e, "query translation failed; keeping untranslated queries");
                map.insert(target.clone(), queries.to_vec());
            }
        }
    }
    map
}

#[derive(Debug, thiserror::Error)]
pub enum TranslateResultsError {
    #[error("translation batch failed: {0}")]
    Batch(#[from] ProviderError),

    #[error("translation batch arity mismatch: sent {sent}, received {received}")]
    ArityMismatch { sent: usize, received: usize },
}

/// Translates merged results' title and content into the display locale.
///
/// Sources are split into fixed-size batches run under an order-preserving
/// bounded pool. The join is all-or-nothing: one rejected batch fails the
/// whole stage and the caller decides what to keep. A response whose length
/// differs from the request is a batch failure, not a silent misalignment.
pub async fn translate_results(
    translator: &dyn TranslateProvider,
    sources: Vec<Source>,
    display_locale: &str,
    concurrency_limit: usize,
    batch_size: usize,
) -> Result<Vec<Source>, TranslateResultsError> {
    if sources.is_empty() {
        return Ok(sources);
    }
    let batch_size = batch_size.max(1);
    let batches: Vec<Vec<Source>> = sources
        .chunks(batch_size)
        .map(|chunk| chunk.to_vec())
        .collect();

    let translated: Vec<Vec<Source>> = stream::iter(
        batches
            .into_iter()
            .map(|batch| translate_batch(translator, batch, display_locale)),
    )
    .buffered(concurrency_limit.max(1))
    .try_collect()
    .await?;

    Ok(translated.into_iter().flatten().collect())
}

/// Two texts per source (title, then content), reassembled by index after the
/// arity check.
async fn translate_batch(
    translator: &dyn TranslateProvider,
    mut batch: Vec<Source>,
    display_locale: &str,
) -> Result<Vec<Source>, TranslateResultsError> {
    let mut texts = Vec::with_capacity(batch.len() * 2);
    for source in &batch {
        texts.push(source.title.clone());
        texts.push(source.page_content.clone());
    }

    let translated = translator
        .batch_translate(&texts, display_locale, locale::AUTO)
        .await?;
    if translated.len() != texts.len() {
        return Err(TranslateResultsError::ArityMismatch {
            sent: texts.len(),
            received: translated.len(),
        });
    }

    let mut parts = translated.into_iter();
    for source in &mut batch {
        if let (Some(title), Some(content)) = (parts.next(), parts.next()) {
            source.title = title;
            source.page_content = content;
        }
        source.metadata.is_translated = true;
        source.metadata.translated_display_locale = Some(display_locale.to_string());
    }
    Ok(batch)
}
