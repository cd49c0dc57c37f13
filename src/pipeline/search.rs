use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::providers::{
    LibraryHit, LibrarySearchMode, LibrarySearchOptions, LibrarySearchProvider,
    LibrarySearchRequest, ProviderError, UserContext, WebSearchProvider, WebSearchRequest,
};
use crate::source::{EntityType, QueryMap, SearchOrigin, Source, SourceMetadata};

/// Tasks per library provider batch. Distinct from the result-translation
/// batch size in `PipelineConfig`.
const LIBRARY_CALL_BATCH: usize = 100;

const LIBRARY_DOMAINS: &[&str] = &["resource", "document"];

/// One scheduled provider call, derived from the query map.
#[derive(Debug, Clone)]
struct SearchTask {
    locale: String,
    query: String,
    original_query: String,
}

/// Flattens the query map into `(locale, query)` tasks in map order, pairing
/// each translated query with its rewritten original by index.
fn flatten_tasks(map: &QueryMap, rewritten: &[String]) -> Vec<SearchTask> {
    let mut tasks = Vec::new();
    for (locale, queries) in map.iter() {
        for (index, query) in queries.iter().enumerate() {
            let original_query = rewritten
                .get(index)
                .cloned()
                .unwrap_or_else(|| query.clone());
            tasks.push(SearchTask {
                locale: locale.to_string(),
                query: query.clone(),
                original_query,
            });
        }
    }
    tasks
}

/// Fans the query map out over the web search provider.
///
/// Tasks run under an order-preserving pool bounded to `concurrency` in-flight
/// calls; each branch returns its own slice, so results always reflect
/// submission order. A failed task degrades to an empty branch.
pub async fn web_search(
    provider: &dyn WebSearchProvider,
    user: &UserContext,
    map: &QueryMap,
    rewritten: &[String],
    limit: usize,
    concurrency: usize,
) -> Vec<Vec<Source>> {
    let tasks = flatten_tasks(map, rewritten);
    debug!(tasks = tasks.len(), concurrency, "starting web search fan-out");

    stream::iter(tasks.into_iter().map(|task| {
        let request = WebSearchRequest {
            query: task.query.clone(),
            limit,
            locale: task.locale.clone(),
        };
        async move {
            match provider.web_search(user, request).await {
                Ok(hits) => hits
                    .into_iter()
                    .map(|hit| web_hit_to_source(hit, &task))
                    .collect(),
                Err(e) => {
                    warn!(
                        locale = %task.locale,
                        error = %e,
                        "web search task failed; dropping its branch"
                    );
                    Vec::new()
                }
            }
        }
    }))
    .buffered(concurrency.max(1))
    .collect()
    .await
}

fn web_hit_to_source(hit: crate::providers::WebHit, task: &SearchTask) -> Source {
    let translated = task.query != task.original_query;
    Source {
        url: hit.url,
        title: hit.name,
        page_content: hit.snippet,
        metadata: SourceMetadata {
            original_locale: task.locale.clone(),
            original_query: task.original_query.clone(),
            translated_query: translated.then(|| task.query.clone()),
            is_translated: false,
            source: SearchOrigin::Web,
            entity_id: None,
            entity_type: None,
            translated_display_locale: None,
        },
    }
}

/// Fans the query map out over the internal library.
///
/// Tasks are chunked into provider batches; batches run under a bounded
/// order-preserving pool, and each batch issues its task calls in parallel
/// internally. A failed batch contributes zero results. After all batches
/// resolve, duplicate `(entity_type, entity_id)` pairs across batches and
/// locales are collapsed to their first occurrence.
pub async fn library_search(
    provider: &dyn LibrarySearchProvider,
    user: &UserContext,
    map: &QueryMap,
    rewritten: &[String],
    limit: usize,
    concurrency: usize,
    options: LibrarySearchOptions,
) -> Vec<Vec<Source>> {
    let tasks = flatten_tasks(map, rewritten);
    let batches: Vec<Vec<SearchTask>> = tasks
        .chunks(LIBRARY_CALL_BATCH)
        .map(|chunk| chunk.to_vec())
        .collect();
    debug!(
        batches = batches.len(),
        concurrency, "starting library search fan-out"
    );

    let branches: Vec<Vec<Source>> = stream::iter(batches.into_iter().map(|batch| async move {
        match run_library_batch(provider, user, batch, limit, options).await {
            Ok(sources) => sources,
            Err(e) => {
                warn!(error = %e, "library search batch failed; dropping its branch");
                Vec::new()
            }
        }
    }))
    .buffered(concurrency.max(1))
    .collect()
    .await;

    dedup_entities(branches)
}

struct LibraryGroup {
    hit: LibraryHit,
    fragments: Vec<String>,
    task: SearchTask,
}

/// Runs every task of one batch in parallel, then groups raw hits by
/// `(domain, id)` so fragments of the same entity assemble into one source.
async fn run_library_batch(
    provider: &dyn LibrarySearchProvider,
    user: &UserContext,
    batch: Vec<SearchTask>,
    limit: usize,
    options: LibrarySearchOptions,
) -> Result<Vec<Source>, ProviderError> {
    let calls = batch.iter().map(|task| {
        provider.search(
            user,
            LibrarySearchRequest {
                query: task.query.clone(),
                limit,
                mode: LibrarySearchMode::Hybrid,
                domains: LIBRARY_DOMAINS.iter().map(|d| d.to_string()).collect(),
                entities: None,
            },
            options,
        )
    });
    let outcomes = join_all(calls).await;

    let mut order: Vec<(String, String)> = Vec::new();
    let mut groups: HashMap<(String, String), LibraryGroup> = HashMap::new();
    for (task, outcome) in batch.iter().zip(outcomes) {
        for hit in outcome? {
            let key = (hit.domain.clone(), hit.id.clone());
            match groups.entry(key) {
                Entry::Occupied(mut entry) => {
                    entry.get_mut().fragments.extend(hit.snippets);
                }
                Entry::Vacant(entry) => {
                    order.push(entry.key().clone());
                    let fragments = hit.snippets.clone();
                    entry.insert(LibraryGroup {
                        hit,
                        fragments,
                        task: task.clone(),
                    });
                }
            }
        }
    }

    Ok(order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .map(group_to_source)
        .collect())
}

fn group_to_source(group: LibraryGroup) -> Source {
    let entity_type = match group.hit.domain.as_str() {
        "document" => EntityType::Document,
        _ => EntityType::Resource,
    };
    let translated = group.task.query != group.task.original_query;
    Source {
        url: group.hit.url,
        title: group.hit.title,
        page_content: group.fragments.join("\n\n"),
        metadata: SourceMetadata {
            original_locale: group.task.locale.clone(),
            original_query: group.task.original_query.clone(),
            translated_query: translated.then(|| group.task.query.clone()),
            is_translated: false,
            source: SearchOrigin::Library,
            entity_id: Some(group.hit.id),
            entity_type: Some(entity_type),
            translated_display_locale: None,
        },
    }
}

/// Collapses duplicate `(entity_type, entity_id)` pairs across branches to
/// their first occurrence, preserving branch structure. Runs strictly before
/// the later title-based dedup stage.
fn dedup_entities(branches: Vec<Vec<Source>>) -> Vec<Vec<Source>> {
    let mut seen: HashSet<(EntityType, String)> = HashSet::new();
    branches
        .into_iter()
        .map(|branch| {
            branch
                .into_iter()
                .filter(|source| {
                    match (
                        source.metadata.entity_type,
                        source.metadata.entity_id.as_ref(),
                    ) {
                        (Some(entity_type), Some(id)) => seen.insert((entity_type, id.clone())),
                        _ => true,
                    }
                })
                .collect()
        })
        .collect()
}
