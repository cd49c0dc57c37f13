use serde::{Deserialize, Serialize};

/// Which retrieval backend produced a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchOrigin {
    Web,
    Library,
}

/// Kind of internal entity a library source points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Resource,
    Document,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMetadata {
    /// Locale the hit was retrieved in.
    pub original_locale: String,
    /// The rewritten query this hit answered, before translation.
    pub original_query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_query: Option<String>,
    /// Set by result translation once title/content are rewritten.
    pub is_translated: bool,
    pub source: SearchOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<EntityType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_display_locale: Option<String>,
}

/// A normalized retrieval hit. Internal documents carry an empty `url`;
/// their `entity_id`/`entity_type` pair stands in for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub url: String,
    pub title: String,
    pub page_content: String,
    pub metadata: SourceMetadata,
}

impl Source {
    /// True when the source can be referenced: either by URL or by entity identity.
    pub fn has_identity(&self) -> bool {
        !self.url.is_empty()
            || (self.metadata.entity_id.is_some() && self.metadata.entity_type.is_some())
    }
}

/// Ordered locale -> queries mapping. Insertion order is preserved so that
/// downstream merge and dedup see a deterministic branch order.
#[derive(Debug, Clone, Default)]
pub struct QueryMap {
    entries: Vec<(String, Vec<String>)>,
}

impl QueryMap {
    pub fn insert(&mut self, locale: impl Into<String>, queries: Vec<String>) {
        self.entries.push((locale.into(), queries));
    }

    pub fn get(&self, locale: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(l, _)| l == locale)
            .map(|(_, q)| q.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(l, q)| (l.as_str(), q.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
