use async_trait::async_trait;
use serde::Serialize;

use super::RemoteClient;
use crate::providers::{
    LibraryHit, LibrarySearchMode, LibrarySearchOptions, LibrarySearchProvider,
    LibrarySearchRequest, ProviderError, UserContext,
};

#[derive(Clone, Debug)]
pub struct RemoteLibrarySearch {
    client: RemoteClient,
}

impl RemoteLibrarySearch {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LibrarySearchBody<'a> {
    uid: &'a str,
    query: &'a str,
    limit: usize,
    mode: LibrarySearchMode,
    domains: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    entities: Option<&'a [String]>,
    enable_reranker: bool,
    whole_space: bool,
}

#[async_trait]
impl LibrarySearchProvider for RemoteLibrarySearch {
    async fn search(
        &self,
        user: &UserContext,
        request: LibrarySearchRequest,
        options: LibrarySearchOptions,
    ) -> Result<Vec<LibraryHit>, ProviderError> {
        self.client
            .post_json(
                "/v1/search/library",
                &LibrarySearchBody {
                    uid: &user.uid,
                    query: &request.query,
                    limit: request.limit,
                    mode: request.mode,
                    domains: &request.domains,
                    entities: request.entities.as_deref(),
                    enable_reranker: options.enable_reranker,
                    whole_space: options.whole_space,
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn library_search_decodes_hits_with_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/search/library"))
            .and(body_partial_json(serde_json::json!({
                "mode": "hybrid",
                "domains": ["resource", "document"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {
                        "id": "doc-1",
                        "domain": "document",
                        "title": "Internal doc",
                        "snippets": ["fragment one", "fragment two"]
                    }
                ]
            })))
            .mount(&server)
            .await;

        let provider = RemoteLibrarySearch::new(RemoteClient::new(
            reqwest::Client::new(),
            "test-key",
            &server.uri(),
        ));
        let user = UserContext {
            uid: "u1".into(),
            preferred_locale: None,
        };
        let hits = provider
            .search(
                &user,
                LibrarySearchRequest {
                    query: "quarterly report".into(),
                    limit: 10,
                    mode: LibrarySearchMode::Hybrid,
                    domains: vec!["resource".into(), "document".into()],
                    entities: None,
                },
                LibrarySearchOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "doc-1");
        // url is absent for internal documents and defaults to empty
        assert!(hits[0].url.is_empty());
        assert_eq!(hits[0].snippets.len(), 2);
    }
}
