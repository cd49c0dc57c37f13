use async_trait::async_trait;
use serde::Serialize;

use super::RemoteClient;
use crate::providers::{ProviderError, UserContext, WebHit, WebSearchProvider, WebSearchRequest};

#[derive(Clone, Debug)]
pub struct RemoteWebSearch {
    client: RemoteClient,
}

impl RemoteWebSearch {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WebSearchBody<'a> {
    uid: &'a str,
    query: &'a str,
    limit: usize,
    locale: &'a str,
}

#[async_trait]
impl WebSearchProvider for RemoteWebSearch {
    async fn web_search(
        &self,
        user: &UserContext,
        request: WebSearchRequest,
    ) -> Result<Vec<WebHit>, ProviderError> {
        self.client
            .post_json(
                "/v1/search/web",
                &WebSearchBody {
                    uid: &user.uid,
                    query: &request.query,
                    limit: request.limit,
                    locale: &request.locale,
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
    async fn web_search_decodes_hits() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/search/web"))
            .and(body_partial_json(serde_json::json!({
                "query": "rust async",
                "locale": "en",
                "limit": 10
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"url": "https://a.com", "name": "A", "snippet": "alpha"},
                    {"url": "https://b.com", "name": "B", "snippet": "beta"}
                ]
            })))
            .mount(&server)
            .await;

        let provider = RemoteWebSearch::new(RemoteClient::new(
            reqwest::Client::new(),
            "test-key",
            &server.uri(),
        ));
        let user = UserContext {
            uid: "u1".into(),
            preferred_locale: None,
        };
        let hits = provider
            .web_search(
                &user,
                WebSearchRequest {
                    query: "rust async".into(),
                    limit: 10,
                    locale: "en".into(),
                },
            )
            .await
            .unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].name, "A");
        assert_eq!(hits[1].snippet, "beta");
    }
}
