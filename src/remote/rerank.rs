use async_trait::async_trait;
use serde::Serialize;

use super::RemoteClient;
use crate::providers::{ProviderError, RerankProvider};
use crate::source::Source;

#[derive(Clone, Debug)]
pub struct RemoteRerank {
    client: RemoteClient,
}

impl RemoteRerank {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RerankBody<'a> {
    query: &'a str,
    results: &'a [Source],
    top_n: usize,
    relevance_threshold: f32,
}

#[async_trait]
impl RerankProvider for RemoteRerank {
    async fn rerank(
        &self,
        query: &str,
        sources: &[Source],
        top_n: usize,
        relevance_threshold: f32,
    ) -> Result<Vec<Source>, ProviderError> {
        self.client
            .post_json(
                "/v1/rerank",
                &RerankBody {
                    query,
                    results: sources,
                    top_n,
                    relevance_threshold,
                },
            )
            .await
    }
}
