use async_trait::async_trait;
use serde::Serialize;

use super::RemoteClient;
use crate::providers::{ChatModel, ProviderError};

#[derive(Clone, Debug)]
pub struct RemoteChatModel {
    client: RemoteClient,
}

impl RemoteChatModel {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StructuredBody<'a> {
    prompt: &'a str,
    schema: &'a serde_json::Value,
}

#[async_trait]
impl ChatModel for RemoteChatModel {
    async fn structured(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError> {
        self.client
            .post_json("/v1/chat/structured", &StructuredBody { prompt, schema })
            .await
    }
}
