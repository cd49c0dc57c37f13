use async_trait::async_trait;
use serde::Serialize;

use super::RemoteClient;
use crate::providers::{ProviderError, TranslateProvider};

#[derive(Clone, Debug)]
pub struct RemoteTranslate {
    client: RemoteClient,
}

impl RemoteTranslate {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TranslateBody<'a> {
    texts: &'a [String],
    target_locale: &'a str,
    source_locale: &'a str,
}

#[async_trait]
impl TranslateProvider for RemoteTranslate {
    async fn batch_translate(
        &self,
        texts: &[String],
        target_locale: &str,
        source_locale: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let translated: Vec<String> = self
            .client
            .post_json(
                "/v1/translate/batch",
                &TranslateBody {
                    texts,
                    target_locale,
                    source_locale,
                },
            )
            .await?;
        if translated.len() != texts.len() {
            return Err(ProviderError::InvalidResponse(format!(
                "translate arity mismatch: sent {}, received {}",
                texts.len(),
                translated.len()
            )));
        }
        Ok(translated)
    }
}
