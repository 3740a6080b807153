//! Embeddings (`/v1/embeddings`).

use serde_json::Value;

use super::resource::Resource;
use crate::client::{ApiClient, ClientError, Postable};
use crate::model::{Embedding, Params};

#[derive(Debug)]
pub struct Embeddings<T = ApiClient> {
    resource: Resource<T>,
}

impl<T> Embeddings<T> {
    pub(crate) fn new(resource: Resource<T>) -> Self {
        Self { resource }
    }
}

impl<T: Postable> Embeddings<T> {
    /// Embed `input`, a string or an array of strings.
    pub async fn create(
        &self,
        model: &str,
        input: impl Into<Value>,
        mut params: Params,
    ) -> Result<Embedding, ClientError> {
        params.insert("model".to_string(), model.into());
        params.insert("input".to_string(), input.into());
        self.resource.post("/v1/embeddings", &params).await
    }
}
