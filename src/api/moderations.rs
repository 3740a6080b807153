//! Moderation (`/v1/moderations`).

use serde_json::Value;

use super::resource::Resource;
use crate::client::{ApiClient, ClientError, Postable};
use crate::model::{Moderation, Params};

#[derive(Debug)]
pub struct Moderations<T = ApiClient> {
    resource: Resource<T>,
}

impl<T> Moderations<T> {
    pub(crate) fn new(resource: Resource<T>) -> Self {
        Self { resource }
    }
}

impl<T: Postable> Moderations<T> {
    pub async fn create(
        &self,
        input: impl Into<Value>,
        model: &str,
    ) -> Result<Moderation, ClientError> {
        let mut params = Params::new();
        params.insert("input".to_string(), input.into());
        params.insert("model".to_string(), model.into());
        self.resource.post("/v1/moderations", &params).await
    }
}
