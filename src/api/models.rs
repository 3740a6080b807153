//! Model listing (`/v1/models`).

use super::resource::Resource;
use crate::client::{ApiClient, ClientError, Gettable};
use crate::model::{Model, ModelList};

#[derive(Debug)]
pub struct Models<T = ApiClient> {
    resource: Resource<T>,
}

impl<T> Models<T> {
    pub(crate) fn new(resource: Resource<T>) -> Self {
        Self { resource }
    }
}

impl<T: Gettable> Models<T> {
    pub async fn list(&self) -> Result<ModelList, ClientError> {
        self.resource.get("/v1/models").await
    }

    pub async fn fetch(&self, model_id: &str) -> Result<Model, ClientError> {
        self.resource.get(&format!("/v1/models/{}", model_id)).await
    }
}
