//! Fine-tunes (`/v1/fine-tunes`).

use super::resource::Resource;
use crate::client::{ApiClient, ClientError, Gettable, Postable};
use crate::model::{FineTune, FineTuneEventList, FineTuneList, Params};

#[derive(Debug)]
pub struct FineTunes<T = ApiClient> {
    resource: Resource<T>,
}

impl<T> FineTunes<T> {
    pub(crate) fn new(resource: Resource<T>) -> Self {
        Self { resource }
    }
}

impl<T: Gettable> FineTunes<T> {
    pub async fn list(&self) -> Result<FineTuneList, ClientError> {
        self.resource.get("/v1/fine-tunes").await
    }

    pub async fn fetch(&self, fine_tune_id: &str) -> Result<FineTune, ClientError> {
        self.resource
            .get(&format!("/v1/fine-tunes/{}", fine_tune_id))
            .await
    }

    pub async fn list_events(&self, fine_tune_id: &str) -> Result<FineTuneEventList, ClientError> {
        self.resource
            .get(&format!("/v1/fine-tunes/{}/events", fine_tune_id))
            .await
    }
}

impl<T: Postable> FineTunes<T> {
    /// Start a fine-tune on an uploaded training file.
    pub async fn create(
        &self,
        training_file: &str,
        mut params: Params,
    ) -> Result<FineTune, ClientError> {
        params.insert("training_file".to_string(), training_file.into());
        self.resource.post("/v1/fine-tunes", &params).await
    }

    pub async fn cancel(&self, fine_tune_id: &str) -> Result<FineTune, ClientError> {
        self.resource
            .post(&format!("/v1/fine-tunes/{}/cancel", fine_tune_id), &Params::new())
            .await
    }
}
