//! Instruction edits (`/v1/edits`).

use super::resource::Resource;
use crate::client::{ApiClient, ClientError, Postable};
use crate::model::{Edit, Params};

#[derive(Debug)]
pub struct Edits<T = ApiClient> {
    resource: Resource<T>,
}

impl<T> Edits<T> {
    pub(crate) fn new(resource: Resource<T>) -> Self {
        Self { resource }
    }
}

impl<T: Postable> Edits<T> {
    pub async fn create(
        &self,
        model: &str,
        instruction: &str,
        mut params: Params,
    ) -> Result<Edit, ClientError> {
        params.insert("model".to_string(), model.into());
        params.insert("instruction".to_string(), instruction.into());
        self.resource.post("/v1/edits", &params).await
    }
}
