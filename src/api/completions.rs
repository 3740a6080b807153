//! Text completions (`/v1/completions`).

use super::resource::Resource;
use crate::client::{ApiClient, ClientError, Postable};
use crate::model::{Completion, Params};

const ROUTE: &str = "/v1/completions";

#[derive(Debug)]
pub struct Completions<T = ApiClient> {
    resource: Resource<T>,
}

impl<T> Completions<T> {
    pub(crate) fn new(resource: Resource<T>) -> Self {
        Self { resource }
    }
}

impl<T: Postable> Completions<T> {
    /// Create a completion for `model`. Extra request fields go in `params`.
    pub async fn create(&self, model: &str, mut params: Params) -> Result<Completion, ClientError> {
        params.insert("model".to_string(), model.into());
        self.resource
            .create::<Completion, Completion>(ROUTE, params)
            .await
    }

    /// Stream a completion; each frame is decoded as a [`Completion`] and
    /// passed to `on_chunk`.
    pub async fn create_streaming<F>(
        &self,
        model: &str,
        mut params: Params,
        on_chunk: F,
    ) -> Result<(), ClientError>
    where
        F: FnMut(Completion) + Send,
    {
        params.insert("model".to_string(), model.into());
        self.resource
            .create_streaming::<Completion, F>(ROUTE, params, on_chunk)
            .await
    }
}
