//! Chat completions (`/v1/chat/completions`).

use serde_json::Value;

use super::resource::Resource;
use crate::client::{ApiClient, ClientError, Postable};
use crate::model::{ChatCompletion, ChatCompletionChunk, Message, Params};

const ROUTE: &str = "/v1/chat/completions";

#[derive(Debug)]
pub struct ChatCompletions<T = ApiClient> {
    resource: Resource<T>,
}

impl<T> ChatCompletions<T> {
    pub(crate) fn new(resource: Resource<T>) -> Self {
        Self { resource }
    }
}

impl<T: Postable> ChatCompletions<T> {
    /// Create a chat completion over `messages`, in order.
    pub async fn create(
        &self,
        model: &str,
        messages: &[Message],
        params: Params,
    ) -> Result<ChatCompletion, ClientError> {
        let payload = payload(model, messages, params)?;
        self.resource
            .create::<ChatCompletion, ChatCompletionChunk>(ROUTE, payload)
            .await
    }

    /// Stream a chat completion; `on_chunk` receives every
    /// [`ChatCompletionChunk`] in arrival order.
    pub async fn create_streaming<F>(
        &self,
        model: &str,
        messages: &[Message],
        params: Params,
        on_chunk: F,
    ) -> Result<(), ClientError>
    where
        F: FnMut(ChatCompletionChunk) + Send,
    {
        let payload = payload(model, messages, params)?;
        self.resource
            .create_streaming::<ChatCompletionChunk, F>(ROUTE, payload, on_chunk)
            .await
    }
}

fn payload(model: &str, messages: &[Message], mut params: Params) -> Result<Params, ClientError> {
    params.insert("model".to_string(), Value::from(model));
    params.insert("messages".to_string(), serde_json::to_value(messages)?);
    Ok(params)
}
