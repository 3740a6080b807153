//! Shared behavior of every resource.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::client::{ClientError, FormPostable, Gettable, Postable};
use crate::form::FormData;
use crate::model::Params;

/// Decode a raw body or frame into its typed shape.
pub fn decode<R: DeserializeOwned>(raw: &str) -> Result<R, ClientError> {
    Ok(serde_json::from_str(raw)?)
}

/// Handle on the transport shared by all resources of one [`Api`](super::Api).
#[derive(Debug)]
pub struct Resource<T> {
    transport: Arc<T>,
}

impl<T> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T> Resource<T> {
    pub(crate) fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: Gettable> Resource<T> {
    pub(crate) async fn get<R: DeserializeOwned>(&self, route: &str) -> Result<R, ClientError> {
        decode(&self.transport.get(route).await?)
    }

    pub(crate) async fn delete<R: DeserializeOwned>(&self, route: &str) -> Result<R, ClientError> {
        decode(&self.transport.delete(route).await?)
    }
}

impl<T: FormPostable> Resource<T> {
    pub(crate) async fn post_form<R: DeserializeOwned>(
        &self,
        route: &str,
        form: FormData,
    ) -> Result<R, ClientError> {
        decode(&self.transport.post_form_multipart(route, form).await?)
    }
}

impl<T: Postable> Resource<T> {
    pub(crate) async fn post<R: DeserializeOwned>(
        &self,
        route: &str,
        payload: &Params,
    ) -> Result<R, ClientError> {
        decode(&self.transport.post(route, payload).await?)
    }

    /// Create on `route`, either returning the decoded response or
    /// streaming decoded chunks into `on_chunk`.
    ///
    /// `stream` and the presence of `on_chunk` must agree. Streaming returns
    /// `Ok(None)` once the stream is exhausted; nothing is aggregated.
    pub(crate) async fn create_or_stream<R, C, F>(
        &self,
        route: &str,
        mut payload: Params,
        stream: bool,
        on_chunk: Option<F>,
    ) -> Result<Option<R>, ClientError>
    where
        R: DeserializeOwned,
        C: DeserializeOwned,
        F: FnMut(C) + Send,
    {
        payload.insert("stream".to_string(), Value::Bool(stream));

        match (stream, on_chunk) {
            (true, None) => Err(ClientError::Precondition(
                "streaming responses require a chunk callback".to_string(),
            )),
            (false, Some(_)) => Err(ClientError::Precondition(
                "non-streaming responses do not support a chunk callback".to_string(),
            )),
            (true, Some(mut on_chunk)) => {
                let mut on_frame = |frame: &str| -> Result<(), ClientError> {
                    on_chunk(decode::<C>(frame)?);
                    Ok(())
                };
                self.transport
                    .post_streaming(route, &payload, &mut on_frame)
                    .await?;
                Ok(None)
            }
            (false, None) => self.post(route, &payload).await.map(Some),
        }
    }
}

impl<T: Postable> Resource<T> {
    /// Non-streaming create. A `stream: true` left in `payload` is a
    /// precondition failure since there is no callback to receive chunks.
    pub(crate) async fn create<R, C>(&self, route: &str, mut payload: Params) -> Result<R, ClientError>
    where
        R: DeserializeOwned,
        C: DeserializeOwned,
    {
        let stream = take_stream_flag(&mut payload)?.unwrap_or(false);
        self.create_or_stream::<R, C, fn(C)>(route, payload, stream, None)
            .await?
            .ok_or_else(|| ClientError::UnexpectedResponse(format!("no body from {}", route)))
    }

    /// Streaming create. A `stream: false` left in `payload` is a
    /// precondition failure since the callback would never be called.
    pub(crate) async fn create_streaming<C, F>(
        &self,
        route: &str,
        mut payload: Params,
        on_chunk: F,
    ) -> Result<(), ClientError>
    where
        C: DeserializeOwned,
        F: FnMut(C) + Send,
    {
        let stream = take_stream_flag(&mut payload)?.unwrap_or(true);
        self.create_or_stream::<Value, C, F>(route, payload, stream, Some(on_chunk))
            .await
            .map(|_| ())
    }
}

/// Pull the `stream` flag out of caller-supplied params.
pub(crate) fn take_stream_flag(params: &mut Params) -> Result<Option<bool>, ClientError> {
    match params.remove("stream") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(flag)),
        Some(other) => Err(ClientError::Precondition(format!(
            "`stream` must be a boolean, got {}",
            other
        ))),
    }
}
