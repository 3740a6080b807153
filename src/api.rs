//! Typed resources over the transport.
//!
//! [`Api`] hands out one value per remote resource. All of them share the
//! same transport; each only requires the capabilities it uses, so e.g.
//! [`ChatCompletions`] works over anything implementing
//! [`Postable`](crate::client::Postable).

pub mod audio;
pub mod chat_completions;
pub mod completions;
pub mod edits;
pub mod embeddings;
pub mod files;
pub mod fine_tunes;
pub mod images;
pub mod models;
pub mod moderations;
pub mod resource;

use std::sync::Arc;

pub use audio::Audio;
pub use chat_completions::ChatCompletions;
pub use completions::Completions;
pub use edits::Edits;
pub use embeddings::Embeddings;
pub use files::Files;
pub use fine_tunes::FineTunes;
pub use images::Images;
pub use models::Models;
pub use moderations::Moderations;
pub use resource::Resource;

use crate::client::{ApiClient, ClientError};
use crate::options::ClientOptions;

/// Entry point to every resource.
///
/// # Example
/// ```no_run
/// use openai_session::api::Api;
/// use openai_session::model::{Message, Params};
///
/// # async fn run() -> Result<(), openai_session::ClientError> {
/// let api = Api::from_env()?;
/// let reply = api
///     .chat_completions()
///     .create("gpt-4o-mini", &[Message::user("Hello!")], Params::new())
///     .await?;
/// println!("{:?}", reply.choices[0].message.content);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Api<T = ApiClient> {
    transport: Arc<T>,
}

impl<T> Clone for Api<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl Api<ApiClient> {
    pub fn from_options(options: ClientOptions) -> Result<Self, ClientError> {
        Ok(Self::new(ApiClient::with_options(options)?))
    }

    /// Build from `OPENAI_API_KEY` / `OPENAI_BASE_URL`.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_options(ClientOptions::from_env()?)
    }
}

impl<T> Api<T> {
    pub fn new(transport: T) -> Self {
        Self::from_shared(Arc::new(transport))
    }

    pub fn from_shared(transport: Arc<T>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn resource(&self) -> Resource<T> {
        Resource::new(Arc::clone(&self.transport))
    }

    pub fn completions(&self) -> Completions<T> {
        Completions::new(self.resource())
    }

    pub fn chat_completions(&self) -> ChatCompletions<T> {
        ChatCompletions::new(self.resource())
    }

    pub fn embeddings(&self) -> Embeddings<T> {
        Embeddings::new(self.resource())
    }

    pub fn models(&self) -> Models<T> {
        Models::new(self.resource())
    }

    pub fn moderations(&self) -> Moderations<T> {
        Moderations::new(self.resource())
    }

    pub fn edits(&self) -> Edits<T> {
        Edits::new(self.resource())
    }

    pub fn files(&self) -> Files<T> {
        Files::new(self.resource())
    }

    pub fn fine_tunes(&self) -> FineTunes<T> {
        FineTunes::new(self.resource())
    }

    pub fn images(&self) -> Images<T> {
        Images::new(self.resource())
    }

    pub fn audio(&self) -> Audio<T> {
        Audio::new(self.resource())
    }
}
