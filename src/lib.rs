//! # openai-session
//!
//! A client for the OpenAI HTTP API with an immutable chat session on top.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - One authenticated transport ([`ApiClient`]) shared by every resource
//! - Streamed responses delivered frame by frame to a callback
//! - Typed resources: completions, chat, embeddings, models, moderations,
//!   edits, files, fine-tunes, images and audio
//! - [`ChatSession`]: value-typed conversation state with automatic history
//!   shifting when the context length is exceeded
//!
//! ## Architecture
//!
//! The library is layered:
//!
//! 1. **Transport** ([`client`]): `GET`/`DELETE`/`POST` with bearer auth,
//!    status unwrapping and streamed-frame delivery, split into the
//!    [`Gettable`], [`Postable`] and [`FormPostable`] capabilities
//! 2. **Resources** ([`api`]): route and response shape per endpoint, with a
//!    shared create-or-stream contract
//! 3. **Chat** ([`chat`]): message history, token counting and submission
//!
//! ## Example
//! ```no_run
//! use openai_session::api::Api;
//! use openai_session::model::{Message, Params};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = Api::from_env()?;
//!
//!     api.chat_completions()
//!         .create_streaming(
//!             "gpt-4o-mini",
//!             &[Message::user("Write a haiku about rust.")],
//!             Params::new(),
//!             |chunk| {
//!                 if let Some(text) = chunk.choices.first().and_then(|c| c.delta.content.as_deref()) {
//!                     print!("{}", text);
//!                 }
//!             },
//!         )
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chat;
pub mod client;
pub mod form;
pub mod http;
pub mod model;
pub mod options;
pub mod sse;

// Re-exports for convenience
pub use api::Api;
pub use chat::{ChatConfig, ChatService, ChatSession, ContextOverflow, Tokenizer};
pub use client::{ApiClient, ClientError, FormPostable, Gettable, Postable};
pub use model::{Message, Params, Role};
pub use options::ClientOptions;
