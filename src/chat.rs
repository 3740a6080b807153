//! Conversational session over the chat completions resource.
//!
//! A [`ChatSession`] is an immutable value: every operation that changes
//! the conversation returns a new session and leaves the receiver intact.
//!
//! # Example
//! ```no_run
//! use openai_session::api::Api;
//! use openai_session::chat::{ApproximateTokenizer, ChatService, ChatSession};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), openai_session::ClientError> {
//! let service = Arc::new(ChatService::new(Api::from_env()?, ApproximateTokenizer));
//! let settings = json!({"model": "gpt-4o-mini"}).as_object().cloned().unwrap_or_default();
//!
//! let chat = ChatSession::new(service, Vec::new())
//!     .configure(settings)
//!     .add_system_message("You are terse.")
//!     .add_user_message("Name a prime number.");
//!
//! let chat = chat.submit().await?;
//! println!("{}", chat.to_log_format());
//! # Ok(())
//! # }
//! ```

use itertools::Itertools;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::Api;
use crate::client::{ApiClient, ClientError, Postable};
use crate::model::{Message, Params, Role};

/// Counts tokens for a given model.
pub trait Tokenizer: Send + Sync {
    fn token_count_for_model(&self, model: &str, text: &str) -> usize;
}

/// Rough estimate of four bytes per token, independent of the model.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApproximateTokenizer;

impl Tokenizer for ApproximateTokenizer {
    fn token_count_for_model(&self, _model: &str, text: &str) -> usize {
        text.len().div_ceil(4)
    }
}

/// Display configuration of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Label used for assistant messages in transcripts.
    pub assistant_name: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            assistant_name: Role::Assistant.as_str().to_string(),
        }
    }
}

impl ChatConfig {
    pub fn with_assistant_name(&self, name: impl Into<String>) -> Self {
        Self {
            assistant_name: name.into(),
        }
    }
}

/// What [`ChatSession::submit`] does when the service rejects the
/// conversation as too long.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContextOverflow {
    /// Drop the oldest non-system message and resubmit, until the request
    /// fits or only system messages remain.
    #[default]
    ShiftHistory,
    /// Return the error to the caller.
    Fail,
}

/// Collaborators a session submits through.
pub struct ChatService<T = ApiClient> {
    api: Api<T>,
    tokenizer: Arc<dyn Tokenizer>,
}

impl<T> ChatService<T> {
    pub fn new(api: Api<T>, tokenizer: impl Tokenizer + 'static) -> Self {
        Self::with_tokenizer(api, Arc::new(tokenizer))
    }

    pub fn with_tokenizer(api: Api<T>, tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self { api, tokenizer }
    }

    pub fn api(&self) -> &Api<T> {
        &self.api
    }

    pub fn tokenizer(&self) -> &dyn Tokenizer {
        self.tokenizer.as_ref()
    }
}

impl<T: fmt::Debug> fmt::Debug for ChatService<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatService")
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}

impl Message {
    /// `"LABEL: content"`, where the label is the uppercased role, or the
    /// configured assistant name for assistant messages.
    pub fn to_log_format(&self, config: &ChatConfig) -> String {
        let label = match self.role {
            Role::User | Role::System => self.role.as_str().to_uppercase(),
            Role::Assistant => config.assistant_name.to_uppercase(),
        };
        format!("{}: {}", label, self.content)
    }
}

/// Immutable conversation state.
pub struct ChatSession<T = ApiClient> {
    messages: Vec<Message>,
    api_settings: Params,
    config: ChatConfig,
    overflow: ContextOverflow,
    service: Arc<ChatService<T>>,
}

impl<T> Clone for ChatSession<T> {
    fn clone(&self) -> Self {
        Self {
            messages: self.messages.clone(),
            api_settings: self.api_settings.clone(),
            config: self.config.clone(),
            overflow: self.overflow,
            service: Arc::clone(&self.service),
        }
    }
}

impl<T> fmt::Debug for ChatSession<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatSession")
            .field("messages", &self.messages)
            .field("api_settings", &self.api_settings)
            .field("config", &self.config)
            .field("overflow", &self.overflow)
            .finish_non_exhaustive()
    }
}

impl<T> ChatSession<T> {
    /// Start a session with no settings and the default config.
    pub fn new(service: Arc<ChatService<T>>, messages: Vec<Message>) -> Self {
        Self {
            messages,
            api_settings: Params::new(),
            config: ChatConfig::default(),
            overflow: ContextOverflow::default(),
            service,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn api_settings(&self) -> &Params {
        &self.api_settings
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn context_overflow(&self) -> ContextOverflow {
        self.overflow
    }

    pub fn add_user_message(&self, content: impl Into<String>) -> Self {
        self.with_message(Message::user(content))
    }

    pub fn add_system_message(&self, content: impl Into<String>) -> Self {
        self.with_message(Message::system(content))
    }

    pub fn add_assistant_message(&self, content: impl Into<String>) -> Self {
        self.with_message(Message::assistant(content))
    }

    /// Alias of [`add_user_message`](Self::add_user_message).
    pub fn user(&self, content: impl Into<String>) -> Self {
        self.add_user_message(content)
    }

    /// Alias of [`add_system_message`](Self::add_system_message).
    pub fn system(&self, content: impl Into<String>) -> Self {
        self.add_system_message(content)
    }

    /// Alias of [`add_assistant_message`](Self::add_assistant_message).
    pub fn assistant(&self, content: impl Into<String>) -> Self {
        self.add_assistant_message(content)
    }

    /// Merge `options` into the generation settings; later keys win.
    pub fn configure(&self, options: Params) -> Self {
        let mut api_settings = self.api_settings.clone();
        api_settings.extend(options);
        Self {
            api_settings,
            ..self.clone()
        }
    }

    pub fn with_config(&self, config: ChatConfig) -> Self {
        Self {
            config,
            ..self.clone()
        }
    }

    pub fn with_context_overflow(&self, overflow: ContextOverflow) -> Self {
        Self {
            overflow,
            ..self.clone()
        }
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Transcript with one `"LABEL: content"` entry per message, separated
    /// by blank lines.
    pub fn to_log_format(&self) -> String {
        self.messages
            .iter()
            .map(|msg| msg.to_log_format(&self.config))
            .join("\n\n")
    }

    /// Drop the first non-system message. `None` when there is none to drop.
    pub fn shift_history(&self) -> Option<Self> {
        let drop_index = self
            .messages
            .iter()
            .position(|msg| msg.role != Role::System)?;

        let mut messages = self.messages.clone();
        messages.remove(drop_index);
        Some(self.with_messages(messages))
    }

    /// Tokens in all message contents joined by spaces, for the configured
    /// model.
    pub fn total_tokens(&self) -> Result<usize, ClientError> {
        let text = self.messages.iter().map(|msg| msg.content.as_str()).join(" ");
        Ok(self
            .service
            .tokenizer
            .token_count_for_model(self.model()?, &text))
    }

    fn model(&self) -> Result<&str, ClientError> {
        self.api_settings
            .get("model")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ClientError::Precondition("chat settings must include a string `model`".to_string())
            })
    }

    fn with_message(&self, message: Message) -> Self {
        let mut messages = self.messages.clone();
        messages.push(message);
        self.with_messages(messages)
    }

    fn with_messages(&self, messages: Vec<Message>) -> Self {
        Self {
            messages,
            api_settings: self.api_settings.clone(),
            config: self.config.clone(),
            overflow: self.overflow,
            service: Arc::clone(&self.service),
        }
    }
}

impl<T: Postable> ChatSession<T> {
    /// Send the conversation and return a session with the reply appended.
    ///
    /// On a context-length rejection the behavior follows
    /// [`ContextOverflow`]. If shifting runs out of non-system messages the
    /// last rejection is returned.
    pub async fn submit(&self) -> Result<Self, ClientError> {
        let mut chat = self.clone();
        loop {
            let result = chat.submit_once().await;
            match result {
                Err(err)
                    if err.is_context_length_exceeded()
                        && chat.overflow == ContextOverflow::ShiftHistory =>
                {
                    warn!("[Chat] Context length exceeded. Shifting chat");
                    chat = match chat.shift_history() {
                        Some(shifted) => shifted,
                        None => return Err(err),
                    };
                }
                result => return result,
            }
        }
    }

    async fn submit_once(&self) -> Result<Self, ClientError> {
        let model = self.model()?;
        info!(
            "[Chat] [tokens={}] Submitting messages:\n\n{}",
            self.total_tokens()?,
            self.to_log_format()
        );

        let mut params = self.api_settings.clone();
        params.remove("model");

        let response = self
            .service
            .api
            .chat_completions()
            .create(model, &self.messages, params)
            .await?;

        let reply = response.choices.into_iter().next().ok_or_else(|| {
            ClientError::UnexpectedResponse("chat completion has no choices".to_string())
        })?;

        let chat = self.with_message(reply.message.into());
        if let Some(last) = chat.last_message() {
            info!("[Chat] Response:\n\n{}", last.to_log_format(&chat.config));
        }
        Ok(chat)
    }
}
