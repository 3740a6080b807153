//! Request and response data models.
//!
//! Response shapes mirror the remote JSON documents. Fields the service may
//! omit are optional or defaulted so older and newer payloads both decode.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Request parameters: a JSON object of name to value.
pub type Params = serde_json::Map<String, Value>;

/// Role of the message sender.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a conversation.
///
/// Serializes to the `{"role": ..., "content": ...}` pair the chat endpoint
/// expects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Token usage information.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u32>,

    #[serde(default)]
    pub total_tokens: u32,
}

/// Error body returned by the service on failure.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub param: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

// --- Completions ---

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Completion {
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<CompletionChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CompletionChoice {
    pub text: String,
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub logprobs: Option<Value>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

// --- Chat completions ---

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChatCompletion {
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChatChoice {
    #[serde(default)]
    pub index: u32,
    pub message: ChatResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Assistant message as returned by the service; `content` is null when the
/// model produced no text.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChatResponseMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
}

impl From<ChatResponseMessage> for Message {
    fn from(msg: ChatResponseMessage) -> Self {
        Message::new(msg.role, msg.content.unwrap_or_default())
    }
}

/// One streamed frame of a chat completion.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChatCompletionChunk {
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<ChatChunkChoice>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChatChunkChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub delta: ChatDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ChatDelta {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub content: Option<String>,
}

// --- Embeddings ---

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Embedding {
    #[serde(default)]
    pub object: String,
    pub data: Vec<EmbeddingData>,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EmbeddingData {
    #[serde(default)]
    pub object: String,
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub index: u32,
}

// --- Models ---

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Model {
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub owned_by: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelList {
    #[serde(default)]
    pub object: String,
    pub data: Vec<Model>,
}

// --- Moderations ---

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Moderation {
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub results: Vec<ModerationResult>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModerationResult {
    pub flagged: bool,
    #[serde(default)]
    pub categories: HashMap<String, bool>,
    #[serde(default)]
    pub category_scores: HashMap<String, f64>,
}

// --- Edits ---

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Edit {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub created: u64,
    pub choices: Vec<EditChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EditChoice {
    pub text: String,
    #[serde(default)]
    pub index: u32,
}

// --- Files ---

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct File {
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub bytes: Option<u64>,
    #[serde(default)]
    pub created_at: Option<u64>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Present only on delete responses.
    #[serde(default)]
    pub deleted: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FileList {
    #[serde(default)]
    pub object: String,
    pub data: Vec<File>,
}

// --- Fine-tunes ---

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FineTune {
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub created_at: u64,
    #[serde(default)]
    pub updated_at: Option<u64>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub fine_tuned_model: Option<String>,
    #[serde(default)]
    pub hyperparams: Option<Value>,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub training_files: Vec<File>,
    #[serde(default)]
    pub validation_files: Vec<File>,
    #[serde(default)]
    pub result_files: Vec<File>,
    #[serde(default)]
    pub events: Vec<FineTuneEvent>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FineTuneList {
    #[serde(default)]
    pub object: String,
    pub data: Vec<FineTune>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FineTuneEvent {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub created_at: u64,
    #[serde(default)]
    pub level: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FineTuneEventList {
    #[serde(default)]
    pub object: String,
    pub data: Vec<FineTuneEvent>,
}

// --- Images ---

/// Response of image generation, variation and edit.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Images {
    #[serde(default)]
    pub created: u64,
    pub data: Vec<ImageData>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ImageData {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub b64_json: Option<String>,
    #[serde(default)]
    pub revised_prompt: Option<String>,
}

// --- Audio ---

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Transcription {
    pub text: String,
}

/// Synthesized speech: the raw audio bytes and the format they are in.
#[derive(Debug, Clone, PartialEq)]
pub struct Speech {
    pub format: String,
    pub data: Bytes,
}
