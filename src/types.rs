//! Wire types for both sides of the bridge.
//!
//! The local side speaks Ollama's chat/generate/tags API; the upstream side
//! speaks an OpenAI-shaped `chat/completions` API. Request shapes are typed
//! here. Loosely-shaped upstream *responses* are handled as `serde_json::Value`
//! in `translation`/`streaming`, since only a few fields of them matter.

use serde::{Deserialize, Serialize};

/// A message role, shared verbatim by both protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A chat message, shared verbatim by both protocols.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Sampling options on local requests. Anything unset degrades to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateOptions {
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub num_predict: Option<u32>,
}

/// Body of `POST /api/chat`.
///
/// `messages` may be absent, in which case a single user message is derived
/// from `prompt`. Streaming is on unless `stream` is explicitly `false`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub messages: Option<Vec<ChatMessage>>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub stream: Option<bool>,
    #[serde(default)]
    pub options: Option<GenerateOptions>,
}

impl ChatRequest {
    pub fn wants_stream(&self) -> bool {
        self.stream != Some(false)
    }
}

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub stream: Option<bool>,
    #[serde(default)]
    pub options: Option<GenerateOptions>,
}

impl GenerateRequest {
    pub fn wants_stream(&self) -> bool {
        self.stream != Some(false)
    }
}

/// Body of `POST /api/show`.
#[derive(Debug, Clone, Deserialize)]
pub struct ShowRequest {
    #[serde(default)]
    pub model: String,
}

/// The only shape sent upstream; generate requests are translated into it too.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Which local response dialect a translation produces: `/api/chat` chunks
/// carry a `message` object, `/api/generate` chunks a bare `response` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseVariant {
    Chat,
    Generate,
}

/// Response body of `GET /api/tags`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagsResponse {
    pub models: Vec<ModelEntry>,
}

/// One model in the local protocol's catalog listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelEntry {
    pub name: String,
    /// Identical to `name`; the local protocol carries both.
    pub model: String,
    pub modified_at: String,
    pub size: u64,
    /// Opaque token shaped like a content digest; not verifiable.
    pub digest: String,
    pub details: ModelDetails,
}

/// Local-protocol model details; format/family are fixed, size and
/// quantization come from [`crate::metadata::synthesize`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelDetails {
    pub parent_model: String,
    pub format: String,
    pub family: String,
    pub families: Vec<String>,
    pub parameter_size: String,
    pub quantization_level: String,
}
