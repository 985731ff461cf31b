//! Local <-> upstream translation.
//!
//! This module implements the core format conversions:
//! - Ollama chat/generate request -> OpenAI-shaped `chat/completions` request
//! - complete (non-streamed) `chat/completions` response -> Ollama response
//!
//! Duration fields the upstream never measures are synthesized by
//! [`SyntheticTimings::placeholder`] so strict local-protocol clients always
//! get a complete, well-typed terminal chunk.

use crate::types::{
    ChatCompletionRequest, ChatMessage, ChatRequest, GenerateOptions, GenerateRequest,
    ResponseVariant, Role,
};
use chrono::Utc;
use rand::Rng;
use serde_json::{json, Value};

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Convert an Ollama chat request into an upstream `chat/completions` request.
///
/// `stream` is decided by the caller from the local request's `stream` field,
/// never inferred here.
pub fn chat_to_upstream(
    req: &ChatRequest,
    default_model: &str,
    stream: bool,
) -> ChatCompletionRequest {
    let messages = req.messages.clone().unwrap_or_else(|| {
        vec![ChatMessage {
            role: Role::User,
            content: req.prompt.clone().unwrap_or_default(),
        }]
    });

    build_upstream(req.model.as_deref(), messages, req.options.as_ref(), default_model, stream)
}

/// Convert an Ollama generate request into an upstream `chat/completions`
/// request: `[system?, user(prompt)?]`, in that order.
pub fn generate_to_upstream(
    req: &GenerateRequest,
    default_model: &str,
    stream: bool,
) -> ChatCompletionRequest {
    let mut messages = Vec::new();
    if let Some(system) = &req.system {
        messages.push(ChatMessage {
            role: Role::System,
            content: system.clone(),
        });
    }
    if let Some(prompt) = &req.prompt {
        messages.push(ChatMessage {
            role: Role::User,
            content: prompt.clone(),
        });
    }

    build_upstream(req.model.as_deref(), messages, req.options.as_ref(), default_model, stream)
}

fn build_upstream(
    model: Option<&str>,
    messages: Vec<ChatMessage>,
    options: Option<&GenerateOptions>,
    default_model: &str,
    stream: bool,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: model.unwrap_or(default_model).to_string(),
        messages,
        stream,
        temperature: options
            .and_then(|o| o.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE),
        max_tokens: options
            .and_then(|o| o.num_predict)
            .unwrap_or(DEFAULT_MAX_TOKENS),
    }
}

/// Convert a complete upstream response into a terminal local chunk.
///
/// Token counts come from upstream `usage` when present, else 0.
pub fn upstream_to_local(resp: &Value, model: &str, variant: ResponseVariant) -> Value {
    let message = resp
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"));

    let role = message
        .and_then(|m| m.get("role"))
        .and_then(|r| r.as_str())
        .unwrap_or("assistant");
    let content = message
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .unwrap_or("");

    let usage = resp.get("usage");
    let prompt_eval_count = usage
        .and_then(|u| u.get("prompt_tokens"))
        .and_then(|v| v.as_u64())
        .unwrap_or(0);
    let eval_count = usage
        .and_then(|u| u.get("completion_tokens"))
        .and_then(|v| v.as_u64())
        .unwrap_or(0);

    terminal_chunk(model, variant, role, content, prompt_eval_count, eval_count)
}

/// One non-terminal (done=false) local chunk carrying an incremental delta.
///
/// Carries no timing fields: those appear only on the terminal chunk.
pub fn delta_chunk(model: &str, variant: ResponseVariant, content: &str) -> Value {
    let created_at = Utc::now().to_rfc3339();
    match variant {
        ResponseVariant::Chat => json!({
            "model": model,
            "created_at": created_at,
            "message": {"role": "assistant", "content": content},
            "done": false,
        }),
        ResponseVariant::Generate => json!({
            "model": model,
            "created_at": created_at,
            "response": content,
            "done": false,
        }),
    }
}

/// The single terminal (done=true) local chunk, with every timing field set.
pub fn terminal_chunk(
    model: &str,
    variant: ResponseVariant,
    role: &str,
    content: &str,
    prompt_eval_count: u64,
    eval_count: u64,
) -> Value {
    let t = SyntheticTimings::placeholder();
    let mut chunk = json!({
        "model": model,
        "created_at": Utc::now().to_rfc3339(),
        "done": true,
        "done_reason": "stop",
        "total_duration": t.total_duration,
        "load_duration": t.load_duration,
        "prompt_eval_count": prompt_eval_count,
        "prompt_eval_duration": t.prompt_eval_duration,
        "eval_count": eval_count,
        "eval_duration": t.eval_duration,
    });

    let obj = chunk.as_object_mut().expect("json object");
    match variant {
        ResponseVariant::Chat => {
            obj.insert(
                "message".to_string(),
                json!({"role": role, "content": content}),
            );
        }
        ResponseVariant::Generate => {
            obj.insert("response".to_string(), json!(content));
            obj.insert("context".to_string(), json!([]));
        }
    }

    chunk
}

/// Placeholder durations in nanoseconds.
///
/// The upstream protocol has no timing data, but local-protocol clients
/// require these fields on the terminal chunk. Values are drawn from fixed
/// ranges and carry no performance meaning:
///
/// - `total_duration`: [500ms, 1500ms)
/// - `load_duration`: [1ms, 11ms)
/// - `prompt_eval_duration`: [50ms, 150ms)
/// - `eval_duration`: [200ms, 700ms)
#[derive(Debug, Clone, Copy)]
pub struct SyntheticTimings {
    pub total_duration: u64,
    pub load_duration: u64,
    pub prompt_eval_duration: u64,
    pub eval_duration: u64,
}

impl SyntheticTimings {
    pub fn placeholder() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            total_duration: rng.gen_range(500_000_000..1_500_000_000),
            load_duration: rng.gen_range(1_000_000..11_000_000),
            prompt_eval_duration: rng.gen_range(50_000_000..150_000_000),
            eval_duration: rng.gen_range(200_000_000..700_000_000),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_orders_system_before_prompt() {
        let req = GenerateRequest {
            model: None,
            prompt: Some("hi".to_string()),
            system: Some("be terse".to_string()),
            stream: None,
            options: None,
        };

        let out = generate_to_upstream(&req, "gpt-3.5-turbo", false);
        assert_eq!(
            out.messages,
            vec![
                ChatMessage {
                    role: Role::System,
                    content: "be terse".to_string()
                },
                ChatMessage {
                    role: Role::User,
                    content: "hi".to_string()
                },
            ]
        );
    }

    #[test]
    fn chat_defaults_degrade_gracefully() {
        let req = ChatRequest {
            model: None,
            messages: None,
            prompt: None,
            stream: None,
            options: None,
        };

        let out = chat_to_upstream(&req, "gpt-3.5-turbo", true);
        assert_eq!(out.model, "gpt-3.5-turbo");
        assert_eq!(out.messages.len(), 1);
        assert_eq!(out.messages[0].role, Role::User);
        assert_eq!(out.messages[0].content, "");
        assert!(out.stream);
        assert_eq!(out.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(out.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn chat_keeps_explicit_messages_and_options() {
        let req = ChatRequest {
            model: Some("gpt-4o".to_string()),
            messages: Some(vec![ChatMessage {
                role: Role::User,
                content: "hello".to_string(),
            }]),
            prompt: Some("ignored".to_string()),
            stream: Some(false),
            options: Some(GenerateOptions {
                temperature: Some(0.2),
                num_predict: Some(64),
            }),
        };

        let out = chat_to_upstream(&req, "gpt-3.5-turbo", false);
        assert_eq!(out.model, "gpt-4o");
        assert_eq!(out.messages.len(), 1);
        assert_eq!(out.messages[0].content, "hello");
        assert_eq!(out.temperature, 0.2);
        assert_eq!(out.max_tokens, 64);
    }

    #[test]
    fn upstream_response_becomes_terminal_chat_chunk() {
        let resp = json!({
            "choices": [{
                "message": {"role": "assistant", "content": "pong"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 7, "completion_tokens": 3}
        });

        let out = upstream_to_local(&resp, "gpt-4o", ResponseVariant::Chat);
        assert_eq!(out["done"], json!(true));
        assert_eq!(out["done_reason"], json!("stop"));
        assert_eq!(out["message"]["content"], json!("pong"));
        assert_eq!(out["prompt_eval_count"], json!(7));
        assert_eq!(out["eval_count"], json!(3));
        assert!(out["total_duration"].as_u64().unwrap() >= 500_000_000);
        assert!(out["eval_duration"].as_u64().unwrap() >= 200_000_000);
    }

    #[test]
    fn upstream_response_without_usage_counts_zero() {
        let resp = json!({
            "choices": [{"message": {"role": "assistant", "content": "ok"}}]
        });

        let out = upstream_to_local(&resp, "gpt-4o", ResponseVariant::Generate);
        assert_eq!(out["response"], json!("ok"));
        assert_eq!(out["context"], json!([]));
        assert_eq!(out["prompt_eval_count"], json!(0));
        assert_eq!(out["eval_count"], json!(0));
    }

    #[test]
    fn delta_chunk_omits_timing_fields() {
        let out = delta_chunk("gpt-4o", ResponseVariant::Chat, "Hel");
        assert_eq!(out["done"], json!(false));
        assert_eq!(out["message"]["content"], json!("Hel"));
        assert!(out.get("total_duration").is_none());
        assert!(out.get("eval_count").is_none());
        assert!(out.get("done_reason").is_none());
    }

    #[test]
    fn synthetic_timings_stay_in_documented_ranges() {
        for _ in 0..32 {
            let t = SyntheticTimings::placeholder();
            assert!((500_000_000..1_500_000_000).contains(&t.total_duration));
            assert!((1_000_000..11_000_000).contains(&t.load_duration));
            assert!((50_000_000..150_000_000).contains(&t.prompt_eval_duration));
            assert!((200_000_000..700_000_000).contains(&t.eval_duration));
        }
    }
}
