//! llamagate - Ollama-compatible HTTP bridge to an OpenAI-shaped upstream.
//!
//! Local tooling speaks Ollama's chat/generate/tags API. This crate exposes a
//! compatible HTTP surface, but translates requests/responses to the OpenAI
//! `chat/completions` format and forwards them upstream.
//!
//! Design goals:
//! - Accept Ollama client traffic unchanged (line-delimited JSON streaming
//!   included).
//! - Forward to any OpenAI-compatible backend with a bearer credential.
//! - Translate responses back to Ollama semantics, synthesizing the fields
//!   the upstream does not provide (model size, quantization, timings) so
//!   strict clients always parse a complete response.

pub mod catalog;
pub mod config;
pub mod error;
pub mod metadata;
pub mod server;
pub mod streaming;
pub mod translation;
pub mod types;

pub use config::ProxyConfig;
pub use server::serve;
