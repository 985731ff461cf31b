//! Streaming reframer (upstream SSE -> local NDJSON).
//!
//! The upstream streams `data: {json}` lines with a terminal `data: [DONE]`
//! marker. Local-protocol clients expect newline-delimited JSON chunks ending
//! in exactly one done=true chunk. This module consumes the upstream byte
//! stream and yields each local chunk as a complete JSON line.

use crate::translation;
use crate::types::ResponseVariant;
use anyhow::Result;
use async_stream::try_stream;
use futures::{Stream, StreamExt};
use serde_json::Value;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// What one upstream line means for the local stream.
enum FrameEvent {
    /// Blank line, non-`data:` line, unparseable payload, or empty delta.
    Ignore,
    /// The `[DONE]` sentinel.
    Done,
    /// A delta carrying non-empty content.
    Delta(String),
}

fn classify_line(line: &str) -> FrameEvent {
    let line = line.trim();
    if line.is_empty() {
        return FrameEvent::Ignore;
    }
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return FrameEvent::Ignore;
    };

    if payload == DONE_SENTINEL {
        return FrameEvent::Done;
    }

    // Skip frames that do not parse; a malformed line must not kill the
    // stream.
    let Ok(frame) = serde_json::from_str::<Value>(payload) else {
        tracing::debug!(payload = %payload, "skipping unparseable stream frame");
        return FrameEvent::Ignore;
    };

    let delta_content = frame
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("delta"))
        .and_then(|d| d.get("content"))
        .and_then(|c| c.as_str());

    match delta_content {
        Some(text) if !text.is_empty() => FrameEvent::Delta(text.to_string()),
        _ => FrameEvent::Ignore,
    }
}

/// Reframe an upstream SSE byte stream into local NDJSON chunk lines.
///
/// Generic over the byte source so the state machine is testable without a
/// socket; the server passes `response.bytes_stream()`.
///
/// Per line: blank lines and lines without the `data: ` prefix are ignored;
/// unparseable payloads are skipped, never fatal; a delta with non-empty
/// content yields one done=false chunk. The `[DONE]` sentinel yields the
/// single terminal chunk (`eval_count` = deltas seen, `prompt_eval_count`
/// estimated at 30% of that) and stops consuming input entirely. A final
/// line left unterminated when the upstream closes is processed like any
/// other, so a sentinel without a trailing newline still terminates the
/// stream properly.
pub fn reframe<S, B, E>(
    upstream: S,
    model: String,
    variant: ResponseVariant,
) -> impl Stream<Item = Result<String>>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    try_stream! {
        let mut buffer = String::new();
        let mut eval_count: u64 = 0;
        let mut terminated = false;

        futures::pin_mut!(upstream);
        while let Some(bytes) = upstream.next().await {
            let bytes = bytes?;
            buffer.push_str(&String::from_utf8_lossy(bytes.as_ref()));

            while let Some(idx) = buffer.find('\n') {
                let line = buffer[..idx].to_string();
                buffer.drain(..=idx);

                match classify_line(&line) {
                    FrameEvent::Ignore => {}
                    FrameEvent::Done => {
                        yield terminal_line(&model, variant, eval_count);
                        terminated = true;
                        break;
                    }
                    FrameEvent::Delta(text) => {
                        eval_count += 1;
                        let chunk = translation::delta_chunk(&model, variant, &text);
                        yield format!("{}\n", chunk);
                    }
                }
            }

            if terminated {
                break;
            }
        }

        // The upstream may close without a trailing newline; the residue can
        // still hold the sentinel or one last delta.
        if !terminated {
            match classify_line(&buffer) {
                FrameEvent::Ignore => {}
                FrameEvent::Done => {
                    yield terminal_line(&model, variant, eval_count);
                }
                FrameEvent::Delta(text) => {
                    let chunk = translation::delta_chunk(&model, variant, &text);
                    yield format!("{}\n", chunk);
                }
            }
        }
    }
}

/// The terminal chunk as one NDJSON line. The chunk carries empty content;
/// clients have already received the text as deltas.
fn terminal_line(model: &str, variant: ResponseVariant, eval_count: u64) -> String {
    let prompt_eval_count = eval_count * 3 / 10;
    let chunk = translation::terminal_chunk(
        model,
        variant,
        "assistant",
        "",
        prompt_eval_count,
        eval_count,
    );
    format!("{}\n", chunk)
}
