//! Actix Web HTTP server.
//!
//! Exposes the Ollama-compatible surface:
//! - `POST /api/chat`, `POST /api/generate`
//! - `GET /api/tags`, `POST /api/show`, `GET /api/ps`, `GET /api/version`
//! - `GET /` and `GET /api` liveness probes

use crate::{
    catalog::{HttpModelFetcher, ModelCatalog},
    config::ProxyConfig,
    error::UpstreamError,
    streaming, translation,
    types::{ChatCompletionRequest, ChatRequest, GenerateRequest, ResponseVariant, ShowRequest},
};
use actix_cors::Cors;
use actix_web::{http::StatusCode, web, App, HttpResponse, HttpServer};
use anyhow::{Context, Result};
use futures::StreamExt;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info};

const VERSION_STRING: &str = "0.1.88";
const LIVENESS_BODY: &str = "Ollama is running";

#[derive(Clone)]
pub struct AppState {
    pub config: ProxyConfig,
    pub client: reqwest::Client,
    pub catalog: Arc<ModelCatalog>,
}

pub async fn serve(config: ProxyConfig) -> Result<()> {
    let addr = format!("0.0.0.0:{}", config.port);
    info!(
        addr = %addr,
        upstream = %config.upstream_base_url,
        default_model = %config.default_model,
        "llamagate listening"
    );

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
        .build()
        .context("failed to build reqwest client")?;

    let fetcher = HttpModelFetcher::new(
        client.clone(),
        config.upstream_base_trimmed(),
        config.api_key.clone(),
    );
    let catalog = Arc::new(ModelCatalog::new(
        Box::new(fetcher),
        config.default_model.clone(),
    ));

    let state = web::Data::new(AppState {
        config,
        client,
        catalog,
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Cors::permissive())
            .route("/api/chat", web::post().to(handle_chat))
            .route("/api/generate", web::post().to(handle_generate))
            .route("/api/tags", web::get().to(handle_tags))
            .route("/api/show", web::post().to(handle_show))
            .route("/api/ps", web::get().to(handle_ps))
            .route("/api/version", web::get().to(handle_version))
            .route("/", web::get().to(liveness))
            .route("/api", web::get().to(liveness))
    })
    .bind(&addr)
    .with_context(|| format!("failed to bind {}", addr))?
    .run()
    .await
    .context("server error")?;

    Ok(())
}

async fn handle_chat(state: web::Data<AppState>, body: web::Json<ChatRequest>) -> HttpResponse {
    let req = body.into_inner();
    let stream = req.wants_stream();
    let outgoing = translation::chat_to_upstream(&req, &state.config.default_model, stream);
    forward_completion(&state, outgoing, ResponseVariant::Chat).await
}

async fn handle_generate(
    state: web::Data<AppState>,
    body: web::Json<GenerateRequest>,
) -> HttpResponse {
    let req = body.into_inner();
    let stream = req.wants_stream();
    let outgoing = translation::generate_to_upstream(&req, &state.config.default_model, stream);
    forward_completion(&state, outgoing, ResponseVariant::Generate).await
}

/// Forward a translated request upstream and reframe the reply, streamed or
/// not, into the local dialect.
async fn forward_completion(
    state: &AppState,
    outgoing: ChatCompletionRequest,
    variant: ResponseVariant,
) -> HttpResponse {
    debug!(model = %outgoing.model, stream = outgoing.stream, "forwarding chat completion");

    let url = format!("{}/chat/completions", state.config.upstream_base_trimmed());
    let upstream = match state
        .client
        .post(&url)
        .bearer_auth(&state.config.api_key)
        .json(&outgoing)
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "upstream request failed");
            return error_response(&UpstreamError::Network(e));
        }
    };

    if !upstream.status().is_success() {
        let status = upstream.status().as_u16();
        let text = upstream.text().await.unwrap_or_default();
        let err = UpstreamError::Status {
            status,
            message: extract_error_message(&text),
        };
        error!(status, message = %err.message(), "upstream error");
        return error_response(&err);
    }

    if outgoing.stream {
        let reframed =
            streaming::reframe(upstream.bytes_stream(), outgoing.model, variant).map(|r| {
                r.map(web::Bytes::from)
                    .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))
            });

        return HttpResponse::Ok()
            .content_type("application/x-ndjson")
            .streaming(reframed);
    }

    let v: serde_json::Value = match upstream.json().await {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "failed to decode upstream response");
            return error_response(&UpstreamError::Network(e));
        }
    };

    HttpResponse::Ok().json(translation::upstream_to_local(&v, &outgoing.model, variant))
}

/// Pull `error.message` out of an upstream error body, falling back to the
/// raw body text.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| body.to_string())
}

fn error_response(err: &UpstreamError) -> HttpResponse {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(json!({"error": err.message()}))
}

async fn handle_tags(state: web::Data<AppState>) -> HttpResponse {
    let tags = state.catalog.list_models().await;
    info!(count = tags.models.len(), "returning model list");
    HttpResponse::Ok().json(tags)
}

/// Static descriptor derived only from the given model name; no upstream call.
async fn handle_show(body: web::Json<ShowRequest>) -> HttpResponse {
    let model = body.into_inner().model;
    HttpResponse::Ok().json(json!({
        "modelfile": format!("# Modelfile for {}\nFROM {}", model, model),
        "parameters": "temperature 0.7\nnum_ctx 4096",
        "template": "{{ .System }}{{ .Prompt }}",
        "details": {
            "parent_model": "",
            "format": "gguf",
            "family": "gpt",
            "families": ["gpt"],
            "parameter_size": "unknown",
            "quantization_level": "unknown"
        }
    }))
}

async fn handle_ps() -> HttpResponse {
    // No loaded-model tracking: nothing runs locally.
    HttpResponse::Ok().json(json!({"models": []}))
}

async fn handle_version() -> HttpResponse {
    HttpResponse::Ok().json(json!({"version": VERSION_STRING}))
}

async fn liveness() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(LIVENESS_BODY)
}
