//! Model catalog: the upstream model list with a TTL cache and a fallback
//! chain, so `GET /api/tags` always returns something.
//!
//! Policy, in order:
//! 1. cache younger than the TTL -> return it unchanged
//! 2. fetch upstream -> rebuild entries, replace the cache wholesale
//! 3. fetch failed, any cache (even expired) -> return it as-is
//! 4. no cache at all -> one synthesized entry for the default model
//!
//! The cache mutex is held across the refresh await, so simultaneous cache
//! misses collapse into a single upstream fetch: followers block on the lock
//! and then observe the freshly written cache.

use crate::error::UpstreamError;
use crate::metadata::{self, ModelMetadata};
use crate::types::{ModelDetails, ModelEntry, TagsResponse};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Digest of the no-cache fallback entry. Fixed, so clients see a stable
/// value across restarts when the upstream is unreachable.
const FALLBACK_DIGEST: &str = "fallback123456789abcdef";

/// One model as the upstream `GET /models` endpoint reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamModel {
    pub id: String,
    /// Creation time as a unix epoch in seconds.
    #[serde(default)]
    pub created: i64,
}

#[derive(Debug, Deserialize)]
struct UpstreamModelList {
    #[serde(default)]
    data: Vec<UpstreamModel>,
}

/// Fetches the raw upstream model list. A trait seam so the catalog is
/// testable without a network.
#[async_trait]
pub trait ModelFetcher: Send + Sync {
    async fn fetch_models(&self) -> Result<Vec<UpstreamModel>, UpstreamError>;
}

/// Real fetcher: `GET {base}/models` with the bearer credential.
pub struct HttpModelFetcher {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpModelFetcher {
    pub fn new(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl ModelFetcher for HttpModelFetcher {
    async fn fetch_models(&self) -> Result<Vec<UpstreamModel>, UpstreamError> {
        let url = format!("{}/models", self.base_url);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(UpstreamError::Status { status, message });
        }

        let list: UpstreamModelList = resp.json().await?;
        Ok(list.data)
    }
}

struct CatalogCache {
    models: Vec<ModelEntry>,
    fetched_at: Instant,
}

/// Owned catalog state; constructed once at startup and shared behind `Arc`.
pub struct ModelCatalog {
    fetcher: Box<dyn ModelFetcher>,
    default_model: String,
    ttl: Duration,
    cache: Mutex<Option<CatalogCache>>,
}

impl ModelCatalog {
    pub fn new(fetcher: Box<dyn ModelFetcher>, default_model: impl Into<String>) -> Self {
        Self::with_ttl(fetcher, default_model, CACHE_TTL)
    }

    pub fn with_ttl(
        fetcher: Box<dyn ModelFetcher>,
        default_model: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            fetcher,
            default_model: default_model.into(),
            ttl,
            cache: Mutex::new(None),
        }
    }

    /// List models for the local protocol. Never fails.
    pub async fn list_models(&self) -> TagsResponse {
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                return TagsResponse {
                    models: cached.models.clone(),
                };
            }
        }

        debug!("model cache miss, fetching upstream model list");
        match self.fetcher.fetch_models().await {
            Ok(upstream) => {
                let models: Vec<ModelEntry> = upstream.iter().map(build_entry).collect();
                info!(count = models.len(), "fetched upstream model list");
                *cache = Some(CatalogCache {
                    models: models.clone(),
                    fetched_at: Instant::now(),
                });
                TagsResponse { models }
            }
            Err(e) => {
                warn!(error = %e, "upstream model list fetch failed");
                if let Some(cached) = cache.as_ref() {
                    // Stale but available. The timestamp is left untouched so
                    // the next call retries upstream.
                    return TagsResponse {
                        models: cached.models.clone(),
                    };
                }
                TagsResponse {
                    models: vec![self.fallback_entry()],
                }
            }
        }
    }

    fn fallback_entry(&self) -> ModelEntry {
        let meta = metadata::synthesize(&self.default_model);
        ModelEntry {
            name: self.default_model.clone(),
            model: self.default_model.clone(),
            modified_at: Utc::now().to_rfc3339(),
            size: meta.size,
            digest: FALLBACK_DIGEST.to_string(),
            details: details_from(meta),
        }
    }
}

fn build_entry(model: &UpstreamModel) -> ModelEntry {
    let meta = metadata::synthesize(&model.id);
    let modified_at = DateTime::<Utc>::from_timestamp(model.created, 0)
        .unwrap_or_else(Utc::now)
        .to_rfc3339();

    ModelEntry {
        name: model.id.clone(),
        model: model.id.clone(),
        modified_at,
        size: meta.size,
        digest: random_digest(),
        details: details_from(meta),
    }
}

fn details_from(meta: ModelMetadata) -> ModelDetails {
    ModelDetails {
        parent_model: String::new(),
        format: "gguf".to_string(),
        family: "llama".to_string(),
        families: vec!["llama".to_string()],
        parameter_size: meta.parameter_size.to_string(),
        quantization_level: meta.quantization_level.to_string(),
    }
}

/// Random 24-hex token shaped like a content digest.
fn random_digest() -> String {
    let mut bytes = [0u8; 12];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
