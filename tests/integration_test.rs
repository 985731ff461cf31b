use llamagate::catalog::{ModelCatalog, ModelFetcher, UpstreamModel};
use llamagate::config::ProxyConfig;
use llamagate::error::UpstreamError;
use llamagate::translation;
use llamagate::types::{ChatRequest, GenerateRequest, ResponseVariant, Role};

struct UnreachableUpstream;

#[async_trait::async_trait]
impl ModelFetcher for UnreachableUpstream {
    async fn fetch_models(&self) -> Result<Vec<UpstreamModel>, UpstreamError> {
        Err(UpstreamError::Status {
            status: 502,
            message: "bad gateway".to_string(),
        })
    }
}

#[test]
fn config_trims_upstream_base_url() {
    let config = ProxyConfig {
        port: 17924,
        upstream_base_url: "http://localhost:4000/".to_string(),
        api_key: "sk-test".to_string(),
        default_model: "gpt-4o-mini".to_string(),
        request_timeout_secs: 300,
    };

    assert_eq!(config.upstream_base_trimmed(), "http://localhost:4000");
}

#[tokio::test]
async fn tags_survive_an_unreachable_upstream() {
    let catalog = ModelCatalog::new(Box::new(UnreachableUpstream), "gpt-4o-mini");

    let tags = catalog.list_models().await;

    assert_eq!(tags.models.len(), 1);
    assert_eq!(tags.models[0].name, "gpt-4o-mini");
    assert_eq!(tags.models[0].model, "gpt-4o-mini");
    assert_eq!(tags.models[0].details.parameter_size, "8B");
    assert_eq!(tags.models[0].details.quantization_level, "Q4_K_M");
}

#[test]
fn chat_and_generate_default_to_streaming() {
    let chat: ChatRequest = serde_json::from_str(r#"{"model": "gpt-4o"}"#).unwrap();
    assert!(chat.wants_stream());

    let chat: ChatRequest =
        serde_json::from_str(r#"{"model": "gpt-4o", "stream": false}"#).unwrap();
    assert!(!chat.wants_stream());

    let gen: GenerateRequest =
        serde_json::from_str(r#"{"prompt": "hi", "stream": true}"#).unwrap();
    assert!(gen.wants_stream());
}

#[test]
fn generate_request_round_trips_through_translation() {
    let gen: GenerateRequest = serde_json::from_str(
        r#"{"prompt": "hi", "system": "be terse", "options": {"num_predict": 128}}"#,
    )
    .unwrap();

    let upstream = translation::generate_to_upstream(&gen, "gpt-4o-mini", true);
    assert_eq!(upstream.model, "gpt-4o-mini");
    assert_eq!(upstream.messages[0].role, Role::System);
    assert_eq!(upstream.messages[0].content, "be terse");
    assert_eq!(upstream.messages[1].role, Role::User);
    assert_eq!(upstream.messages[1].content, "hi");
    assert_eq!(upstream.max_tokens, 128);
    assert!(upstream.stream);

    let wire = serde_json::to_value(&upstream).unwrap();
    assert_eq!(wire["messages"][0]["role"], "system");
    assert_eq!(wire["stream"], true);
    let temperature = wire["temperature"].as_f64().unwrap();
    assert!((temperature - 0.7).abs() < 1e-6);
}

#[test]
fn terminal_chunks_are_schema_complete() {
    let chunk = translation::terminal_chunk("gpt-4o", ResponseVariant::Generate, "assistant", "", 3, 10);

    assert_eq!(chunk["done"], true);
    assert_eq!(chunk["done_reason"], "stop");
    assert_eq!(chunk["context"], serde_json::json!([]));
    for field in [
        "total_duration",
        "load_duration",
        "prompt_eval_duration",
        "eval_duration",
    ] {
        assert!(chunk[field].as_u64().is_some(), "missing {}", field);
    }
}
