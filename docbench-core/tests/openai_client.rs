use docbench_core::catalog::{Credentials, ModelSpec, ProviderCatalog, ProviderSpec};
use docbench_core::contract::{GenerationRequest, Generator};
use docbench_core::error::GenerationError;
use docbench_core::providers::OpenAiCompatibleClient;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OpenAiCompatibleClient {
    let catalog = ProviderCatalog::from_providers(vec![ProviderSpec {
        name: "local".into(),
        base_url: format!("{}/v1/", server.uri()),
        models: vec![ModelSpec {
            name: "tiny".into(),
            max_tokens: 4000,
        }],
    }]);
    let credentials = Credentials::default().with_key("local", "sk-test");
    OpenAiCompatibleClient::new(&catalog, &credentials)
}

fn request(timeout: Duration) -> GenerationRequest {
    GenerationRequest {
        provider: "local".into(),
        model: "tiny".into(),
        prompt: "Write a README".into(),
        max_output_tokens: 3200,
        timeout,
    }
}

#[tokio::test]
async fn test_successful_completion_returns_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "tiny", "max_tokens": 3200})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "# Project"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = client_for(&server).generate(request(Duration::from_secs(5))).await.unwrap();
    assert_eq!(text, "# Project");
}

#[tokio::test]
async fn test_missing_model_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_string("The model `tiny` does not exist"))
        .mount(&server)
        .await;

    let err = client_for(&server).generate(request(Duration::from_secs(5))).await.unwrap_err();
    assert_eq!(err, GenerationError::ModelNotFound("tiny".into()));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_rate_limit_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let err = client_for(&server).generate(request(Duration::from_secs(5))).await.unwrap_err();
    assert!(matches!(err, GenerationError::RateLimited(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(2))
                .set_body_json(json!({"choices": []})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate(request(Duration::from_millis(200)))
        .await
        .unwrap_err();
    assert!(err.is_timeout(), "{err:?}");
}

#[tokio::test]
async fn test_empty_choices_are_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = client_for(&server).generate(request(Duration::from_secs(5))).await.unwrap_err();
    assert!(matches!(err, GenerationError::InvalidResponse(_)));
}
