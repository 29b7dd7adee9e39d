//! HTTP providers exercised against a local wiremock server.

use pressgate::providers::{
    Artifact, GenerationProvider, GenerationRequest, ImageGenerationProvider,
    OpenAiCompatibleProvider,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn chat_provider_returns_text_artifact() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "A fine draft."}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider =
        OpenAiCompatibleProvider::new("test", &format!("{}/v1", server.uri()), Some("test-key"));
    let request = GenerationRequest::text("write something", "gpt-4o-mini");

    let artifact = provider.generate(&request).await.unwrap();
    assert_eq!(artifact.as_text(), Some("A fine draft."));
}

#[tokio::test]
async fn chat_provider_sends_model_and_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "messages": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "write something"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "ok"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider =
        OpenAiCompatibleProvider::new("test", &format!("{}/v1", server.uri()), Some("test-key"));
    let request =
        GenerationRequest::text("write something", "gpt-4o-mini").with_system("be brief");

    provider.generate(&request).await.unwrap();
}

#[tokio::test]
async fn chat_provider_surfaces_api_errors_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let provider =
        OpenAiCompatibleProvider::new("test", &format!("{}/v1", server.uri()), Some("test-key"));
    let request = GenerationRequest::text("write something", "gpt-4o-mini");

    let err = provider.generate(&request).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("429"));
    assert!(message.contains("rate limited"));
}

#[tokio::test]
async fn chat_provider_truncates_huge_error_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(10_000)))
        .mount(&server)
        .await;

    let provider =
        OpenAiCompatibleProvider::new("test", &format!("{}/v1", server.uri()), Some("test-key"));
    let request = GenerationRequest::text("write something", "gpt-4o-mini");

    let err = provider.generate(&request).await.unwrap_err();
    assert!(err.to_string().len() < 1_000);
}

#[tokio::test]
async fn image_provider_decodes_b64_payload() {
    use base64::Engine as _;
    let png_bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    let encoded = base64::engine::general_purpose::STANDARD.encode(&png_bytes);

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"b64_json": encoded}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider =
        ImageGenerationProvider::new("test", &format!("{}/v1", server.uri()), Some("test-key"));
    let request = GenerationRequest::text("a lighthouse at dusk", "gpt-image-1");

    let artifact = provider.generate(&request).await.unwrap();
    match artifact {
        Artifact::Image { data, mime } => {
            assert_eq!(data, png_bytes);
            assert_eq!(mime, "image/png");
        }
        Artifact::Text(_) => panic!("expected an image artifact"),
    }
}

#[tokio::test]
async fn image_provider_rejects_empty_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    let provider =
        ImageGenerationProvider::new("test", &format!("{}/v1", server.uri()), Some("test-key"));
    let request = GenerationRequest::text("a lighthouse at dusk", "gpt-image-1");

    assert!(provider.generate(&request).await.is_err());
}
