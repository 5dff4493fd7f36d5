//! HTTP-level provider tests against a mock server.

use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use serde_json::json;
use vidseq_core::{DescriptionBackend, EmbeddingBackend, Error, FrameAnalysisProvider};
use vidseq_inference::{LocalProvider, RemoteProvider, RemoteProviderConfig};

fn local_provider(server: &MockServer) -> LocalProvider {
    LocalProvider::new(
        server.uri(),
        "llava".to_string(),
        "mxbai-embed-large".to_string(),
    )
}

fn remote_provider(server: &MockServer) -> RemoteProvider {
    RemoteProvider::new(RemoteProviderConfig {
        base_url: server.uri(),
        api_key: Some("sk-test".to_string()),
        dimension: 4,
        ..Default::default()
    })
}

// =============================================================================
// LOCAL PROVIDER
// =============================================================================

#[tokio::test]
async fn local_describe_parses_single_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({"model": "llava", "stream": false})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"response": "A park bench at noon."})),
        )
        .mount(&server)
        .await;

    let provider = local_provider(&server);
    let text = provider.describe(b"jpegbytes", "image/jpeg").await.unwrap();
    assert_eq!(text, "A park bench at noon.");
}

#[tokio::test]
async fn local_describe_concatenates_ndjson_stream() {
    let server = MockServer::start().await;
    let ndjson = "{\"response\": \"A park \"}\n{\"response\": \"bench \"}\n{\"response\": \"at noon.\"}\n";
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ndjson))
        .mount(&server)
        .await;

    let provider = local_provider(&server);
    let text = provider.describe(b"jpegbytes", "image/jpeg").await.unwrap();
    assert_eq!(text, "A park bench at noon.");
}

#[tokio::test]
async fn local_describe_unparseable_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let provider = local_provider(&server);
    let err = provider.describe(b"jpegbytes", "image/jpeg").await.unwrap_err();
    assert!(matches!(err, Error::MalformedProviderResponse(_)));
}

#[tokio::test]
async fn local_describe_error_status_is_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .mount(&server)
        .await;

    let provider = local_provider(&server);
    let err = provider.describe(b"jpegbytes", "image/jpeg").await.unwrap_err();
    match err {
        Error::Provider { backend, message } => {
            assert_eq!(backend, "ollama");
            assert!(message.contains("500"));
        }
        other => panic!("expected Provider error, got {:?}", other),
    }
}

#[tokio::test]
async fn local_embed_discovers_dimension_from_first_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"embeddings": [[0.1, 0.2, 0.3, 0.4, 0.5]]})),
        )
        .mount(&server)
        .await;

    let provider = local_provider(&server);
    let vector = provider.embed("a park bench").await.unwrap();
    assert_eq!(vector.len(), 5);
    assert_eq!(provider.dimension().await.unwrap(), 5);
}

#[tokio::test]
async fn local_dimension_probe_embeds_when_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"embeddings": [[1.0, 0.0, 0.0]]})),
        )
        .mount(&server)
        .await;

    let provider = local_provider(&server);
    assert_eq!(provider.dimension().await.unwrap(), 3);
}

#[tokio::test]
async fn local_health_check_reflects_tags_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": []})))
        .mount(&server)
        .await;

    let provider = local_provider(&server);
    assert!(provider.health_check().await.unwrap());
}

// =============================================================================
// REMOTE PROVIDER
// =============================================================================

#[tokio::test]
async fn remote_describe_returns_first_choice_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "A gravel path through pines."}}]
        })))
        .mount(&server)
        .await;

    let provider = remote_provider(&server);
    let text = provider.describe(b"jpegbytes", "image/jpeg").await.unwrap();
    assert_eq!(text, "A gravel path through pines.");
}

#[tokio::test]
async fn remote_embed_returns_vector_of_configured_dimension() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(body_partial_json(json!({"dimensions": 4})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"embedding": [0.25, 0.5, 0.75, 1.0]}]
        })))
        .mount(&server)
        .await;

    let provider = remote_provider(&server);
    let vector = provider.embed("a gravel path").await.unwrap();
    assert_eq!(vector, vec![0.25, 0.5, 0.75, 1.0]);
}

#[tokio::test]
async fn remote_embed_wrong_dimension_is_mismatch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"embedding": [0.25, 0.5]}]
        })))
        .mount(&server)
        .await;

    let provider = remote_provider(&server);
    let err = provider.embed("a gravel path").await.unwrap_err();
    assert!(matches!(
        err,
        Error::DimensionMismatch {
            expected: 4,
            actual: 2
        }
    ));
}

#[tokio::test]
async fn remote_error_status_is_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let provider = remote_provider(&server);
    let err = provider.embed("anything").await.unwrap_err();
    match err {
        Error::Provider { backend, message } => {
            assert_eq!(backend, "remote");
            assert!(message.contains("429"));
        }
        other => panic!("expected Provider error, got {:?}", other),
    }
}
