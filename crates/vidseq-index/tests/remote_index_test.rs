//! HTTP-level tests for the remote vector index client.

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vidseq_core::{Error, FrameRecord, VectorIndex};
use vidseq_index::RemoteVectorIndex;

fn record() -> FrameRecord {
    FrameRecord {
        task_id: "task-a".to_string(),
        video_path: "videos/task-a_demo.mp4".to_string(),
        frame_number: 4,
        timestamp: 8.0,
        frame_path: "frames/task-a_frame_4.jpg".to_string(),
        description: "a harbor at sunset".to_string(),
    }
}

#[tokio::test]
async fn upsert_posts_single_item() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/vectors/upsert"))
        .and(body_partial_json(json!({
            "vectors": [{"id": "task-a_frame_4"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"upserted_count": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let index = RemoteVectorIndex::new(server.uri(), Some("key".to_string()));
    index
        .upsert("task-a_frame_4", &[0.1, 0.2], &record())
        .await
        .unwrap();
}

#[tokio::test]
async fn query_returns_ranked_matches_with_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_partial_json(json!({"top_k": 5, "include_metadata": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "matches": [
                {"id": "task-a_frame_4", "score": 0.92, "metadata": {
                    "task_id": "task-a",
                    "video_path": "videos/task-a_demo.mp4",
                    "frame_number": 4,
                    "timestamp": 8.0,
                    "frame_path": "frames/task-a_frame_4.jpg",
                    "description": "a harbor at sunset"
                }}
            ]
        })))
        .mount(&server)
        .await;

    let index = RemoteVectorIndex::new(server.uri(), None);
    let matches = index.query(&[0.1, 0.2], 5).await.unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].record.frame_number, 4);
    assert!((matches[0].score - 0.92).abs() < 1e-6);
}

#[tokio::test]
async fn error_status_is_index_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(503).set_body_string("index unavailable"))
        .mount(&server)
        .await;

    let index = RemoteVectorIndex::new(server.uri(), None);
    let err = index.query(&[0.1], 5).await.unwrap_err();
    assert!(matches!(err, Error::Index(_)));
}
