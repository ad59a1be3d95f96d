//! HTTP API tests against an in-memory database with mocked providers.

mod common;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use chrono::{Duration, Utc};
use common::mocks::MockLLMClient;
use common::{test_config, write_config, TestApp, TEST_MAX_FILE_SIZE};
use rstest::rstest;
use serde_json::{json, Value};

fn text_file(name: &str, body: &str) -> Part {
    Part::bytes(body.as_bytes().to_vec())
        .file_name(name.to_string())
        .mime_type("text/plain")
}

async fn upload(server: &TestServer, name: &str, body: &str, is_public: bool) -> Value {
    let form = MultipartForm::new()
        .add_text("is_public", if is_public { "true" } else { "false" })
        .add_part("file", text_file(name, body));
    let response = server.post("/api/documents/upload").multipart(form).await;
    response.assert_status_ok();
    response.json()
}

const RUST_NOTES: &str = "Rust ownership means every value has a single owner. \
    Borrowing lets code use a value without taking ownership.";
const GARDEN_NOTES: &str = "Tomatoes need full sun and regular watering. \
    Mulch keeps the garden soil moist.";

// =============================================================================
// Service info
// =============================================================================

#[tokio::test]
async fn test_root_banner() {
    let app = TestApp::new().await;
    let server = app.server();

    let response = server.get("/").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Knowledge Assistant API is running!");
    assert_eq!(body["status"], "healthy");
    let docs = if cfg!(feature = "swagger-ui") {
        "/docs"
    } else {
        "/api/openapi.json"
    };
    assert_eq!(body["docs"], docs);
}

#[tokio::test]
async fn test_health_reports_database_and_upload_dir() {
    let app = TestApp::new().await;
    let server = app.server();

    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["upload_dir"], true);
}

#[cfg(not(feature = "swagger-ui"))]
#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = TestApp::new().await;
    let server = app.server();

    let response = server.get("/api/openapi.json").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["paths"]["/api/chat"].is_object());
    assert!(body["paths"]["/api/public/share"].is_object());
}

// =============================================================================
// Upload
// =============================================================================

#[tokio::test]
async fn test_upload_text_document() {
    let app = TestApp::new().await;
    let server = app.server();

    let body = upload(&server, "rust.txt", RUST_NOTES, false).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["filename"], "rust.txt");
    assert_eq!(body["chunks_created"], 1);
    assert_eq!(body["metadata"]["extraction_method"], "text_file");
    assert_eq!(body["metadata"]["extraction_confidence"], 100.0);
    assert_eq!(body["metadata"]["total_pages"], 1);

    // Original bytes are kept on disk under <uuid>_<name>
    let stored = body["metadata"]["file_path"].as_str().unwrap();
    assert!(stored.ends_with("_rust.txt"));
    assert_eq!(std::fs::read_to_string(stored).unwrap(), RUST_NOTES);

    let id = body["document_id"].as_str().unwrap();
    let document: Value = server.get(&format!("/api/documents/{}", id)).await.json();
    assert_eq!(document["content"], RUST_NOTES);
    assert_eq!(document["file_type"], "txt");
    assert_eq!(document["is_public"], false);
}

#[tokio::test]
async fn test_upload_image_uses_ocr() {
    let app = TestApp::new().await;
    let server = app.server();

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(vec![0x89, b'P', b'N', b'G'])
            .file_name("receipt.png")
            .mime_type("image/png"),
    );
    let response = server.post("/api/documents/upload").multipart(form).await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["metadata"]["extraction_method"], "ocr_extraction");
    assert_eq!(body["metadata"]["extraction_confidence"], 91.0);
    assert_eq!(body["metadata"]["ocr_details"]["words_detected"], 3);
    assert_eq!(body["text_preview"], "Scanned receipt total 42");
}

#[tokio::test]
async fn test_long_upload_is_chunked_and_previewed() {
    let app = TestApp::new().await;
    let server = app.server();

    let text = "The quick brown fox jumps over the lazy dog. ".repeat(30);
    let body = upload(&server, "fox.txt", &text, false).await;

    assert!(body["chunks_created"].as_u64().unwrap() > 1);
    let preview = body["text_preview"].as_str().unwrap();
    assert!(preview.ends_with("..."));
    assert_eq!(preview.chars().count(), 503);
}

#[rstest]
#[case("malware.exe", "MZ", "Unsupported file type: exe")]
#[case("empty.txt", "", "Empty file")]
#[tokio::test]
async fn test_upload_rejections(
    #[case] name: &str,
    #[case] body: &str,
    #[case] expected: &str,
) {
    let app = TestApp::new().await;
    let server = app.server();

    let form = MultipartForm::new().add_part("file", text_file(name, body));
    let response = server.post("/api/documents/upload").multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: Value = response.json();
    assert!(
        error["error"].as_str().unwrap().starts_with(expected),
        "unexpected error: {}",
        error
    );
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let app = TestApp::new().await;
    let server = app.server();

    let form = MultipartForm::new().add_text("is_public", "true");
    let response = server.post("/api/documents/upload").multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "Missing 'file' field");
}

#[tokio::test]
async fn test_upload_too_large() {
    let app = TestApp::new().await;
    let server = app.server();

    let body = "a".repeat(TEST_MAX_FILE_SIZE + 1);
    let form = MultipartForm::new().add_part("file", text_file("big.txt", &body));
    let response = server.post("/api/documents/upload").multipart(form).await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    let error: Value = response.json();
    assert!(error["error"]
        .as_str()
        .unwrap()
        .starts_with("File too large. Maximum size:"));

    // Nothing was stored
    assert_eq!(std::fs::read_dir(app.upload_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_upload_limit_follows_reloaded_config() {
    let (app, config_path) = TestApp::from_config_file().await;
    let server = app.server();

    let body = "a".repeat(TEST_MAX_FILE_SIZE * 2);
    let form = || MultipartForm::new().add_part("file", text_file("big.txt", &body));

    server
        .post("/api/documents/upload")
        .multipart(form())
        .await
        .assert_status(StatusCode::PAYLOAD_TOO_LARGE);

    let mut config = test_config(&app.upload_dir);
    config.storage.max_file_size = TEST_MAX_FILE_SIZE * 4;
    write_config(&config_path, &config);
    app.state.config_manager.reload().unwrap();

    let response = server.post("/api/documents/upload").multipart(form()).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["filename"], "big.txt");
}

// =============================================================================
// Search, listing and deletion
// =============================================================================

#[tokio::test]
async fn test_search_ranks_matching_document_first() {
    let app = TestApp::new().await;
    let server = app.server();

    upload(&server, "rust.txt", RUST_NOTES, true).await;
    upload(&server, "garden.txt", GARDEN_NOTES, true).await;

    let response = server
        .get("/api/documents/search")
        .add_query_param("query", "ownership and borrowing a value")
        .add_query_param("k", 2)
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["total_results"], 2);
    assert_eq!(body["results"][0]["document_name"], "rust.txt");
    let first = body["results"][0]["similarity_score"].as_f64().unwrap();
    let second = body["results"][1]["similarity_score"].as_f64().unwrap();
    assert!(first > second);
}

#[tokio::test]
async fn test_search_can_exclude_private_documents() {
    let app = TestApp::new().await;
    let server = app.server();

    upload(&server, "private.txt", RUST_NOTES, false).await;
    upload(&server, "public.txt", GARDEN_NOTES, true).await;

    let body: Value = server
        .get("/api/documents/search")
        .add_query_param("query", "ownership")
        .add_query_param("include_private", false)
        .await
        .json();

    let names: Vec<&str> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["document_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["public.txt"]);
}

#[tokio::test]
async fn test_private_hits_are_dropped_after_ranking() {
    let app = TestApp::new().await;
    let server = app.server();

    upload(&server, "private.txt", RUST_NOTES, false).await;
    upload(&server, "public.txt", GARDEN_NOTES, true).await;

    // The private chunk takes the only slot, so nothing is left once it is dropped
    let body: Value = server
        .get("/api/documents/search")
        .add_query_param("query", "ownership")
        .add_query_param("k", 1)
        .add_query_param("include_private", false)
        .await
        .json();
    assert_eq!(body["total_results"], 0);

    let body: Value = server
        .get("/api/documents/search")
        .add_query_param("query", "ownership")
        .add_query_param("k", 1)
        .await
        .json();
    assert_eq!(body["total_results"], 1);
    assert_eq!(body["results"][0]["document_name"], "private.txt");
}

#[rstest]
#[case("", "5", "Query cannot be empty")]
#[case("   ", "5", "Query cannot be empty")]
#[case("rust", "0", "k must be between 1 and 20")]
#[case("rust", "21", "k must be between 1 and 20")]
#[tokio::test]
async fn test_search_validation(#[case] query: &str, #[case] k: &str, #[case] expected: &str) {
    let app = TestApp::new().await;
    let server = app.server();

    let response = server
        .get("/api/documents/search")
        .add_query_param("query", query)
        .add_query_param("k", k)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], expected);
}

#[tokio::test]
async fn test_list_public_and_stats() {
    let app = TestApp::new().await;
    let server = app.server();

    upload(&server, "a.txt", RUST_NOTES, false).await;
    upload(&server, "b.txt", GARDEN_NOTES, true).await;

    let all: Value = server.get("/api/documents").await.json();
    assert_eq!(all["total"], 2);
    // Newest first
    assert_eq!(all["documents"][0]["filename"], "b.txt");

    let public: Value = server.get("/api/documents/public").await.json();
    assert_eq!(public["total"], 1);
    assert_eq!(public["documents"][0]["filename"], "b.txt");

    let stats: Value = server.get("/api/documents/stats/summary").await.json();
    assert_eq!(stats["total_documents"], 2);
    assert_eq!(stats["public_documents"], 1);
    assert_eq!(stats["private_documents"], 1);
    assert_eq!(stats["file_type_distribution"]["txt"], 2);

    let response = server
        .get("/api/documents")
        .add_query_param("limit", 101)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "Limit cannot exceed 100");
}

#[tokio::test]
async fn test_delete_document_removes_file_and_chunks() {
    let app = TestApp::new().await;
    let server = app.server();

    let body = upload(&server, "rust.txt", RUST_NOTES, false).await;
    let id = body["document_id"].as_str().unwrap().to_string();
    let stored = body["metadata"]["file_path"].as_str().unwrap().to_string();

    let response = server.delete(&format!("/api/documents/{}", id)).await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["message"],
        "Document deleted successfully"
    );

    assert!(!std::path::Path::new(&stored).exists());
    assert!(app
        .state
        .turso
        .chunks_with_embeddings()
        .await
        .unwrap()
        .iter()
        .all(|chunk| chunk.document_id != id));
    server
        .get(&format!("/api/documents/{}", id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .delete(&format!("/api/documents/{}", id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// =============================================================================
// Chat
// =============================================================================

#[tokio::test]
async fn test_chat_answers_with_sources() {
    let app = TestApp::with_llm(MockLLMClient::new("Every value has one owner.")).await;
    let server = app.server();

    upload(&server, "rust.txt", RUST_NOTES, false).await;

    let response = server
        .post("/api/chat")
        .json(&json!({
            "message": "What does ownership mean in Rust?",
            "mode": "summarize",
            "max_sources": 3
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["response"], "Every value has one owner.");
    assert_eq!(body["mode"], "summarize");
    assert_eq!(body["sources"][0]["id"], 1);
    assert_eq!(body["sources"][0]["document_name"], "rust.txt");
    assert_eq!(
        body["context_summary"],
        "Found 1 relevant text segments from 1 documents."
    );
    assert!(body["reasoning"]
        .as_str()
        .unwrap()
        .starts_with("Based on 1 relevant text segments"));
    let confidence = body["confidence_score"].as_f64().unwrap();
    assert!(confidence > 0.0 && confidence <= 1.0);
    assert!(!body["session_id"].as_str().unwrap().is_empty());

    let prompts = app.llm.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].1.contains("Source: rust.txt (Chunk 1)"));
    assert!(prompts[0].1.contains("USER QUESTION: What does ownership mean in Rust?"));
}

#[tokio::test]
async fn test_chat_without_documents() {
    let app = TestApp::new().await;
    let server = app.server();

    let body: Value = server
        .post("/api/chat")
        .json(&json!({ "message": "Anything there?" }))
        .await
        .json();

    assert_eq!(body["sources"], json!([]));
    assert_eq!(body["context_summary"], "No context available");
    assert_eq!(body["confidence_score"], 0.1);
    assert_eq!(body["mode"], "chat");
}

#[tokio::test]
async fn test_chat_survives_llm_failure() {
    let app = TestApp::with_llm(MockLLMClient::failing()).await;
    let server = app.server();

    let response = server
        .post("/api/chat")
        .json(&json!({ "message": "Hello?", "session_id": "s-1" }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["reasoning"], "Error in AI response generation");
    assert!(body["response"]
        .as_str()
        .unwrap()
        .starts_with("I apologize"));

    // The failed turn is still recorded
    let history: Value = server.get("/api/chat/history/s-1").await.json();
    assert_eq!(history["total"], 1);
}

#[rstest]
#[case(json!({ "message": "" }), "Message must be between 1 and 2000 characters")]
#[case(json!({ "message": "x".repeat(2001) }), "Message must be between 1 and 2000 characters")]
#[case(json!({ "message": "hi", "mode": "poetry" }), "Invalid mode. Must be one of: chat, summarize, insights, planning")]
#[case(json!({ "message": "hi", "max_sources": 0 }), "max_sources must be between 1 and 10")]
#[case(json!({ "message": "hi", "max_sources": 11 }), "max_sources must be between 1 and 10")]
#[tokio::test]
async fn test_chat_validation(#[case] payload: Value, #[case] expected: &str) {
    let app = TestApp::new().await;
    let server = app.server();

    let response = server.post("/api/chat").json(&payload).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], expected);
}

#[tokio::test]
async fn test_chat_history_roundtrip() {
    let app = TestApp::new().await;
    let server = app.server();

    for message in ["first question", "second question"] {
        server
            .post("/api/chat")
            .json(&json!({ "message": message, "session_id": "session-42" }))
            .await
            .assert_status_ok();
    }

    let history: Value = server.get("/api/chat/history/session-42").await.json();
    assert_eq!(history["total"], 2);
    assert_eq!(history["conversations"][0]["user_message"], "second question");

    let limited: Value = server
        .get("/api/chat/history/session-42")
        .add_query_param("limit", 1)
        .await
        .json();
    assert_eq!(limited["total"], 1);

    server
        .get("/api/chat/history/session-42")
        .add_query_param("limit", 101)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let cleared: Value = server.delete("/api/chat/history/session-42").await.json();
    assert_eq!(cleared["deleted"], 2);
    assert_eq!(cleared["message"], "Chat history cleared for session session-42");

    let history: Value = server.get("/api/chat/history/session-42").await.json();
    assert_eq!(history["total"], 0);
}

#[tokio::test]
async fn test_chat_modes_catalogue() {
    let app = TestApp::new().await;
    let server = app.server();

    let body: Value = server.get("/api/chat/modes").await.json();
    let names: Vec<&str> = body["modes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["chat", "summarize", "insights", "planning"]);
}

// =============================================================================
// Public shares
// =============================================================================

async fn share(server: &TestServer, document_id: &str, days: Option<i64>) -> Value {
    let mut payload = json!({ "document_id": document_id });
    if let Some(days) = days {
        payload["expires_in_days"] = json!(days);
    }
    let response = server.post("/api/public/share").json(&payload).await;
    response.assert_status_ok();
    response.json()
}

#[tokio::test]
async fn test_share_lifecycle() {
    let app = TestApp::new().await;
    let server = app.server();

    let uploaded = upload(&server, "rust.txt", RUST_NOTES, false).await;
    let id = uploaded["document_id"].as_str().unwrap();

    let shared = share(&server, id, Some(7)).await;
    let token = shared["share_token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 43);
    assert_eq!(
        shared["public_url"],
        format!("https://kassist.test/public/{}", token)
    );
    assert_eq!(shared["document_name"], "rust.txt");
    assert!(shared["expires_at"].is_string());

    // Sharing marks the document public
    let document: Value = server.get(&format!("/api/documents/{}", id)).await.json();
    assert_eq!(document["is_public"], true);

    let public: Value = server
        .get(&format!("/api/public/document/{}", token))
        .await
        .json();
    assert_eq!(public["content"], RUST_NOTES);
    assert_eq!(public["share_info"]["share_token"], token.as_str());

    let download = server.get(&format!("/api/public/download/{}", token)).await;
    download.assert_status_ok();
    assert_eq!(download.as_bytes().as_ref(), RUST_NOTES.as_bytes());
    assert_eq!(
        download.header("content-disposition"),
        "attachment; filename=\"rust.txt\""
    );

    let listed: Value = server.get("/api/public/list").await.json();
    assert_eq!(listed["total"], 1);
    assert_eq!(listed["documents"][0]["share_token"], token.as_str());
    assert_eq!(listed["documents"][0]["metadata"]["extraction_method"], "text_file");

    let stats: Value = server.get("/api/public/stats").await.json();
    assert_eq!(stats["total_public_documents"], 1);
    assert_eq!(stats["total_shares"], 1);

    let revoked = server.delete(&format!("/api/public/share/{}", token)).await;
    revoked.assert_status_ok();
    assert_eq!(
        revoked.json::<Value>()["message"],
        "Public share revoked successfully"
    );

    server
        .get(&format!("/api/public/document/{}", token))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .delete(&format!("/api/public/share/{}", token))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let document: Value = server.get(&format!("/api/documents/{}", id)).await.json();
    assert_eq!(document["is_public"], false);
}

#[tokio::test]
async fn test_resharing_replaces_token() {
    let app = TestApp::new().await;
    let server = app.server();

    let uploaded = upload(&server, "rust.txt", RUST_NOTES, false).await;
    let id = uploaded["document_id"].as_str().unwrap();

    let first = share(&server, id, None).await;
    let second = share(&server, id, None).await;
    assert_ne!(first["share_token"], second["share_token"]);
    assert!(second["expires_at"].is_null());

    let stats: Value = server.get("/api/public/stats").await.json();
    assert_eq!(stats["total_shares"], 1);

    server
        .get(&format!(
            "/api/public/document/{}",
            first["share_token"].as_str().unwrap()
        ))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_share_errors() {
    let app = TestApp::new().await;
    let server = app.server();

    let response = server
        .post("/api/public/share")
        .json(&json!({ "document_id": "missing" }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"], "Document not found");

    let uploaded = upload(&server, "rust.txt", RUST_NOTES, false).await;
    let response = server
        .post("/api/public/share")
        .json(&json!({
            "document_id": uploaded["document_id"],
            "expires_in_days": 0
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    server
        .get("/api/public/download/not-a-token")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_expired_share_is_gone() {
    let app = TestApp::new().await;
    let server = app.server();

    let uploaded = upload(&server, "rust.txt", RUST_NOTES, false).await;
    let id = uploaded["document_id"].as_str().unwrap();

    app.state
        .turso
        .upsert_share(id, "expired-token", Some(Utc::now() - Duration::hours(1)))
        .await
        .unwrap();

    let response = server.get("/api/public/document/expired-token").await;
    response.assert_status(StatusCode::GONE);
    assert_eq!(response.json::<Value>()["error"], "Public share has expired");

    server
        .get("/api/public/download/expired-token")
        .await
        .assert_status(StatusCode::GONE);
}

#[tokio::test]
async fn test_download_when_file_is_missing() {
    let app = TestApp::new().await;
    let server = app.server();

    let uploaded = upload(&server, "rust.txt", RUST_NOTES, false).await;
    let id = uploaded["document_id"].as_str().unwrap();
    std::fs::remove_file(uploaded["metadata"]["file_path"].as_str().unwrap()).unwrap();

    let shared = share(&server, id, None).await;
    let response = server
        .get(&format!(
            "/api/public/download/{}",
            shared["share_token"].as_str().unwrap()
        ))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"], "File not found on server");
}
