//! Transport tests against a mock HTTP server.

use openai_session::client::{ApiClient, ClientError, FormPostable, Gettable, Postable};
use openai_session::form::{FormData, FormFile};
use openai_session::model::Params;
use openai_session::options::ClientOptions;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::io::Write;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{body_json, body_string_contains, header, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "sk-123";

fn client_for(server: &MockServer) -> ApiClient {
    let options = ClientOptions::new(API_KEY).with_base_url(format!("{}/v1", server.uri()));
    ApiClient::with_options(options).unwrap()
}

fn sse(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("Content-Type", "text/event-stream")
        .set_body_string(body)
}

#[tokio::test]
async fn test_get_sends_auth_and_json_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .and(header("Authorization", "Bearer sk-123"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data": []}"#))
        .expect(1)
        .mount(&server)
        .await;

    let body = client_for(&server).get("/v1/models").await.unwrap();
    assert_eq!(body, r#"{"data": []}"#);
}

#[tokio::test]
async fn test_delete_sends_auth_and_json_headers() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/files/file-1"))
        .and(header("Authorization", "Bearer sk-123"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("gone"))
        .expect(1)
        .mount(&server)
        .await;

    let body = client_for(&server).delete("/v1/files/file-1").await.unwrap();
    assert_eq!(body, "gone");
}

#[tokio::test]
async fn test_post_serializes_body_and_returns_raw_text() {
    let server = MockServer::start().await;
    let raw = "{ \"id\": \"cmpl-1\",\n  \"choices\": [] }";
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .and(header("Authorization", "Bearer sk-123"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({"model": "davinci", "prompt": "Hello"})))
        .respond_with(ResponseTemplate::new(200).set_body_string(raw))
        .expect(1)
        .mount(&server)
        .await;

    let params: Params = json!({"model": "davinci", "prompt": "Hello"})
        .as_object()
        .cloned()
        .unwrap();
    let body = client_for(&server)
        .post("/v1/completions", &params)
        .await
        .unwrap();

    assert_eq!(body, raw);
}

#[tokio::test]
async fn test_extra_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .and(header("OpenAI-Organization", "org-42"))
        .and(header("Authorization", "Bearer sk-123"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let options = ClientOptions::new(API_KEY)
        .with_base_url(format!("{}/v1", server.uri()))
        .with_header("OpenAI-Organization".to_string(), "org-42".to_string());
    let client = ApiClient::with_options(options).unwrap();

    client.get("/v1/models").await.unwrap();
}

#[tokio::test]
async fn test_non_success_status_is_remote_error_with_exact_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such model"))
        .mount(&server)
        .await;

    let err = client_for(&server).get("/v1/models/nope").await.unwrap_err();

    match err {
        ClientError::Remote { status, body } => {
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body, "no such model");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_context_length_rejection_is_its_own_variant() {
    let server = MockServer::start().await;
    let body = json!({
        "error": {
            "message": "This model's maximum context length is 4097 tokens.",
            "type": "invalid_request_error",
            "param": "messages",
            "code": "context_length_exceeded"
        }
    });
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(&body))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .post("/v1/chat/completions", &Params::new())
        .await
        .unwrap_err();

    assert!(err.is_context_length_exceeded());
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    assert_eq!(
        serde_json::from_str::<Value>(err.body().unwrap()).unwrap(),
        body
    );
}

#[tokio::test]
async fn test_streaming_delivers_each_frame_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer sk-123"))
        .and(header("Content-Type", "application/json"))
        .respond_with(sse("data: {\"a\":1}\n\ndata: {\"a\":2}\n\ndata: [DONE]\n\n"))
        .expect(1)
        .mount(&server)
        .await;

    let mut frames: Vec<Value> = Vec::new();
    let result = client_for(&server)
        .post_streaming(
            "/v1/chat/completions",
            &Params::new(),
            &mut |frame: &str| -> Result<(), ClientError> {
                frames.push(serde_json::from_str(frame)?);
                Ok(())
            },
        )
        .await;

    assert!(result.is_ok());
    assert_eq!(frames, vec![json!({"a": 1}), json!({"a": 2})]);
}

#[tokio::test]
async fn test_streaming_blank_lines_are_not_delivered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(sse("\n\ndata: {\"a\":1}\n   \n\r\ndata: [DONE]\n"))
        .mount(&server)
        .await;

    let mut calls = 0;
    client_for(&server)
        .post_streaming(
            "/v1/completions",
            &Params::new(),
            &mut |_frame: &str| -> Result<(), ClientError> {
                calls += 1;
                Ok(())
            },
        )
        .await
        .unwrap();

    assert_eq!(calls, 1);
}

#[tokio::test]
async fn test_streaming_error_status_fails_before_any_frame() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let mut calls = 0;
    let err = client_for(&server)
        .post_streaming(
            "/v1/chat/completions",
            &Params::new(),
            &mut |_frame: &str| -> Result<(), ClientError> {
                calls += 1;
                Ok(())
            },
        )
        .await
        .unwrap_err();

    assert_eq!(calls, 0);
    assert_eq!(err.status(), Some(StatusCode::TOO_MANY_REQUESTS));
    assert_eq!(err.body(), Some("slow down"));
}

#[tokio::test]
async fn test_streaming_without_sentinel_is_truncated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(sse("data: {\"a\":1}\n\ndata: {\"a\":2}\n\n"))
        .mount(&server)
        .await;

    let mut frames = Vec::new();
    let err = client_for(&server)
        .post_streaming(
            "/v1/chat/completions",
            &Params::new(),
            &mut |frame: &str| -> Result<(), ClientError> {
                frames.push(frame.to_string());
                Ok(())
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::StreamTruncated));
    assert_eq!(frames.len(), 2);
}

#[tokio::test]
async fn test_streaming_callback_error_is_propagated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(sse("data: {\"a\":1}\n\ndata: {\"a\":2}\n\ndata: [DONE]\n\n"))
        .mount(&server)
        .await;

    let mut calls = 0;
    let err = client_for(&server)
        .post_streaming(
            "/v1/chat/completions",
            &Params::new(),
            &mut |_frame: &str| -> Result<(), ClientError> {
                calls += 1;
                Err(ClientError::Precondition("stop".to_string()))
            },
        )
        .await
        .unwrap_err();

    assert_eq!(calls, 1);
    assert!(matches!(err, ClientError::Precondition(msg) if msg == "stop"));
}

#[tokio::test]
async fn test_post_raw_returns_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8, 159, 146, 150], "audio/mpeg"))
        .mount(&server)
        .await;

    let bytes = client_for(&server)
        .post_raw("/v1/audio/speech", &Params::new())
        .await
        .unwrap();

    assert_eq!(bytes.as_ref(), &[0u8, 159, 146, 150]);
}

#[tokio::test]
async fn test_multipart_post_sends_fields_and_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/files"))
        .and(header("Authorization", "Bearer sk-123"))
        .and(header_regex("Content-Type", "^multipart/form-data; boundary="))
        .and(body_string_contains("name=\"purpose\""))
        .and(body_string_contains("fine-tune"))
        .and(body_string_contains("{\"prompt\": \"x\"}"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"id\": \"file-1\"}"))
        .expect(1)
        .mount(&server)
        .await;

    let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
    writeln!(file, "{{\"prompt\": \"x\"}}").unwrap();

    let form = FormData::new()
        .file("file", FormFile::open(file.path()).unwrap())
        .text("purpose", "fine-tune");
    let body = client_for(&server)
        .post_form_multipart("/v1/files", form)
        .await
        .unwrap();

    assert_eq!(body, "{\"id\": \"file-1\"}");
}

#[tokio::test]
async fn test_routes_outside_api_root_are_rejected_locally() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.get("/admin").await.unwrap_err();
    assert!(matches!(err, ClientError::Precondition(_)));
}

#[tokio::test]
async fn test_unreadable_error_body_is_http_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = vec![0u8; 4096];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\n\r\npartial")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    let options = ClientOptions::new(API_KEY).with_base_url(format!("http://{}/v1", addr));
    let err = ApiClient::with_options(options)
        .unwrap()
        .get("/v1/models")
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Http(_)), "unexpected error: {err:?}");
}
