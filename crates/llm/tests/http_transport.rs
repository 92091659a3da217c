use std::sync::Arc;
use std::time::Duration;

use chat::{
    ApiKey, BackendConfig, BatchJob, ChatTransport, JitteredBackoffPolicy, ModelId, NoProgress,
    RequestSpec, TransportError,
};
use httpmock::Method::POST;
use httpmock::MockServer;
use llm::{ChatClient, Dispatcher, HttpTransport};
use serde_json::json;

fn backend(server: &MockServer) -> BackendConfig {
    BackendConfig::new(server.url("/v1"), ApiKey::new("sk-test"))
}

fn spec(prompt: &str) -> RequestSpec {
    RequestSpec::new(ModelId::new("deepseek-chat").unwrap(), prompt)
}

fn completion(texts: &[&str]) -> serde_json::Value {
    let choices: Vec<_> = texts
        .iter()
        .enumerate()
        .map(|(i, t)| json!({"index": i, "message": {"role": "assistant", "content": t}}))
        .collect();
    json!({"id": "chatcmpl-1", "object": "chat.completion", "choices": choices})
}

#[tokio::test]
async fn posts_openai_request_with_bearer_credential() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer sk-test")
                .json_body_partial(
                    r#"{"model":"deepseek-chat","messages":[{"role":"user","content":"hello"}],"n":1}"#,
                );
            then.status(200)
                .header("content-type", "application/json")
                .json_body(completion(&["hi there"]));
        })
        .await;

    let texts = HttpTransport::new()
        .send(&backend(&server), &spec("hello"))
        .await
        .unwrap();
    mock.assert_async().await;
    assert_eq!(texts, vec!["hi there".to_string()]);
}

#[tokio::test]
async fn error_status_carries_code_and_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(429).body("slow down");
        })
        .await;

    let err = HttpTransport::new()
        .send(&backend(&server), &spec("hello"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TransportError::Status {
            status: 429,
            body: "slow down".into(),
        }
    );
}

#[tokio::test]
async fn undecodable_body_is_malformed() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"unexpected": true}"#);
        })
        .await;

    let err = HttpTransport::new()
        .send(&backend(&server), &spec("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Malformed(_)));
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200)
                .delay(Duration::from_secs(3))
                .json_body(completion(&["too late"]));
        })
        .await;

    let request = spec("hello").with_timeout(Duration::from_millis(100));
    let err = HttpTransport::new()
        .send(&backend(&server), &request)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TransportError::Timeout {
            after: Duration::from_millis(100)
        }
    );
}

#[tokio::test]
async fn client_retries_against_real_http() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(500).body("boom");
        })
        .await;

    let client = ChatClient::new(backend(&server), Arc::new(HttpTransport::new()));
    let err = client.complete(&spec("hello")).await.unwrap_err();
    assert!(err.to_string().contains(&server.url("/v1")));
    assert_eq!(mock.hits_async().await, 3);
}

#[tokio::test]
async fn batch_over_http_keeps_prompt_order() {
    let server = MockServer::start_async().await;
    for i in 0..4 {
        let prompt = format!("q{i}");
        let answer = format!("a{i}");
        server
            .mock_async(move |when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .body_contains(format!(r#""content":"{prompt}""#));
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(completion(&[answer.as_str()]));
            })
            .await;
    }

    let client = ChatClient::new(backend(&server), Arc::new(HttpTransport::new()));
    let dispatcher = Dispatcher::new(client)
        .with_retry_policy(Arc::new(JitteredBackoffPolicy::new(2, Duration::ZERO)))
        .with_progress(Arc::new(NoProgress));
    let prompts = (0..4).map(|i| format!("q{i}")).collect();
    let report = dispatcher
        .run(BatchJob::new(ModelId::new("deepseek-chat").unwrap(), prompts, 3))
        .await;

    assert_eq!(report.results, vec!["a0", "a1", "a2", "a3"]);
}
