//! Blocking client tests against a mock server
//!
//! The mock server needs a tokio runtime; the blocking client must run
//! outside one. Each test builds a runtime only to start and program the
//! server, then makes its blocking calls from the plain test thread.

#![cfg(feature = "blocking")]

use assert_matches::assert_matches;
use double_o::{ChatCompletionRequest, ChatMessage, Error, blocking};
use serde_json::json;
use std::time::Duration;
use tokio::runtime::Runtime;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{TEST_TOKEN, blocking_client_for, env_response, secret_response};

fn start_server(rt: &Runtime, mocks: Vec<Mock>) -> MockServer {
    rt.block_on(async {
        let server = MockServer::start().await;
        for mock in mocks {
            mock.mount(&server).await;
        }
        server
    })
}

#[test]
fn test_blocking_get_secret_with_cache() {
    let rt = Runtime::new().unwrap();
    let server = start_server(
        &rt,
        vec![
            Mock::given(method("GET"))
                .and(path("/api/secret"))
                .and(query_param("token", TEST_TOKEN))
                .respond_with(ResponseTemplate::new(200).set_body_json(secret_response("sk-abc")))
                .expect(1),
        ],
    );

    let client = blocking_client_for(&server.uri(), 0);
    let ttl = Some(Duration::from_secs(60));

    assert_eq!(client.get_secret(TEST_TOKEN, ttl).unwrap(), "sk-abc");
    assert_eq!(client.get_secret(TEST_TOKEN, ttl).unwrap(), "sk-abc");
    assert_eq!(client.cache().len(), 1);
}

#[test]
fn test_blocking_retries_server_errors() {
    let rt = Runtime::new().unwrap();
    let server = start_server(
        &rt,
        vec![
            Mock::given(path("/api/env"))
                .respond_with(ResponseTemplate::new(502))
                .expect(3),
        ],
    );

    let err = blocking_client_for(&server.uri(), 2)
        .get_env(TEST_TOKEN, Some(Duration::from_secs(60)))
        .unwrap_err();

    assert_matches!(err, Error::Env { status: Some(502), .. });
}

#[test]
fn test_blocking_load_env() {
    let rt = Runtime::new().unwrap();
    let server = start_server(
        &rt,
        vec![
            Mock::given(path("/api/env"))
                .respond_with(ResponseTemplate::new(200).set_body_json(env_response(&[(
                    "DOUBLE_O_IT_BLOCKING_LOADED",
                    "yes",
                )]))),
        ],
    );

    temp_env::with_var_unset("DOUBLE_O_IT_BLOCKING_LOADED", || {
        let env = blocking_client_for(&server.uri(), 0)
            .load_env(TEST_TOKEN, None)
            .unwrap();

        assert_eq!(env["DOUBLE_O_IT_BLOCKING_LOADED"], "yes");
        assert_eq!(
            std::env::var("DOUBLE_O_IT_BLOCKING_LOADED").unwrap(),
            "yes"
        );
    });
}

#[test]
fn test_blocking_chat_completion() {
    let rt = Runtime::new().unwrap();
    let server = start_server(
        &rt,
        vec![
            Mock::given(method("POST"))
                .and(path("/api/proxy/v1/chat/completions"))
                .and(header("authorization", "Bearer proxy-token"))
                .and(body_json(json!({
                    "model": "gpt-4o",
                    "messages": [{"role": "user", "content": "Hi"}]
                })))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "chat-1"})))
                .expect(1),
        ],
    );

    let reply = blocking_client_for(&server.uri(), 0)
        .chat_completion(
            "proxy-token",
            ChatCompletionRequest::new(vec![ChatMessage::user("Hi")]).model("gpt-4o"),
        )
        .unwrap();

    assert_eq!(reply["id"], "chat-1");
}

#[test]
fn test_blocking_close_reopens_session() {
    let rt = Runtime::new().unwrap();
    let server = start_server(
        &rt,
        vec![
            Mock::given(path("/api/secret"))
                .respond_with(ResponseTemplate::new(200).set_body_json(secret_response("sk-abc")))
                .expect(2),
        ],
    );

    let client = blocking_client_for(&server.uri(), 0);
    client.get_secret(TEST_TOKEN, None).unwrap();
    client.close();
    client.get_secret(TEST_TOKEN, None).unwrap();
}

#[test]
fn test_blocking_unauthorized() {
    let rt = Runtime::new().unwrap();
    let server = start_server(
        &rt,
        vec![
            Mock::given(path("/api/secret"))
                .respond_with(ResponseTemplate::new(401))
                .expect(1),
        ],
    );

    let err = blocking_client_for(&server.uri(), 3)
        .get_secret(TEST_TOKEN, None)
        .unwrap_err();
    assert!(err.is_authentication());
}

#[cfg(feature = "env")]
#[test]
fn test_blocking_default_client_lifecycle() {
    let rt = Runtime::new().unwrap();
    let server = start_server(
        &rt,
        vec![
            Mock::given(path("/api/secret"))
                .respond_with(ResponseTemplate::new(200).set_body_json(secret_response("sk-global")))
                .expect(1),
        ],
    );

    blocking::global::reset_default_client();
    blocking::global::invalidate_cache(None);

    temp_env::with_var("DOUBLE_O_BASE_URL", Some(server.uri()), || {
        blocking::global::default_client().unwrap();
    });

    let ttl = Some(Duration::from_secs(60));
    assert_eq!(blocking::global::get_secret(TEST_TOKEN, ttl).unwrap(), "sk-global");
    assert_eq!(blocking::global::get_secret(TEST_TOKEN, ttl).unwrap(), "sk-global");

    blocking::global::invalidate_cache(None);
    assert!(blocking::global::default_client().unwrap().cache().is_empty());
    assert!(blocking::global::reset_default_client().is_some());
}
