//! Crate-level convenience functions
//!
//! The default client is process-global, so the whole lifecycle runs in one
//! test.

#![cfg(feature = "env")]

use double_o::{Client, get_secret, invalidate_cache};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{TEST_TOKEN, client_for, secret_response};

#[tokio::test]
async fn test_default_client_lifecycle() {
    let server = MockServer::start().await;

    Mock::given(path("/api/secret"))
        .and(query_param("token", TEST_TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(secret_response("sk-global")))
        .expect(2)
        .mount(&server)
        .await;

    double_o::reset_default_client();
    // No default client yet: nothing to invalidate, nothing created.
    invalidate_cache(None).await;

    let first = temp_env::with_var("DOUBLE_O_BASE_URL", Some(server.uri()), || {
        double_o::default_client()
    })
    .unwrap();

    let ttl = Some(Duration::from_secs(300));
    assert_eq!(get_secret(TEST_TOKEN, ttl).await.unwrap(), "sk-global");
    assert_eq!(get_secret(TEST_TOKEN, ttl).await.unwrap(), "sk-global");

    let second = double_o::default_client().unwrap();
    assert!(Arc::ptr_eq(first.cache(), second.cache()));
    assert_eq!(second.cache().len().await, 1);

    invalidate_cache(Some(TEST_TOKEN)).await;
    assert!(first.cache().is_empty().await);
    assert_eq!(get_secret(TEST_TOKEN, ttl).await.unwrap(), "sk-global");

    let replacement: Client = client_for(&server, 0);
    let previous = double_o::set_default_client(replacement.clone()).unwrap();
    assert!(Arc::ptr_eq(previous.cache(), first.cache()));
    assert!(Arc::ptr_eq(
        double_o::default_client().unwrap().cache(),
        replacement.cache()
    ));

    assert!(double_o::reset_default_client().is_some());
    assert!(double_o::reset_default_client().is_none());
}
