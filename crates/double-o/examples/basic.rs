//! Example fetching secrets and calling the proxy with the async client
//!
//! This example shows how to:
//! 1. Configure a client from `DOUBLE_O_*` variables
//! 2. Fetch a secret with caching
//! 3. Load an environment map into the process environment
//! 4. Send a chat completion through the proxy
//!
//! # Prerequisites
//!
//! ```bash
//! export DOUBLE_O_SECRET_TOKEN=...
//! export DOUBLE_O_ENV_TOKEN=...
//! export DOUBLE_O_PROXY_TOKEN=...
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --example basic
//! ```

use double_o::{ChatCompletionRequest, ChatMessage, Client, Error};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "trace")]
    double_o::observability::init_tracing();

    let client = Client::from_env()?;
    let ttl = Some(Duration::from_secs(300));

    let secret_token = std::env::var("DOUBLE_O_SECRET_TOKEN")?;
    match client.get_secret(&secret_token, ttl).await {
        Ok(secret) => println!("Fetched a secret of {} characters", secret.len()),
        Err(Error::Authentication { message, .. }) => {
            eprintln!("Secret token rejected: {message}");
        }
        Err(e) => return Err(e.into()),
    }

    // Served from the cache this time.
    client.get_secret(&secret_token, ttl).await?;

    let env_token = std::env::var("DOUBLE_O_ENV_TOKEN")?;
    let env = client.load_env(&env_token, None).await?;
    let mut names: Vec<_> = env.keys().collect();
    names.sort();
    println!("Loaded {} variables: {names:?}", env.len());

    let proxy_token = std::env::var("DOUBLE_O_PROXY_TOKEN")?;
    let request = ChatCompletionRequest::new(vec![
        ChatMessage::system("Answer in one sentence."),
        ChatMessage::user("What is a secret manager?"),
    ])
    .param("temperature", 0.2);

    let reply = client.chat_completion(&proxy_token, request).await?;
    if let Some(content) = reply["choices"][0]["message"]["content"].as_str() {
        println!("Assistant: {content}");
    }

    client.close();
    Ok(())
}
