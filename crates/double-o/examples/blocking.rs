//! Example using the blocking client from several threads
//!
//! # Usage
//!
//! ```bash
//! export DOUBLE_O_SECRET_TOKEN=...
//! cargo run --example blocking
//! ```

use double_o::blocking::Client;
use std::thread;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = Client::builder()
        .max_retries(2)
        .backoff_factor(Duration::from_millis(250))
        .build()?;
    let token = std::env::var("DOUBLE_O_SECRET_TOKEN")?;

    // One clone per worker; all share the session and the cache.
    let workers: Vec<_> = (0..4)
        .map(|i| {
            let client = client.clone();
            let token = token.clone();
            thread::spawn(move || {
                client
                    .get_secret(&token, Some(Duration::from_secs(60)))
                    .map(|secret| println!("worker {i}: {} characters", secret.len()))
            })
        })
        .collect();

    for worker in workers {
        if let Err(e) = worker.join().map_err(|_| "worker panicked")? {
            eprintln!("{e}");
        }
    }

    println!("cached entries: {}", client.cache().len());
    Ok(())
}
