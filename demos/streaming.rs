//! Streaming chat completion example.
//!
//! Run with:
//! ```bash
//! export OPENAI_API_KEY="your-api-key"
//! cargo run --example streaming
//! ```

use openai_session::api::Api;
use openai_session::model::{Message, Params};
use std::io::Write;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let api = Api::from_env()?;
    let messages = vec![
        Message::system("You are a poet."),
        Message::user("Write a haiku about the borrow checker."),
    ];

    println!("Streaming response...\n");

    let mut chunks = 0;
    api.chat_completions()
        .create_streaming("gpt-4o-mini", &messages, Params::new(), |chunk| {
            chunks += 1;
            if let Some(text) = chunk.choices.first().and_then(|c| c.delta.content.as_deref()) {
                print!("{}", text);
                let _ = std::io::stdout().flush();
            }
        })
        .await?;

    println!("\n\n[{} chunks]", chunks);
    Ok(())
}
