//! Multi-turn chat session example.
//!
//! Run with:
//! ```bash
//! export OPENAI_API_KEY="your-api-key"
//! RUST_LOG=info cargo run --example chat
//! ```

use openai_session::api::Api;
use openai_session::chat::{ApproximateTokenizer, ChatService, ChatSession};
use openai_session::model::Params;
use serde_json::Value;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Session transitions are logged at info level
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let api = Api::from_env()?;
    let service = Arc::new(ChatService::new(api, ApproximateTokenizer));

    let mut settings = Params::new();
    settings.insert("model".to_string(), Value::from("gpt-4o-mini"));
    settings.insert("temperature".to_string(), Value::from(0.2));

    let chat = ChatSession::new(service, Vec::new())
        .configure(settings)
        .add_system_message("You answer in one short sentence.")
        .add_user_message("What is the capital of France?");

    let chat = chat.submit().await?;
    let chat = chat
        .add_user_message("And roughly how many people live there?")
        .submit()
        .await?;

    println!("\n=== Transcript ===\n{}", chat.to_log_format());
    println!("\nApproximate tokens: {}", chat.total_tokens()?);

    Ok(())
}
