//! Headless engine binary.
//!
//! Reads JSON-lines engine inputs (chat events, config events, emoji
//! definitions) on stdin and writes rendered output as JSON lines on stdout.
//! Logs go to stderr.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use chat_overlay_engine::bootstrap;
use chat_overlay_engine::{EngineConfig, EngineInput, JsonLinesSurface};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting chat overlay engine (headless mode)");

    bootstrap::load_dotenv();
    let config = EngineConfig::load()?;

    let surface = Arc::new(JsonLinesSurface::new(std::io::stdout()));
    let running = bootstrap::start(&config, surface);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_no: u64 = 0;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let input: EngineInput = match serde_json::from_str(line) {
            Ok(input) => input,
            Err(e) => {
                tracing::warn!(line_no, error = %e, "Skipping unreadable input line");
                continue;
            }
        };
        if running.inputs.send(input).await.is_err() {
            tracing::error!("Dispatcher stopped unexpectedly");
            break;
        }
    }

    tracing::info!(lines = line_no, "Input closed, draining");
    drop(running.inputs);
    running.dispatcher.await?;
    running.completions.abort();

    let registry = running.engine.registry();
    tracing::info!(
        cached_names = running.engine.resolver().len(),
        lookup_failures = running.engine.resolver().lookup_failures(),
        emojis = running.engine.emoji().len(),
        unreachable = registry.len(),
        "Shutting down..."
    );
    Ok(())
}
