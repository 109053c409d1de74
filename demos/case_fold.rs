//! Lower-cases, then title-cases a few words, failing on `"foo"`.
//!
//! Run with:
//! ```bash
//! RUST_LOG=parapipe=debug cargo run --example case_fold
//! ```
//! Remove the `"foo"` check in `title_case` to watch the pipeline run to
//! exhaustion instead of cancelling.

use std::time::Duration;

use parapipe::error::Result;
use parapipe::prelude::*;
use tracing_subscriber::EnvFilter;

async fn lower_case(s: String) -> std::result::Result<String, String> {
    tracing::info!(input = %s, "lower_case");
    // make the two-at-a-time batching visible
    tokio::time::sleep(Duration::from_millis(500)).await;
    Ok(s.to_lowercase())
}

async fn title_case(s: String) -> std::result::Result<String, String> {
    tracing::info!(input = %s, "title_case");
    tokio::time::sleep(Duration::from_millis(500)).await;
    if s == "foo" {
        return Err(format!("oh no: {s}"));
    }
    let mut chars = s.chars();
    Ok(match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => s,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let words = VecSource::new(["FOO", "BAR", "BAX"].map(String::from));

    let flow = Runtime::new()
        .concurrency(2)
        .source(words)?
        .stage(Stage::new("lower_case", lower_case))?
        .stage(Stage::new("title_case", title_case))?;

    let cancel = flow.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let report = flow.sink(Sink::new()).await?;
    match report.cause() {
        None => tracing::info!(results = report.results, "done"),
        Some(cause) => tracing::warn!(results = report.results, %cause, "stopped"),
    }
    Ok(())
}
