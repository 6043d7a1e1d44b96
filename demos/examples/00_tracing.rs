use std::sync::Arc;

use tracing_subscriber::fmt::format::FmtSpan;
use votewatch::{DirStore, VoteWatch, WatchConfig};
use votewatch_demos::common::{data_dir, get_source};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Human-friendly subscriber with env-based filtering.
    // Suggested: RUST_LOG=info,votewatch=trace,votewatch_acm=trace
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
        .try_init();

    let cfg = WatchConfig::default();
    let store = Arc::new(DirStore::open(data_dir(), cfg.timezone).await?);
    let watch = VoteWatch::builder()
        .boxed_source(get_source()?)
        .store(store)
        .config(cfg)
        .build()?;

    // One cycle: login, fetch, append. Spans show the re-login path when the session expired.
    let report = watch.poll_once().await;
    tracing::info!(outcome = ?report.outcome, "cycle finished");
    Ok(())
}
