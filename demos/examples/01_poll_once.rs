use std::sync::Arc;

use votewatch::{CycleOutcome, DirStore, VoteWatch, WatchConfig};
use votewatch_demos::common::{data_dir, get_source, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // 1. Source: the vendor connector, or fixtures when VOTEWATCH_DEMOS_USE_MOCK is set.
    let source = get_source()?;

    // 2. Store: one JSON record per successful cycle.
    let cfg = WatchConfig::default();
    let dir = data_dir();
    let store = Arc::new(DirStore::open(&dir, cfg.timezone).await?);

    // 3. Orchestrator.
    let watch = VoteWatch::builder()
        .boxed_source(source)
        .store(store)
        .config(cfg)
        .build()?;

    // 4. Run a single cycle; failures come back as part of the report.
    let report = watch.poll_once().await;
    match &report.outcome {
        CycleOutcome::Stored { key, candidates } => {
            println!("stored {candidates} candidates in {}", dir.join(key).display());
        }
        CycleOutcome::Skipped => println!("another cycle is running"),
        CycleOutcome::Failed(e) => println!("cycle failed ({:?}): {e}", e.kind()),
        other => println!("{other:?}"),
    }
    Ok(())
}
