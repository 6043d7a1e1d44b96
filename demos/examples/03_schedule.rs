use std::sync::Arc;
use std::time::Duration;

use votewatch::{DirStore, LedgerStatus, VoteWatch, WatchConfig};
use votewatch_demos::common::{data_dir, get_source, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // A short interval keeps the demo brief; production polls hourly.
    let cfg = WatchConfig {
        poll_interval: Duration::from_secs(5),
        cycle_timeout: Duration::from_secs(30),
        ..WatchConfig::default()
    };
    let store = Arc::new(DirStore::open(data_dir(), cfg.timezone).await?);
    let watch = Arc::new(
        VoteWatch::builder()
            .boxed_source(get_source()?)
            .store(store)
            .config(cfg)
            .build()?,
    );

    let mut handle = watch.spawn_scheduler();
    for _ in 0..3 {
        let Some(report) = handle.next_report().await else {
            break;
        };
        println!("{} {:?}", report.finished_at, report.outcome);

        let view = watch.ledger_view(chrono::Utc::now()).await;
        match view.status {
            LedgerStatus::NoData => println!("  no data yet"),
            LedgerStatus::Fresh { age } | LedgerStatus::Stale { age } => {
                let leader = view.ledger.as_ref().and_then(|l| l.summary().into_iter().next());
                if let Some(row) = leader {
                    println!(
                        "  leader {} at {:.2}% ({} THB), data {}s old{}",
                        row.candidate,
                        row.percentage,
                        row.money,
                        age.as_secs(),
                        if view.is_degraded() { " [degraded]" } else { "" }
                    );
                }
            }
        }
    }
    handle.stop().await;
    Ok(())
}
