use votewatch::{DirStore, SnapshotStore, WatchConfig};
use votewatch_core::reconstruct;
use votewatch_demos::common::{data_dir, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let cfg = WatchConfig::default();
    let store = DirStore::new(data_dir(), cfg.timezone);
    let scan = store.load_all().await?;
    for bad in &scan.rejected {
        eprintln!("skipped {}: {}", bad.key, bad.error);
    }
    if scan.snapshots.is_empty() {
        println!("no snapshots in {}", store.dir().display());
        return Ok(());
    }

    // Pure function over the whole history; safe to recompute on every read.
    let ledger = reconstruct(&scan.snapshots, &cfg.rates);

    println!("{:<8} {:>8} {:>10} {:>12}", "code", "share", "points", "THB");
    for row in ledger.summary() {
        println!(
            "{:<8} {:>7.2}% {:>10} {:>12}",
            row.candidate, row.percentage, row.points, row.money
        );
    }

    // Hour-by-hour history of the current leader.
    if let Some(leader) = ledger.summary().first() {
        println!("\n{}:", leader.candidate);
        for (step, entry) in ledger.steps().iter().zip(ledger.history(leader.candidate.as_str())) {
            let local = step.captured_at.with_timezone(&cfg.timezone);
            let r = entry.rounded();
            println!(
                "  {}  {:>6.2}%  +{:<6} {:>8} pts",
                local.format("%Y-%m-%d %H:%M"),
                entry.percentage,
                r.points_added,
                r.points
            );
        }
    }
    Ok(())
}
