//! Checkpoint and Resume
//!
//! This demo snapshots a running stopwatch, writes it to disk and resumes it
//! in a fresh stopwatch, as a restarted process would.
//!
//! Key concepts:
//! - The open interval's start instant travels with the checkpoint
//! - JSON for readability, bincode for compactness
//! - A manual clock makes the timeline deterministic
//!
//! Run with: cargo run --example checkpoint_resume

use chrono::Duration;
use std::fs;
use std::sync::Arc;
use stopwatch_hsm::clock::ManualClock;
use stopwatch_hsm::stopwatch::StopwatchCheckpoint;
use stopwatch_hsm::Stopwatch;

const CHECKPOINT_PATH: &str = "/tmp/stopwatch-hsm-checkpoint.json";

fn main() -> anyhow::Result<()> {
    println!("=== Checkpoint and Resume Demo ===\n");

    let clock = ManualClock::default();
    let mut watch = Stopwatch::with_clock(Arc::new(clock.clone()));
    watch.start()?;

    // Run 1: bank one lap, leave a second one open
    watch.toggle()?;
    clock.advance(Duration::seconds(4));
    watch.toggle()?;
    watch.toggle()?;
    clock.advance(Duration::seconds(2));
    println!("Run 1: {watch:?}, open lap so far {}s", watch.current_elapsed());

    let checkpoint = watch.checkpoint();
    fs::write(CHECKPOINT_PATH, checkpoint.to_json()?)?;
    println!(
        "  [Checkpoint] {} ({} bytes as JSON, {} as binary)",
        checkpoint.id,
        fs::metadata(CHECKPOINT_PATH)?.len(),
        checkpoint.to_binary()?.len()
    );
    drop(watch);

    // Run 2: a new stopwatch picks up where the first left off
    let loaded = StopwatchCheckpoint::from_json(&fs::read_to_string(CHECKPOINT_PATH)?)?;
    let mut resumed = Stopwatch::resume(loaded, Arc::new(clock.clone()))?;
    clock.advance(Duration::seconds(3));
    resumed.toggle()?;
    println!("\nRun 2: {resumed:?}");
    println!("  Events so far: {:?}", resumed.history().events());

    fs::remove_file(CHECKPOINT_PATH).ok();

    println!("\n=== Demo Complete ===");
    Ok(())
}
