//! Stopwatch demo driver.
//!
//! Starts a stopwatch, toggles it three times, resets it and exits.

use clap::Parser;
use std::thread;
use std::time::Duration;
use stopwatch_hsm::{Stopwatch, StopwatchEvent};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// CLI argument parsing structure
#[derive(Parser)]
#[command(name = "stopwatch")]
#[command(about = "Drive a hierarchical stopwatch through a fixed event sequence")]
#[command(version)]
struct Config {
    /// Milliseconds to sleep before each event
    #[arg(short, long, default_value = "0")]
    pause_ms: u64,

    /// Print the final checkpoint as JSON
    #[arg(long)]
    checkpoint: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Config {
    fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

const SEQUENCE: [StopwatchEvent; 4] = [
    StopwatchEvent::ToggleStartStop,
    StopwatchEvent::ToggleStartStop,
    StopwatchEvent::ToggleStartStop,
    StopwatchEvent::Reset,
];

fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    let level = config.log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("stopwatch={level},stopwatch_hsm={level}")));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut watch = Stopwatch::new();
    watch.start()?;
    info!(state = ?watch.state(), "stopwatch started");

    for event in SEQUENCE {
        if config.pause_ms > 0 {
            thread::sleep(Duration::from_millis(config.pause_ms));
        }
        let outcome = watch.dispatch(event)?;
        info!(
            event = ?event,
            outcome = ?outcome,
            elapsed = watch.elapsed_time(),
            "event processed"
        );
    }

    if config.checkpoint {
        println!("{}", watch.checkpoint().to_json()?);
    }

    Ok(())
}
