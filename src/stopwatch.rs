//! Stopwatch: `Active` accumulates elapsed time while its inner states
//! `Running` and `Stopped` track whether an interval is open.
//!
//! ```text
//! Active ──Reset──▶ Active
//! ├── Stopped ──ToggleStartStop──▶ Running
//! └── Running ──ToggleStartStop──▶ Stopped
//! ```
//!
//! Time is banked into `elapsed_time` only when `Running` is exited, at
//! whole-second resolution. `Reset` re-enters `Active`, which zeroes the
//! total after any open interval has been banked, so an interrupted
//! interval contributes nothing.

use crate::builder::{transition, BuildError, MachineBuilder};
use crate::checkpoint::{Checkpoint, CheckpointError};
use crate::clock::{Clock, SystemClock};
use crate::core::{Event, State, StateHistory};
use crate::engine::{DispatchOutcome, HierarchicalMachine, MachineError};
use crate::state_enum;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

state_enum! {
    /// States of the stopwatch. `Active` encloses the other two.
    pub enum StopwatchState {
        Active,
        Running,
        Stopped,
    }
    children: { Active => [Running, Stopped] }
    initial: { Active => Stopped }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum StopwatchEvent {
    ToggleStartStop,
    Reset,
}

impl Event for StopwatchEvent {
    fn name(&self) -> &str {
        match self {
            Self::ToggleStartStop => "ToggleStartStop",
            Self::Reset => "Reset",
        }
    }
}

/// Data shared by the stopwatch states.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StopwatchData {
    /// Banked seconds from completed `Running` intervals
    pub elapsed_time: f64,
    /// Start of the open interval; `Some` exactly while `Running` is active
    pub started_at: Option<DateTime<Utc>>,
}

pub type StopwatchMachine = HierarchicalMachine<StopwatchState, StopwatchEvent, StopwatchData>;

pub type StopwatchCheckpoint = Checkpoint<StopwatchState, StopwatchData>;

/// Whole seconds between two instants, as `difftime` over truncated Unix
/// times. Never negative.
fn whole_seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end.timestamp() - start.timestamp()).max(0) as f64
}

/// The stopwatch reaction table and hooks, reading time from `clock`.
pub fn definition(
    clock: Arc<dyn Clock>,
) -> MachineBuilder<StopwatchState, StopwatchEvent, StopwatchData> {
    use StopwatchEvent::*;
    use StopwatchState::*;

    let entry_clock = Arc::clone(&clock);
    let exit_clock = Arc::clone(&clock);

    MachineBuilder::new(StopwatchData::default())
        .initial(Active)
        .clock(clock)
        .reactions(vec![
            transition(Stopped, ToggleStartStop, Running),
            transition(Running, ToggleStartStop, Stopped),
            transition(Active, Reset, Active),
        ])
        .on_entry(Active, |data: &mut StopwatchData| {
            data.elapsed_time = 0.0;
        })
        .on_entry(Running, move |data: &mut StopwatchData| {
            data.started_at = Some(entry_clock.now());
        })
        .on_exit(Running, move |data: &mut StopwatchData| {
            if let Some(start) = data.started_at.take() {
                let interval = whole_seconds_between(start, exit_clock.now());
                data.elapsed_time += interval;
                debug!(
                    seconds = interval,
                    total = data.elapsed_time,
                    "interval banked"
                );
            }
        })
}

/// A stopwatch driven by `ToggleStartStop` and `Reset` events.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use stopwatch_hsm::clock::ManualClock;
/// use stopwatch_hsm::stopwatch::{Stopwatch, StopwatchState};
///
/// let clock = ManualClock::default();
/// let mut watch = Stopwatch::with_clock(Arc::new(clock.clone()));
/// watch.start().unwrap();
///
/// watch.toggle().unwrap();
/// clock.advance(chrono::Duration::seconds(2));
/// watch.toggle().unwrap();
///
/// assert_eq!(watch.elapsed_time(), 2.0);
/// assert_eq!(watch.state(), Some(StopwatchState::Stopped));
/// ```
pub struct Stopwatch {
    machine: StopwatchMachine,
    clock: Arc<dyn Clock>,
}

impl Stopwatch {
    /// A stopwatch reading the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// # Panics
    ///
    /// Panics if the stopwatch definition fails validation, which
    /// `try_with_clock` reports as an error instead.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::try_with_clock(clock).expect("stopwatch definition should always build")
    }

    /// A stopwatch reading `clock`, propagating definition errors.
    pub fn try_with_clock(clock: Arc<dyn Clock>) -> Result<Self, BuildError> {
        let machine = definition(Arc::clone(&clock)).build()?;
        Ok(Self { machine, clock })
    }

    /// Continue a stopwatch from a checkpoint.
    ///
    /// An interval open at checkpoint time stays open: its start instant is
    /// part of the checkpoint.
    pub fn resume(
        checkpoint: StopwatchCheckpoint,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CheckpointError> {
        let running = checkpoint.active == Some(StopwatchState::Running);
        if running != checkpoint.context.started_at.is_some() {
            return Err(CheckpointError::ValidationFailed(
                "interval start must be recorded exactly while Running".to_string(),
            ));
        }
        let elapsed = checkpoint.context.elapsed_time;
        if !(elapsed.is_finite() && elapsed >= 0.0) {
            return Err(CheckpointError::ValidationFailed(format!(
                "elapsed time {elapsed} must be a finite, non-negative number of seconds"
            )));
        }

        let mut stopwatch = Self::with_clock(clock);
        stopwatch.machine.resume(checkpoint)?;
        Ok(stopwatch)
    }

    /// Enter `Active`/`Stopped`. Must be called once before any event.
    pub fn start(&mut self) -> Result<(), MachineError> {
        self.machine.start().map(|_| ())
    }

    pub fn dispatch(
        &mut self,
        event: StopwatchEvent,
    ) -> Result<DispatchOutcome<StopwatchState>, MachineError> {
        self.machine.dispatch(&event)
    }

    pub fn toggle(&mut self) -> Result<DispatchOutcome<StopwatchState>, MachineError> {
        self.dispatch(StopwatchEvent::ToggleStartStop)
    }

    pub fn reset(&mut self) -> Result<DispatchOutcome<StopwatchState>, MachineError> {
        self.dispatch(StopwatchEvent::Reset)
    }

    /// Banked seconds. An open `Running` interval is not included until it
    /// is closed by `ToggleStartStop`.
    pub fn elapsed_time(&self) -> f64 {
        self.machine.context().elapsed_time
    }

    /// Banked seconds plus the open interval so far, without banking it.
    pub fn current_elapsed(&self) -> f64 {
        let data = self.machine.context();
        let open = data
            .started_at
            .map(|start| whole_seconds_between(start, self.clock.now()))
            .unwrap_or(0.0);
        data.elapsed_time + open
    }

    /// Active inner state, or `None` before `start()`.
    pub fn state(&self) -> Option<StopwatchState> {
        self.machine.current_state().copied()
    }

    pub fn is_running(&self) -> bool {
        self.state() == Some(StopwatchState::Running)
    }

    pub fn is_stopped(&self) -> bool {
        self.state() == Some(StopwatchState::Stopped)
    }

    pub fn is_in(&self, state: StopwatchState) -> bool {
        self.machine.is_in(&state)
    }

    pub fn history(&self) -> &StateHistory<StopwatchState> {
        self.machine.history()
    }

    pub fn machine(&self) -> &StopwatchMachine {
        &self.machine
    }

    pub fn checkpoint(&self) -> StopwatchCheckpoint {
        self.machine.checkpoint()
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Stopwatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stopwatch")
            .field("state", &self.state().map(|s| s.name().to_string()))
            .field("elapsed_time", &self.elapsed_time())
            .finish()
    }
}
