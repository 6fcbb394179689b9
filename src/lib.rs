//! Stopwatch HSM: a hierarchical state machine and the stopwatch built on it
//!
//! The crate has two layers. The lower layer is a small hierarchical state
//! machine engine. The upper layer is a stopwatch defined entirely as a
//! reaction table plus entry/exit hooks on that engine.
//!
//! # Core Concepts
//!
//! - **State**: enum states describing their own hierarchy via `parent` and
//!   `initial_child`
//! - **Reactions**: (state, event) table rows; events bubble from the active
//!   leaf to enclosing states until one reacts
//! - **Hooks**: explicit entry/exit actions over one owned context value
//! - **History & checkpoints**: every transition is recorded, and a machine
//!   can be snapshotted and resumed
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use stopwatch_hsm::clock::ManualClock;
//! use stopwatch_hsm::{Stopwatch, StopwatchEvent, StopwatchState};
//!
//! let clock = ManualClock::default();
//! let mut watch = Stopwatch::with_clock(Arc::new(clock.clone()));
//! watch.start().unwrap();
//!
//! watch.dispatch(StopwatchEvent::ToggleStartStop).unwrap();
//! clock.advance(chrono::Duration::seconds(3));
//! watch.dispatch(StopwatchEvent::ToggleStartStop).unwrap();
//! assert_eq!(watch.elapsed_time(), 3.0);
//!
//! watch.dispatch(StopwatchEvent::Reset).unwrap();
//! assert_eq!(watch.elapsed_time(), 0.0);
//! assert_eq!(watch.state(), Some(StopwatchState::Stopped));
//! ```

pub mod builder;
pub mod checkpoint;
pub mod clock;
pub mod core;
pub mod engine;
pub mod stopwatch;

// Re-export commonly used types
pub use core::{Event, Guard, State, StateHistory, StateTransition};
pub use engine::{DispatchOutcome, HierarchicalMachine, MachineError};
pub use stopwatch::{Stopwatch, StopwatchData, StopwatchEvent, StopwatchState};
