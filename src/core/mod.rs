//! Core state machine types and logic.
//!
//! This module contains the pure part of the hierarchical machine:
//! - State and event definitions via the `State` and `Event` traits
//! - Guard predicates over the machine context
//! - Immutable history tracking
//!
//! Nothing in this module performs side effects; hooks and dispatch live
//! in [`crate::machine`].

mod guard;
mod history;
mod state;

pub use guard::Guard;
pub use history::{StateHistory, StateTransition};
pub use state::{Event, State, MAX_DEPTH};
