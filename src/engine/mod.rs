//! Hierarchical dispatch: the side-effecting shell around the pure core.
//!
//! # Key Concepts
//!
//! - **Reactions**: table rows keyed by (state, event), with optional guard,
//!   target and action
//! - **Hooks**: explicit entry/exit actions per state, run by the dispatcher
//! - **Context**: one owned value shared by every hook, instead of data
//!   stored on states
//!
//! Dispatch is synchronous. Every exit, action and entry caused by an event
//! has run by the time `dispatch` returns.

mod error;
mod machine;
mod reaction;

pub use error::MachineError;
pub use machine::{DispatchOutcome, HierarchicalMachine};
pub use reaction::{Action, Reaction};
