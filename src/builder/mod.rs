//! Builder API for ergonomic machine construction.
//!
//! This module provides fluent builders and macros for declaring
//! hierarchical machines, and validates the resulting definition.

pub mod error;
pub mod machine;
pub mod macros;
pub mod reaction;

pub use error::{BuildError, DefinitionViolation};
pub use machine::MachineBuilder;
pub use reaction::ReactionBuilder;

use crate::core::{Event, Guard, State};
use crate::engine::Reaction;

/// Create an unconditional reaction moving from `from` to `to` on `event`.
///
/// # Example
///
/// ```
/// use stopwatch_hsm::builder::transition;
/// use stopwatch_hsm::core::Event;
/// use stopwatch_hsm::engine::Reaction;
/// use stopwatch_hsm::state_enum;
///
/// state_enum! {
///     enum Valve {
///         Shut,
///         Open,
///     }
/// }
///
/// #[derive(Clone, PartialEq, Debug)]
/// struct Turn;
///
/// impl Event for Turn {
///     fn name(&self) -> &str {
///         "Turn"
///     }
/// }
///
/// let reaction: Reaction<Valve, Turn, ()> = transition(Valve::Shut, Turn, Valve::Open);
/// assert_eq!(reaction.target, Some(Valve::Open));
/// ```
pub fn transition<S, E, C>(from: S, event: E, to: S) -> Reaction<S, E, C>
where
    S: State,
    E: Event,
{
    Reaction {
        source: from,
        event,
        target: Some(to),
        guard: None,
        action: None,
    }
}

/// Create a reaction that only fires while `guard` accepts the context.
pub fn guarded_transition<S, E, C, F>(from: S, event: E, to: S, guard: F) -> Reaction<S, E, C>
where
    S: State,
    E: Event,
    F: Fn(&C) -> bool + Send + Sync + 'static,
{
    Reaction {
        guard: Some(Guard::new(guard)),
        ..transition(from, event, to)
    }
}
