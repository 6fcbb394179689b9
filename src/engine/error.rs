//! Runtime errors for hierarchical machines.

use thiserror::Error;

/// Errors returned when the machine is driven out of its lifecycle order.
///
/// Events without a matching reaction are not errors; they are reported as
/// [`DispatchOutcome::Ignored`](crate::engine::DispatchOutcome::Ignored).
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum MachineError {
    #[error("Machine has not been started. Call .start() before dispatching events")]
    NotStarted,

    #[error("Machine has already been started")]
    AlreadyStarted,
}
