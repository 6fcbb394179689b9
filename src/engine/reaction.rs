//! Reactions: table entries mapping (state, event) to a transition.

use crate::core::{Event, Guard, State};
use std::fmt;
use std::sync::Arc;

/// Side effect run against the machine context.
///
/// Used for state entry/exit hooks and for transition actions.
pub type Action<C> = Arc<dyn Fn(&mut C) + Send + Sync>;

/// One row of the reaction table.
///
/// A reaction declared on a composite state also handles the event for
/// every state nested inside it, unless a deeper state reacts first.
pub struct Reaction<S: State, E: Event, C> {
    /// State that declares the reaction
    pub source: S,
    /// Event the reaction responds to
    pub event: E,
    /// Destination; `None` makes this an internal reaction that runs its
    /// action without leaving any state
    pub target: Option<S>,
    pub guard: Option<Guard<C>>,
    pub action: Option<Action<C>>,
}

impl<S: State, E: Event, C> Reaction<S, E, C> {
    /// Check if this reaction fires for `event` while `state` is being
    /// offered the event (pure)
    pub fn can_fire(&self, state: &S, event: &E, context: &C) -> bool {
        if *state != self.source || *event != self.event {
            return false;
        }

        self.guard.as_ref().is_none_or(|g| g.check(context))
    }

    pub fn is_internal(&self) -> bool {
        self.target.is_none()
    }
}

impl<S: State, E: Event, C> Clone for Reaction<S, E, C> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            event: self.event.clone(),
            target: self.target.clone(),
            guard: self.guard.clone(),
            action: self.action.clone(),
        }
    }
}

impl<S: State, E: Event, C> fmt::Debug for Reaction<S, E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reaction")
            .field("source", &self.source)
            .field("event", &self.event)
            .field("target", &self.target)
            .field("guarded", &self.guard.is_some())
            .finish()
    }
}
