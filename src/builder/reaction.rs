//! Builder for constructing reactions.

use crate::builder::error::BuildError;
use crate::core::{Event, Guard, State};
use crate::engine::{Action, Reaction};
use std::sync::Arc;

/// Builder for constructing reactions with a fluent API.
///
/// Omitting `.to()` builds an internal reaction.
pub struct ReactionBuilder<S: State, E: Event, C> {
    from: Option<S>,
    on: Option<E>,
    to: Option<S>,
    guard: Option<Guard<C>>,
    action: Option<Action<C>>,
}

impl<S: State, E: Event, C> ReactionBuilder<S, E, C> {
    /// Create a new reaction builder.
    pub fn new() -> Self {
        Self {
            from: None,
            on: None,
            to: None,
            guard: None,
            action: None,
        }
    }

    /// Set the state declaring the reaction (required).
    pub fn from(mut self, state: S) -> Self {
        self.from = Some(state);
        self
    }

    /// Set the triggering event (required).
    pub fn on(mut self, event: E) -> Self {
        self.on = Some(event);
        self
    }

    /// Set the target state (optional).
    pub fn to(mut self, state: S) -> Self {
        self.to = Some(state);
        self
    }

    /// Add a guard predicate (optional).
    pub fn guard(mut self, guard: Guard<C>) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Add a guard using a closure (optional).
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Guard::new(predicate));
        self
    }

    /// Run `action` between the exits and entries of the transition
    /// (optional).
    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut C) + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }

    /// Build the reaction.
    pub fn build(self) -> Result<Reaction<S, E, C>, BuildError> {
        let source = self.from.ok_or(BuildError::MissingSource)?;
        let event = self.on.ok_or(BuildError::MissingEvent)?;

        Ok(Reaction {
            source,
            event,
            target: self.to,
            guard: self.guard,
            action: self.action,
        })
    }
}

impl<S: State, E: Event, C> Default for ReactionBuilder<S, E, C> {
    fn default() -> Self {
        Self::new()
    }
}
