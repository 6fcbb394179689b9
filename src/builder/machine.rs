//! Builder for constructing hierarchical machines.

use crate::builder::error::{BuildError, DefinitionViolation};
use crate::builder::reaction::ReactionBuilder;
use crate::clock::Clock;
use crate::core::{Event, State, MAX_DEPTH};
use crate::engine::{Action, HierarchicalMachine, Reaction};
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<DefinitionViolation>>;

/// Builder for constructing hierarchical machines with a fluent API.
///
/// `build()` validates the whole definition and reports every problem it
/// finds, not only the first.
pub struct MachineBuilder<S: State + 'static, E: Event + 'static, C: 'static> {
    context: C,
    initial: Option<S>,
    reactions: Vec<Reaction<S, E, C>>,
    entry_actions: Vec<(S, Action<C>)>,
    exit_actions: Vec<(S, Action<C>)>,
    clock: Option<Arc<dyn Clock>>,
}

impl<S: State + 'static, E: Event + 'static, C: 'static> MachineBuilder<S, E, C> {
    /// Create a new builder owning the machine context.
    pub fn new(context: C) -> Self {
        Self {
            context,
            initial: None,
            reactions: Vec::new(),
            entry_actions: Vec::new(),
            exit_actions: Vec::new(),
            clock: None,
        }
    }

    /// Set the outermost initial state (required).
    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Add a reaction using a builder.
    /// Returns an error if the builder fails validation.
    pub fn reaction(mut self, builder: ReactionBuilder<S, E, C>) -> Result<Self, BuildError> {
        let reaction = builder.build()?;
        self.reactions.push(reaction);
        Ok(self)
    }

    /// Add a pre-built reaction.
    pub fn add_reaction(mut self, reaction: Reaction<S, E, C>) -> Self {
        self.reactions.push(reaction);
        self
    }

    /// Add multiple pre-built reactions.
    pub fn reactions(mut self, reactions: Vec<Reaction<S, E, C>>) -> Self {
        self.reactions.extend(reactions);
        self
    }

    /// Run `action` whenever `state` is entered.
    pub fn on_entry<F>(mut self, state: S, action: F) -> Self
    where
        F: Fn(&mut C) + Send + Sync + 'static,
    {
        self.entry_actions.push((state, Arc::new(action)));
        self
    }

    /// Run `action` whenever `state` is exited.
    pub fn on_exit<F>(mut self, state: S, action: F) -> Self
    where
        F: Fn(&mut C) + Send + Sync + 'static,
    {
        self.exit_actions.push((state, Arc::new(action)));
        self
    }

    /// Time source for history timestamps. Defaults to the system clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the machine (unstarted).
    pub fn build(self) -> Result<HierarchicalMachine<S, E, C>, BuildError> {
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;

        let known = known_states(
            std::iter::once(&initial)
                .chain(self.reactions.iter().map(|r| &r.source))
                .chain(self.reactions.iter().filter_map(|r| r.target.as_ref()))
                .chain(self.entry_actions.iter().map(|(s, _)| s))
                .chain(self.exit_actions.iter().map(|(s, _)| s)),
        );

        let mut checks: Vec<Check> = vec![check_top_level(&initial)];
        checks.extend(known.iter().map(check_acyclic));
        checks.extend(known.iter().map(check_initial_child));
        checks.push(check_duplicate_reactions(&self.reactions));

        if let Validation::Failure(violations) = Validation::all_vec(checks) {
            return Err(BuildError::InvalidDefinition(violations.into_vec()));
        }

        let mut machine = HierarchicalMachine::new(initial, self.context);
        if let Some(clock) = self.clock {
            machine.set_clock(clock);
        }
        for reaction in self.reactions {
            machine.add_reaction(reaction);
        }
        for (state, action) in self.entry_actions {
            machine.add_entry_action(state, action);
        }
        for (state, action) in self.exit_actions {
            machine.add_exit_action(state, action);
        }

        Ok(machine)
    }
}

/// Every state named in the definition, plus their ancestors and the
/// initial-child chains below them. Deduplicated, in discovery order.
fn known_states<'a, S: State + 'a>(named: impl Iterator<Item = &'a S>) -> Vec<S> {
    let mut known: Vec<S> = Vec::new();
    for state in named {
        let mut chain = state.ancestry();
        let mut cursor = state.initial_child();
        while let Some(child) = cursor {
            if chain.len() >= 2 * MAX_DEPTH || chain.contains(&child) {
                break;
            }
            cursor = child.initial_child();
            chain.push(child);
        }
        for s in chain {
            if !known.contains(&s) {
                known.push(s);
            }
        }
    }
    known
}

fn check_top_level<S: State>(initial: &S) -> Check {
    match initial.parent() {
        None => Validation::success(()),
        Some(parent) => Validation::fail(DefinitionViolation::InitialNotTopLevel {
            state: initial.name().to_string(),
            parent: parent.name().to_string(),
        }),
    }
}

fn check_acyclic<S: State>(state: &S) -> Check {
    let mut seen = vec![state.clone()];
    let mut cursor = state.parent();
    while let Some(parent) = cursor {
        if seen.contains(&parent) || seen.len() >= MAX_DEPTH {
            return Validation::fail(DefinitionViolation::CyclicHierarchy {
                state: state.name().to_string(),
            });
        }
        cursor = parent.parent();
        seen.push(parent);
    }
    Validation::success(())
}

fn check_initial_child<S: State>(state: &S) -> Check {
    match state.initial_child() {
        Some(child) if child.parent().as_ref() != Some(state) => {
            Validation::fail(DefinitionViolation::InitialChildOutsideComposite {
                composite: state.name().to_string(),
                child: child.name().to_string(),
            })
        }
        _ => Validation::success(()),
    }
}

fn check_duplicate_reactions<S: State, E: Event, C>(reactions: &[Reaction<S, E, C>]) -> Check {
    let unguarded: Vec<&Reaction<S, E, C>> =
        reactions.iter().filter(|r| r.guard.is_none()).collect();

    let duplicates: Vec<Check> = unguarded
        .iter()
        .enumerate()
        .filter(|(i, r)| {
            unguarded[..*i]
                .iter()
                .any(|earlier| earlier.source == r.source && earlier.event == r.event)
        })
        .map(|(_, r)| {
            Validation::fail(DefinitionViolation::DuplicateReaction {
                state: r.source.name().to_string(),
                event: r.event.name().to_string(),
            })
        })
        .collect();

    Validation::all_vec(duplicates).map(|_| ())
}

impl<S: State + 'static, E: Event + 'static, C: Default + 'static> Default
    for MachineBuilder<S, E, C>
{
    fn default() -> Self {
        Self::new(C::default())
    }
}
