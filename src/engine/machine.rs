//! Hierarchical state machine that dispatches events through a reaction table.

use crate::checkpoint::{Checkpoint, CheckpointError};
use crate::clock::{Clock, SystemClock};
use crate::core::{Event, State, StateHistory, StateTransition};
use crate::engine::error::MachineError;
use crate::engine::reaction::{Action, Reaction};
use std::sync::Arc;
use tracing::{debug, trace};

/// What a single dispatch did.
#[derive(Clone, Debug, PartialEq)]
pub enum DispatchOutcome<S: State> {
    /// The active leaf changed (or was re-entered) from `from` to `to`
    Transitioned { from: S, to: S },

    /// An internal reaction declared on `state` ran without leaving any state
    Handled { state: S },

    /// No active state reacts to the event
    Ignored,
}

/// Hierarchical state machine with explicit entry/exit hooks.
///
/// The machine owns a context value `C` that every hook and transition
/// action receives mutably. States carry no data of their own.
pub struct HierarchicalMachine<S: State + 'static, E: Event + 'static, C: 'static> {
    initial: S,
    reactions: Vec<Reaction<S, E, C>>,
    entry_actions: Vec<(S, Action<C>)>,
    exit_actions: Vec<(S, Action<C>)>,
    context: C,
    active: Option<S>,
    history: StateHistory<S>,
    clock: Arc<dyn Clock>,
}

impl<S: State + 'static, E: Event + 'static, C: 'static> HierarchicalMachine<S, E, C> {
    /// Create an unstarted machine whose outermost state is `initial`.
    pub fn new(initial: S, context: C) -> Self {
        Self {
            initial,
            reactions: Vec::new(),
            entry_actions: Vec::new(),
            exit_actions: Vec::new(),
            context,
            active: None,
            history: StateHistory::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Timestamp history entries from `clock` instead of the system clock.
    pub fn set_clock(&mut self, clock: Arc<dyn Clock>) {
        self.clock = clock;
    }

    /// Add a reaction. Reactions on the same state are tried in the order
    /// they were added.
    pub fn add_reaction(&mut self, reaction: Reaction<S, E, C>) {
        self.reactions.push(reaction);
    }

    /// Run `action` every time `state` is entered.
    pub fn add_entry_action(&mut self, state: S, action: Action<C>) {
        self.entry_actions.push((state, action));
    }

    /// Run `action` every time `state` is exited.
    pub fn add_exit_action(&mut self, state: S, action: Action<C>) {
        self.exit_actions.push((state, action));
    }

    /// Enter the initial configuration.
    ///
    /// Entry hooks run outermost first, following `initial_child` down to
    /// a leaf. Returns the active leaf.
    pub fn start(&mut self) -> Result<&S, MachineError> {
        if self.active.is_some() {
            return Err(MachineError::AlreadyStarted);
        }

        let path = self.initial.ancestry();
        let leaf = self.enter_path(&path);
        debug!(initial = self.initial.name(), leaf = leaf.name(), "machine started");
        Ok(&*self.active.insert(leaf))
    }

    /// Deliver one event and run every resulting exit, action and entry.
    ///
    /// The event is offered to the active leaf first and then to each
    /// enclosing state. Unhandled events are ignored.
    pub fn dispatch(&mut self, event: &E) -> Result<DispatchOutcome<S>, MachineError> {
        let leaf = self.active.clone().ok_or(MachineError::NotStarted)?;
        let configuration = leaf.ancestry();

        let Some(reaction) = self.find_reaction(&configuration, event) else {
            debug!(event = event.name(), state = leaf.name(), "event ignored");
            return Ok(DispatchOutcome::Ignored);
        };

        let Some(target) = reaction.target.clone() else {
            if let Some(action) = &reaction.action {
                action(&mut self.context);
            }
            debug!(
                event = event.name(),
                state = reaction.source.name(),
                "internal reaction"
            );
            return Ok(DispatchOutcome::Handled {
                state: reaction.source,
            });
        };

        let source_path = reaction.source.ancestry();
        let target_path = target.ancestry();
        let domain = transition_domain(&source_path, &target_path);

        for state in configuration[domain..].iter().rev() {
            self.exit_state(state);
        }
        if let Some(action) = &reaction.action {
            action(&mut self.context);
        }
        let new_leaf = self.enter_path(&target_path[domain..]);

        debug!(
            event = event.name(),
            from = leaf.name(),
            to = new_leaf.name(),
            "transition"
        );

        self.history.record_mut(StateTransition {
            from: leaf.clone(),
            to: new_leaf.clone(),
            event: event.name().to_string(),
            timestamp: self.clock.now(),
        });
        self.active = Some(new_leaf.clone());

        Ok(DispatchOutcome::Transitioned {
            from: leaf,
            to: new_leaf,
        })
    }

    /// Innermost active state, or `None` before `start()` (pure)
    pub fn current_state(&self) -> Option<&S> {
        self.active.as_ref()
    }

    /// Active states from the outermost down to the leaf (pure)
    pub fn configuration(&self) -> Vec<S> {
        self.active
            .as_ref()
            .map(|leaf| leaf.ancestry())
            .unwrap_or_default()
    }

    /// Whether `state` is part of the active configuration (pure)
    pub fn is_in(&self, state: &S) -> bool {
        self.configuration().contains(state)
    }

    pub fn is_started(&self) -> bool {
        self.active.is_some()
    }

    /// Check if the active leaf is a final state (pure)
    pub fn is_final(&self) -> bool {
        self.active.as_ref().is_some_and(|s| s.is_final())
    }

    pub fn initial_state(&self) -> &S {
        &self.initial
    }

    /// Shared data read and written by hooks.
    pub fn context(&self) -> &C {
        &self.context
    }

    /// Get transition history (pure)
    pub fn history(&self) -> &StateHistory<S> {
        &self.history
    }

    pub fn reactions(&self) -> &[Reaction<S, E, C>] {
        &self.reactions
    }

    /// Snapshot the active configuration, context and history.
    ///
    /// Hooks and reactions are not part of the snapshot; resume into a
    /// machine built from the same definition.
    pub fn checkpoint(&self) -> Checkpoint<S, C>
    where
        C: Clone,
    {
        Checkpoint::new(
            self.initial.clone(),
            self.active.clone(),
            self.context.clone(),
            self.history.clone(),
        )
    }

    /// Restore a snapshot into this (unstarted) machine without running
    /// any hooks.
    pub fn resume(&mut self, checkpoint: Checkpoint<S, C>) -> Result<(), CheckpointError> {
        checkpoint.validate()?;

        if self.active.is_some() {
            return Err(CheckpointError::MachineStarted);
        }
        if checkpoint.initial_state != self.initial {
            return Err(CheckpointError::ValidationFailed(format!(
                "checkpoint initial state '{}' does not match machine initial state '{}'",
                checkpoint.initial_state.name(),
                self.initial.name()
            )));
        }
        if let Some(leaf) = &checkpoint.active {
            if !leaf.is_leaf() {
                return Err(CheckpointError::ValidationFailed(format!(
                    "active state '{}' is a composite, not a leaf",
                    leaf.name()
                )));
            }
        }

        debug!(
            id = checkpoint.id.as_str(),
            active = checkpoint.active.as_ref().map(|s| s.name()),
            "resuming from checkpoint"
        );

        self.active = checkpoint.active;
        self.context = checkpoint.context;
        self.history = checkpoint.history;
        Ok(())
    }

    fn find_reaction(&self, configuration: &[S], event: &E) -> Option<Reaction<S, E, C>> {
        configuration.iter().rev().find_map(|state| {
            self.reactions
                .iter()
                .find(|r| r.can_fire(state, event, &self.context))
                .cloned()
        })
    }

    /// Enter each state of `path` in order, then drill down through
    /// initial children. Returns the leaf that ends up active.
    fn enter_path(&mut self, path: &[S]) -> S {
        for state in path {
            self.enter_state(state);
        }

        let Some(mut leaf) = path.last().cloned() else {
            return self.initial.clone();
        };
        while let Some(child) = leaf.initial_child() {
            self.enter_state(&child);
            leaf = child;
        }
        leaf
    }

    fn enter_state(&mut self, state: &S) {
        trace!(state = state.name(), "enter");
        for (owner, action) in &self.entry_actions {
            if owner == state {
                action(&mut self.context);
            }
        }
    }

    fn exit_state(&mut self, state: &S) {
        trace!(state = state.name(), "exit");
        for (owner, action) in &self.exit_actions {
            if owner == state {
                action(&mut self.context);
            }
        }
    }
}

/// Depth of the deepest state left untouched by a transition from
/// `source` to `target`.
///
/// Both paths run from the outermost state. The domain is the deepest
/// common *proper* ancestor, so a transition from a state to itself (or to
/// one of its own ancestors or descendants) exits and re-enters it.
fn transition_domain<S: PartialEq>(source_path: &[S], target_path: &[S]) -> usize {
    let common = source_path
        .iter()
        .zip(target_path)
        .take_while(|(a, b)| a == b)
        .count();

    common
        .min(source_path.len().saturating_sub(1))
        .min(target_path.len().saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Guard;
    use serde::{Deserialize, Serialize};
    use std::sync::Arc;

    // Top-level `On` containing `Idle` and `Busy`; `Busy` contains
    // `Warming` and `Working`. `Off` is a second top-level state.
    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum Device {
        On,
        Idle,
        Busy,
        Warming,
        Working,
        Off,
    }

    impl State for Device {
        fn name(&self) -> &str {
            match self {
                Self::On => "On",
                Self::Idle => "Idle",
                Self::Busy => "Busy",
                Self::Warming => "Warming",
                Self::Working => "Working",
                Self::Off => "Off",
            }
        }

        fn parent(&self) -> Option<Self> {
            match self {
                Self::Idle | Self::Busy => Some(Self::On),
                Self::Warming | Self::Working => Some(Self::Busy),
                Self::On | Self::Off => None,
            }
        }

        fn initial_child(&self) -> Option<Self> {
            match self {
                Self::On => Some(Self::Idle),
                Self::Busy => Some(Self::Warming),
                _ => None,
            }
        }

        fn is_final(&self) -> bool {
            matches!(self, Self::Off)
        }
    }

    #[derive(Clone, PartialEq, Debug)]
    enum Signal {
        Job,
        Ready,
        Restart,
        Ping,
        PowerOff,
        Unknown,
    }

    impl Event for Signal {
        fn name(&self) -> &str {
            match self {
                Self::Job => "Job",
                Self::Ready => "Ready",
                Self::Restart => "Restart",
                Self::Ping => "Ping",
                Self::PowerOff => "PowerOff",
                Self::Unknown => "Unknown",
            }
        }
    }

    #[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
    struct Trace {
        log: Vec<String>,
        pings: u32,
        jobs_allowed: bool,
    }

    fn reaction(
        source: Device,
        event: Signal,
        target: Option<Device>,
    ) -> Reaction<Device, Signal, Trace> {
        Reaction {
            source,
            event,
            target,
            guard: None,
            action: None,
        }
    }

    fn logging(tag: &'static str) -> Action<Trace> {
        Arc::new(move |t: &mut Trace| t.log.push(tag.to_string()))
    }

    fn device() -> HierarchicalMachine<Device, Signal, Trace> {
        let mut machine = HierarchicalMachine::new(
            Device::On,
            Trace {
                jobs_allowed: true,
                ..Trace::default()
            },
        );

        for state in [
            Device::On,
            Device::Idle,
            Device::Busy,
            Device::Warming,
            Device::Working,
        ] {
            let name = state.name().to_string();
            let enter = format!("enter {name}");
            let exit = format!("exit {name}");
            machine.add_entry_action(
                state.clone(),
                Arc::new(move |t: &mut Trace| t.log.push(enter.clone())),
            );
            machine.add_exit_action(
                state,
                Arc::new(move |t: &mut Trace| t.log.push(exit.clone())),
            );
        }

        machine.add_reaction(Reaction {
            guard: Some(Guard::new(|t: &Trace| t.jobs_allowed)),
            ..reaction(Device::Idle, Signal::Job, Some(Device::Busy))
        });
        machine.add_reaction(reaction(
            Device::Warming,
            Signal::Ready,
            Some(Device::Working),
        ));
        machine.add_reaction(Reaction {
            action: Some(logging("restart action")),
            ..reaction(Device::On, Signal::Restart, Some(Device::On))
        });
        machine.add_reaction(Reaction {
            action: Some(Arc::new(|t: &mut Trace| t.pings += 1)),
            ..reaction(Device::Busy, Signal::Ping, None)
        });
        machine.add_reaction(reaction(Device::On, Signal::PowerOff, Some(Device::Off)));
        machine
    }

    fn started() -> HierarchicalMachine<Device, Signal, Trace> {
        let mut machine = device();
        machine.start().unwrap();
        machine
    }

    fn drain(machine: &HierarchicalMachine<Device, Signal, Trace>, skip: usize) -> Vec<&str> {
        machine.context().log[skip..]
            .iter()
            .map(String::as_str)
            .collect()
    }

    #[test]
    fn start_enters_outermost_first_down_to_initial_leaf() {
        let mut machine = device();

        let leaf = machine.start().unwrap().clone();

        assert_eq!(leaf, Device::Idle);
        assert_eq!(drain(&machine, 0), vec!["enter On", "enter Idle"]);
        assert_eq!(machine.configuration(), vec![Device::On, Device::Idle]);
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut machine = started();
        let before = machine.context().log.len();

        assert_eq!(machine.start(), Err(MachineError::AlreadyStarted));
        assert_eq!(machine.context().log.len(), before);
    }

    #[test]
    fn dispatch_before_start_is_rejected() {
        let mut machine = device();

        assert_eq!(
            machine.dispatch(&Signal::Job),
            Err(MachineError::NotStarted)
        );
        assert!(!machine.is_started());
    }

    #[test]
    fn sibling_transition_exits_source_and_drills_into_target() {
        let mut machine = started();
        let skip = machine.context().log.len();

        let outcome = machine.dispatch(&Signal::Job).unwrap();

        assert_eq!(
            outcome,
            DispatchOutcome::Transitioned {
                from: Device::Idle,
                to: Device::Warming,
            }
        );
        assert_eq!(
            drain(&machine, skip),
            vec!["exit Idle", "enter Busy", "enter Warming"]
        );
        assert!(machine.is_in(&Device::Busy));
        assert!(machine.is_in(&Device::On));
        assert!(!machine.is_in(&Device::Idle));
    }

    #[test]
    fn event_bubbles_to_enclosing_state() {
        let mut machine = started();
        machine.dispatch(&Signal::Job).unwrap();
        machine.dispatch(&Signal::Ready).unwrap();
        let skip = machine.context().log.len();

        let outcome = machine.dispatch(&Signal::Restart).unwrap();

        assert_eq!(
            outcome,
            DispatchOutcome::Transitioned {
                from: Device::Working,
                to: Device::Idle,
            }
        );
        assert_eq!(
            drain(&machine, skip),
            vec![
                "exit Working",
                "exit Busy",
                "exit On",
                "restart action",
                "enter On",
                "enter Idle",
            ]
        );
    }

    #[test]
    fn unhandled_event_is_ignored_without_side_effects() {
        let mut machine = started();
        let before = machine.context().clone();

        let outcome = machine.dispatch(&Signal::Unknown).unwrap();

        assert_eq!(outcome, DispatchOutcome::Ignored);
        assert_eq!(machine.context(), &before);
        assert_eq!(machine.current_state(), Some(&Device::Idle));
        assert!(machine.history().is_empty());
    }

    #[test]
    fn event_declared_on_a_sibling_branch_is_ignored() {
        let mut machine = started();

        // Ready is only handled inside Busy.
        let outcome = machine.dispatch(&Signal::Ready).unwrap();

        assert_eq!(outcome, DispatchOutcome::Ignored);
    }

    #[test]
    fn guard_rejection_lets_event_fall_through() {
        let mut machine = HierarchicalMachine::new(Device::On, Trace::default());
        machine.add_reaction(Reaction {
            guard: Some(Guard::new(|t: &Trace| t.jobs_allowed)),
            ..reaction(Device::Idle, Signal::Job, Some(Device::Busy))
        });
        machine.start().unwrap();

        let outcome = machine.dispatch(&Signal::Job).unwrap();

        assert_eq!(outcome, DispatchOutcome::Ignored);
        assert_eq!(machine.current_state(), Some(&Device::Idle));
    }

    #[test]
    fn internal_reaction_runs_action_only() {
        let mut machine = started();
        machine.dispatch(&Signal::Job).unwrap();
        let skip = machine.context().log.len();

        let outcome = machine.dispatch(&Signal::Ping).unwrap();

        assert_eq!(
            outcome,
            DispatchOutcome::Handled {
                state: Device::Busy
            }
        );
        assert_eq!(machine.context().pings, 1);
        assert!(drain(&machine, skip).is_empty());
        assert_eq!(machine.current_state(), Some(&Device::Warming));
        assert_eq!(machine.history().len(), 1);
    }

    #[test]
    fn leaving_the_hierarchy_reaches_a_final_state() {
        let mut machine = started();
        machine.dispatch(&Signal::Job).unwrap();

        machine.dispatch(&Signal::PowerOff).unwrap();

        assert_eq!(machine.current_state(), Some(&Device::Off));
        assert!(machine.is_final());
        assert_eq!(machine.configuration(), vec![Device::Off]);
    }

    #[test]
    fn history_records_leaf_transitions_with_events() {
        let mut machine = started();
        machine.dispatch(&Signal::Job).unwrap();
        machine.dispatch(&Signal::Ready).unwrap();
        machine.dispatch(&Signal::Unknown).unwrap();
        machine.dispatch(&Signal::Restart).unwrap();

        let history = machine.history();
        assert_eq!(history.events(), vec!["Job", "Ready", "Restart"]);
        assert_eq!(
            history.get_path(),
            vec![
                &Device::Idle,
                &Device::Warming,
                &Device::Working,
                &Device::Idle
            ]
        );
    }

    #[test]
    fn history_timestamps_come_from_machine_clock() {
        use crate::clock::ManualClock;
        use chrono::{Duration, TimeZone, Utc};

        let start = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        let mut machine = device();
        machine.set_clock(Arc::new(clock.clone()));
        machine.start().unwrap();

        machine.dispatch(&Signal::Job).unwrap();
        clock.advance(Duration::seconds(90));
        machine.dispatch(&Signal::Ready).unwrap();

        let history = machine.history();
        assert_eq!(history.transitions()[0].timestamp, start);
        assert_eq!(
            history.duration(),
            Some(std::time::Duration::from_secs(90))
        );
    }

    #[test]
    fn long_runs_keep_every_transition() {
        let mut machine = started();
        for _ in 0..5_000 {
            machine.dispatch(&Signal::Job).unwrap();
            machine.dispatch(&Signal::Restart).unwrap();
        }

        assert_eq!(machine.history().len(), 10_000);
        assert_eq!(
            machine.history().last().map(|t| &t.to),
            Some(&Device::Idle)
        );
    }

    #[test]
    fn checkpoint_resume_restores_configuration_without_hooks() {
        let mut machine = started();
        machine.dispatch(&Signal::Job).unwrap();
        let checkpoint = machine.checkpoint();

        let mut restored = device();
        restored.resume(checkpoint).unwrap();

        assert_eq!(restored.current_state(), Some(&Device::Warming));
        assert_eq!(restored.context(), machine.context());
        assert_eq!(restored.history().len(), 1);

        restored.dispatch(&Signal::Ready).unwrap();
        assert_eq!(restored.current_state(), Some(&Device::Working));
    }

    #[test]
    fn resume_into_started_machine_is_rejected() {
        let checkpoint = started().checkpoint();
        let mut other = started();

        assert!(matches!(
            other.resume(checkpoint),
            Err(CheckpointError::MachineStarted)
        ));
    }

    #[test]
    fn resume_rejects_mismatched_initial_state() {
        let checkpoint = started().checkpoint();
        let mut other: HierarchicalMachine<Device, Signal, Trace> =
            HierarchicalMachine::new(Device::Off, Trace::default());

        assert!(matches!(
            other.resume(checkpoint),
            Err(CheckpointError::ValidationFailed(_))
        ));
    }

    #[test]
    fn transition_domain_is_deepest_proper_common_ancestor() {
        // siblings under On
        assert_eq!(transition_domain(&["On", "Idle"], &["On", "Busy"]), 1);
        // self-transition on the outer state
        assert_eq!(transition_domain(&["On"], &["On"]), 0);
        // into a descendant
        assert_eq!(transition_domain(&["On"], &["On", "Busy", "Working"]), 0);
        // unrelated roots
        assert_eq!(transition_domain(&["On", "Busy"], &["Off"]), 0);
        // leaf to deep cousin
        assert_eq!(
            transition_domain(&["On", "Busy", "Warming"], &["On", "Busy", "Working"]),
            2
        );
    }
}
