//! Core State and Event traits for hierarchical state machines.
//!
//! States describe their own place in the hierarchy: every state knows its
//! enclosing composite (if any) and, for composites, which child is entered
//! by default. The dispatcher derives active configurations from these two
//! pure functions alone.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Upper bound on hierarchy depth. Parent chains longer than this are
/// treated as cycles.
pub const MAX_DEPTH: usize = 32;

/// Trait for hierarchical state machine states.
///
/// All methods are pure - no side effects. States are plain values
/// describing a position in the hierarchy; any data a state needs lives in
/// the machine context.
///
/// # Example
///
/// ```rust
/// use stopwatch_hsm::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Power {
///     On,
///     Idle,
///     Busy,
/// }
///
/// impl State for Power {
///     fn name(&self) -> &str {
///         match self {
///             Self::On => "On",
///             Self::Idle => "Idle",
///             Self::Busy => "Busy",
///         }
///     }
///
///     fn parent(&self) -> Option<Self> {
///         match self {
///             Self::On => None,
///             Self::Idle | Self::Busy => Some(Self::On),
///         }
///     }
///
///     fn initial_child(&self) -> Option<Self> {
///         match self {
///             Self::On => Some(Self::Idle),
///             _ => None,
///         }
///     }
/// }
///
/// assert_eq!(Power::Busy.ancestry(), vec![Power::On, Power::Busy]);
/// assert_eq!(Power::On.initial_leaf(), Power::Idle);
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;

    /// The composite state directly enclosing this one.
    ///
    /// Default implementation returns `None` (a top-level state).
    fn parent(&self) -> Option<Self> {
        None
    }

    /// The child entered when this composite state is entered.
    ///
    /// Leaf states return `None` (the default).
    fn initial_child(&self) -> Option<Self> {
        None
    }

    /// Check if this is a final (terminal) state.
    ///
    /// Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }

    /// Whether this state has no nested sub-states.
    fn is_leaf(&self) -> bool {
        self.initial_child().is_none()
    }

    /// Path from the outermost state down to and including `self`.
    ///
    /// Stops after [`MAX_DEPTH`] levels so a malformed hierarchy cannot
    /// loop forever; builders reject such hierarchies up front.
    fn ancestry(&self) -> Vec<Self> {
        let mut path = vec![self.clone()];
        let mut cursor = self.parent();
        while let Some(state) = cursor {
            if path.len() >= MAX_DEPTH {
                break;
            }
            cursor = state.parent();
            path.push(state);
        }
        path.reverse();
        path
    }

    /// Follow `initial_child` from this state down to a leaf.
    fn initial_leaf(&self) -> Self {
        let mut leaf = self.clone();
        for _ in 0..MAX_DEPTH {
            match leaf.initial_child() {
                Some(child) => leaf = child,
                None => break,
            }
        }
        leaf
    }
}

/// Trait for events delivered to a state machine.
///
/// Reactions match events by equality, so payload-free enums are the
/// natural fit.
pub trait Event: Clone + PartialEq + Debug + Send + Sync {
    /// Get the event's name for logging and history records.
    fn name(&self) -> &str;
}
