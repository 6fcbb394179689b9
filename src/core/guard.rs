//! Guard predicates for controlling reactions.
//!
//! Guards are pure boolean functions over the machine context. A reaction
//! whose guard rejects the context is skipped, and the event continues to
//! bubble towards the enclosing states.

use std::fmt;
use std::sync::Arc;

/// Pure predicate that determines if a reaction may fire.
///
/// # Example
///
/// ```rust
/// use stopwatch_hsm::core::Guard;
///
/// struct Counter {
///     hits: u32,
/// }
///
/// let below_limit = Guard::new(|c: &Counter| c.hits < 3);
///
/// assert!(below_limit.check(&Counter { hits: 1 }));
/// assert!(!below_limit.check(&Counter { hits: 3 }));
/// ```
pub struct Guard<C> {
    predicate: Arc<dyn Fn(&C) -> bool + Send + Sync>,
}

impl<C> Guard<C> {
    /// Create a guard from a pure predicate function.
    ///
    /// The predicate must be deterministic and thread-safe (Send + Sync).
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    /// Check if the guard allows the reaction for this context.
    pub fn check(&self, context: &C) -> bool {
        (self.predicate)(context)
    }
}

impl<C> Clone for Guard<C> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<C> fmt::Debug for Guard<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard(..)")
    }
}
