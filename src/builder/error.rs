//! Build errors for machine and reaction builders.

use thiserror::Error;

/// Errors that can occur when building machines and reactions.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("Reaction source state not specified. Call .from(state)")]
    MissingSource,

    #[error("Reaction event not specified. Call .on(event)")]
    MissingEvent,

    #[error("Invalid machine definition: {}", join_violations(.0))]
    InvalidDefinition(Vec<DefinitionViolation>),
}

/// A structural problem in a machine definition.
///
/// Validation collects every violation rather than stopping at the first.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DefinitionViolation {
    #[error("initial state '{state}' is nested inside '{parent}'")]
    InitialNotTopLevel { state: String, parent: String },

    #[error("initial child '{child}' of '{composite}' is not nested inside it")]
    InitialChildOutsideComposite { composite: String, child: String },

    #[error("parent chain of '{state}' is cyclic or too deep")]
    CyclicHierarchy { state: String },

    #[error("state '{state}' has more than one unguarded reaction to '{event}'")]
    DuplicateReaction { state: String, event: String },
}

fn join_violations(violations: &[DefinitionViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
