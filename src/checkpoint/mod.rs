//! Checkpoint and resume functionality for hierarchical machines.
//!
//! A checkpoint captures everything needed to continue a machine in another
//! process: the active leaf, the shared context and the transition history.
//! Hooks and reactions are code, not data, so they are rebuilt from the
//! machine definition and the checkpoint is resumed into that fresh machine.

use crate::core::{State, StateHistory};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable checkpoint of a machine.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(serialize = "C: Serialize", deserialize = "C: DeserializeOwned"))]
pub struct Checkpoint<S: State, C> {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: String,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    /// Outermost initial state of the machine definition
    pub initial_state: S,

    /// Active leaf, `None` if the machine was never started
    pub active: Option<S>,

    /// Shared data owned by the machine
    pub context: C,

    /// Complete transition history
    pub history: StateHistory<S>,
}

impl<S: State, C> Checkpoint<S, C> {
    pub fn new(initial_state: S, active: Option<S>, context: C, history: StateHistory<S>) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            initial_state,
            active,
            context,
            history,
        }
    }

    /// Reject checkpoints written by an incompatible format version.
    pub fn validate(&self) -> Result<(), CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        Ok(())
    }
}

impl<S: State, C: Serialize + DeserializeOwned> Checkpoint<S, C> {
    /// Human-readable JSON form.
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self = serde_json::from_str(json)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.validate()?;
        Ok(checkpoint)
    }

    /// Compact binary form.
    pub fn to_binary(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self = bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.validate()?;
        Ok(checkpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StateTransition;

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum Phase {
        Outer,
        Inner,
    }

    impl State for Phase {
        fn name(&self) -> &str {
            match self {
                Self::Outer => "Outer",
                Self::Inner => "Inner",
            }
        }

        fn parent(&self) -> Option<Self> {
            match self {
                Self::Inner => Some(Self::Outer),
                Self::Outer => None,
            }
        }

        fn initial_child(&self) -> Option<Self> {
            match self {
                Self::Outer => Some(Self::Inner),
                Self::Inner => None,
            }
        }
    }

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    struct Counter {
        total: f64,
    }

    fn sample() -> Checkpoint<Phase, Counter> {
        let history = StateHistory::new().record(StateTransition {
            from: Phase::Inner,
            to: Phase::Inner,
            event: "Again".to_string(),
            timestamp: Utc::now(),
        });
        Checkpoint::new(
            Phase::Outer,
            Some(Phase::Inner),
            Counter { total: 4.0 },
            history,
        )
    }

    #[test]
    fn new_checkpoint_has_current_version_and_unique_id() {
        let first = sample();
        let second = sample();

        assert_eq!(first.version, CHECKPOINT_VERSION);
        assert_ne!(first.id, second.id);
        assert!(first.validate().is_ok());
    }

    #[test]
    fn json_preserves_state_and_context() {
        let checkpoint = sample();

        let json = checkpoint.to_json().unwrap();
        let restored: Checkpoint<Phase, Counter> = Checkpoint::from_json(&json).unwrap();

        assert_eq!(restored.id, checkpoint.id);
        assert_eq!(restored.active, Some(Phase::Inner));
        assert_eq!(restored.context, Counter { total: 4.0 });
        assert_eq!(restored.history.events(), vec!["Again"]);
    }

    #[test]
    fn binary_preserves_state_and_context() {
        let checkpoint = sample();

        let bytes = checkpoint.to_binary().unwrap();
        let restored: Checkpoint<Phase, Counter> = Checkpoint::from_binary(&bytes).unwrap();

        assert_eq!(restored.initial_state, Phase::Outer);
        assert_eq!(restored.context, checkpoint.context);
        assert_eq!(restored.timestamp, checkpoint.timestamp);
    }

    #[test]
    fn unsupported_version_is_rejected_on_load() {
        let mut checkpoint = sample();
        checkpoint.version = CHECKPOINT_VERSION + 1;
        let json = serde_json::to_string(&checkpoint).unwrap();

        let result: Result<Checkpoint<Phase, Counter>, _> = Checkpoint::from_json(&json);

        assert!(matches!(
            result,
            Err(CheckpointError::UnsupportedVersion { found, supported })
                if found == CHECKPOINT_VERSION + 1 && supported == CHECKPOINT_VERSION
        ));
    }

    #[test]
    fn garbage_input_reports_deserialization_failure() {
        let json: Result<Checkpoint<Phase, Counter>, _> = Checkpoint::from_json("{not json");
        let binary: Result<Checkpoint<Phase, Counter>, _> = Checkpoint::from_binary(&[1, 2, 3]);

        assert!(matches!(json, Err(CheckpointError::DeserializationFailed(_))));
        assert!(matches!(
            binary,
            Err(CheckpointError::DeserializationFailed(_))
        ));
    }
}
