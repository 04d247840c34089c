//! Unit lifecycle types.
//!
//! Every circuit of a batch is tracked as one *unit* with its own remote job.
//! The unit state machine:
//!
//! ```text
//!   submit_unit() ──→ Queued ──→ Running ──→ Finished(samples)
//!                       │           │
//!                       │           ├──→ Failed(error)
//!                       │           │
//!                       └───────────┴──→ Cancelled
//! ```
//!
//! **Invariants:**
//! - A freshly submitted unit is `Queued`.
//! - Transitions are monotonic: a unit never moves backward.
//! - Terminal states (`Finished`, `Failed`, `Cancelled`) are permanent.
//! - Cancellation is only ever observed from the remote side.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Remote identifier of one submitted unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    /// Create a new job ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Local identifier of a batch. Never sent to the remote resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(pub Uuid);

impl BatchId {
    /// Create a fresh random batch ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload-free status of a unit or of a whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting in the remote queue.
    Queued,
    /// Currently executing.
    Running,
    /// Completed with measurement samples.
    Finished,
    /// Remote execution failed.
    Failed,
    /// Cancelled on the remote side.
    Cancelled,
}

impl JobStatus {
    /// Check if this is a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Finished | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// Check if the job is still pending (queued or running).
    pub fn is_pending(self) -> bool {
        matches!(self, JobStatus::Queued | JobStatus::Running)
    }

    /// Check if the job completed successfully.
    pub fn is_success(self) -> bool {
        matches!(self, JobStatus::Finished)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "Queued"),
            JobStatus::Running => write!(f, "Running"),
            JobStatus::Finished => write!(f, "Finished"),
            JobStatus::Failed => write!(f, "Failed"),
            JobStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Raw detector outcomes: one boolean vector per shot.
pub type Samples = Vec<Vec<bool>>;

/// Lifecycle state of one unit, carrying the terminal payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitState {
    /// Waiting in the remote queue.
    Queued,
    /// Currently executing.
    Running,
    /// Completed; holds the per-shot detector outcomes.
    Finished(Samples),
    /// Remote execution failed with the given error text.
    Failed(String),
    /// Cancelled on the remote side.
    Cancelled,
}

impl UnitState {
    /// Status tag of this state.
    pub fn status(&self) -> JobStatus {
        match self {
            UnitState::Queued => JobStatus::Queued,
            UnitState::Running => JobStatus::Running,
            UnitState::Finished(_) => JobStatus::Finished,
            UnitState::Failed(_) => JobStatus::Failed,
            UnitState::Cancelled => JobStatus::Cancelled,
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    /// Whether moving from `self` to `next` follows the state machine.
    ///
    /// Accepts the transitive closure of the forward edges, not only the
    /// direct ones. A poll may skip `Running` entirely, so `Queued → Finished`
    /// and `Queued → Failed` are legal. Re-observing the current non-terminal
    /// state is a no-op. Backward moves and moves out of a terminal state
    /// are rejected.
    ///
    /// | from \ to | Queued | Running | Finished | Failed | Cancelled |
    /// |-----------|--------|---------|----------|--------|-----------|
    /// | Queued    | yes    | yes     | yes      | yes    | yes       |
    /// | Running   | no     | yes     | yes      | yes    | yes       |
    /// | terminal  | no     | no      | no       | no     | no        |
    pub fn can_transition_to(&self, next: &UnitState) -> bool {
        match (self, next) {
            (UnitState::Finished(_) | UnitState::Failed(_) | UnitState::Cancelled, _) => false,
            (UnitState::Queued, _) => true,
            (UnitState::Running, UnitState::Queued) => false,
            (UnitState::Running, _) => true,
        }
    }
}
