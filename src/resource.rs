//! Remote resource trait and poll wire types.
//!
//! A [`Resource`] executes one circuit at a time and exposes only two
//! calls:
//!
//! ```text
//!   submit_unit() ──→ JobId ──→ poll_unit() ──→ PollResponse
//!     (async)                     (async, repeated)
//! ```
//!
//! ## Method table
//!
//! | Method | Kind | Returns |
//! |--------|------|---------|
//! | `name()` | sync | `&str` |
//! | `submit_unit()` | async | `HalResult<JobId>` |
//! | `poll_unit()` | async | `HalResult<PollResponse>` |
//!
//! Transport, authentication and payload serialization are the
//! implementor's concern. Retries, if any, belong there too.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{HalError, HalResult};
use crate::job::{JobId, UnitState};

/// A remote execution resource.
///
/// Generic over `C`, the circuit type, like the rest of the crate.
///
/// # Contract
///
/// - `submit_unit()` enqueues exactly one circuit and returns its remote id.
///   The unit starts `Queued`.
/// - `poll_unit()` is read-only and may be called concurrently for
///   different ids.
#[async_trait]
pub trait Resource<C>: Send + Sync {
    /// Name of this resource (e.g. `"default/offline_simulator_no_noise"`).
    fn name(&self) -> &str;

    /// Submit a circuit for `shots` repetitions.
    async fn submit_unit(&self, circuit: &C, shots: u32) -> HalResult<JobId>;

    /// Fetch the current status (and result, once available) of a unit.
    async fn poll_unit(&self, job_id: &JobId) -> HalResult<PollResponse>;
}

/// Body of a poll response.
///
/// `status` is kept as the raw string so unknown values can be reported
/// as protocol violations instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollResponse {
    /// Job status: `queued | ongoing | finished | error | cancelled`.
    pub status: String,

    /// Per-shot detector outcomes (0/1), present when `status == "finished"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<Vec<u8>>>,

    /// Error text, present when `status == "error"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PollResponse {
    fn with_status(status: &str) -> Self {
        Self {
            status: status.to_string(),
            result: None,
            message: None,
        }
    }

    /// Queued unit.
    pub fn queued() -> Self {
        Self::with_status("queued")
    }

    /// Running unit.
    pub fn ongoing() -> Self {
        Self::with_status("ongoing")
    }

    /// Finished unit with the given samples.
    pub fn finished(samples: Vec<Vec<u8>>) -> Self {
        Self {
            result: Some(samples),
            ..Self::with_status("finished")
        }
    }

    /// Failed unit.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::with_status("error")
        }
    }

    /// Cancelled unit.
    pub fn cancelled() -> Self {
        Self::with_status("cancelled")
    }

    /// Translate the response into a unit state.
    ///
    /// Fails with [`HalError::Protocol`] on an unknown status, a finished
    /// response without samples, or a sample value other than 0 or 1.
    pub fn into_state(self, job_id: &JobId) -> HalResult<UnitState> {
        match self.status.as_str() {
            "queued" => Ok(UnitState::Queued),
            "ongoing" => Ok(UnitState::Running),
            "cancelled" => Ok(UnitState::Cancelled),
            "error" => Ok(UnitState::Failed(self.message.unwrap_or_default())),
            "finished" => {
                let raw = self.result.ok_or_else(|| {
                    HalError::Protocol(format!("job {job_id} finished without results"))
                })?;
                raw.into_iter()
                    .map(|shot| {
                        shot.into_iter()
                            .map(|state| match state {
                                0 => Ok(false),
                                1 => Ok(true),
                                other => Err(HalError::Protocol(format!(
                                    "job {job_id} returned detector state {other}"
                                ))),
                            })
                            .collect::<HalResult<Vec<bool>>>()
                    })
                    .collect::<HalResult<Vec<_>>>()
                    .map(UnitState::Finished)
            }
            other => Err(HalError::Protocol(format!(
                "job {job_id} has unknown status: {other}"
            ))),
        }
    }
}
