//! Batch lifecycle coordination.
//!
//! A [`BatchJob`] owns the ordered units of one batch. It submits them one
//! by one, refreshes outstanding units with a concurrent poll fan-out,
//! aggregates their states into one status and assembles the combined
//! result.
//!
//! ```text
//!   submit() ──→ refresh() ──→ aggregate_status() ──→ collect_result()
//!    (serial)   (concurrent)        (sync)               (sync)
//!                  ▲                   │
//!                  └─ wait_for_completion() ─┘
//! ```
//!
//! All unit state lives behind one lock that is held for snapshots and
//! single writes only, never across a call to the resource.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::circuit::Circuit;
use crate::config::CoordinatorConfig;
use crate::encode::format_counts;
use crate::error::{HalError, HalResult};
use crate::job::{BatchId, JobId, JobStatus, UnitState};
use crate::mapping::RemappingTable;
use crate::resource::Resource;
use crate::result::{BatchResult, UnitHeader, UnitResult};

/// One submitted circuit execution.
#[derive(Debug, Clone)]
struct Unit {
    job_id: JobId,
    state: UnitState,
    submitted_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl Unit {
    fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            state: UnitState::Queued,
            submitted_at: Utc::now(),
            finished_at: None,
        }
    }
}

/// Unit states shared between the coordinator and its poll tasks.
type UnitTable = Arc<Mutex<Vec<Unit>>>;

/// Combine unit statuses into one batch status.
///
/// Precedence, first match wins:
/// 1. any `Failed` → `Failed`
/// 2. any `Cancelled` → `Cancelled`
/// 3. any `Running` → `Running`
/// 4. all `Queued` → `Queued`
/// 5. all `Finished` → `Finished`
/// 6. anything else (queued and finished mixed) → `Queued`
pub fn aggregate(statuses: impl IntoIterator<Item = JobStatus>) -> JobStatus {
    let (mut total, mut queued, mut running, mut finished, mut failed, mut cancelled) =
        (0usize, 0usize, 0usize, 0usize, 0usize, 0usize);

    for status in statuses {
        total += 1;
        match status {
            JobStatus::Queued => queued += 1,
            JobStatus::Running => running += 1,
            JobStatus::Finished => finished += 1,
            JobStatus::Failed => failed += 1,
            JobStatus::Cancelled => cancelled += 1,
        }
    }

    if failed > 0 {
        JobStatus::Failed
    } else if cancelled > 0 {
        JobStatus::Cancelled
    } else if running > 0 {
        JobStatus::Running
    } else if queued == total {
        JobStatus::Queued
    } else if finished == total {
        JobStatus::Finished
    } else {
        debug!(queued, finished, "mixed queued/finished batch reported as queued");
        JobStatus::Queued
    }
}

/// Apply a polled state to the unit at `ordinal`, honoring the state machine.
fn apply_state(units: &Mutex<Vec<Unit>>, ordinal: usize, next: UnitState) {
    let mut units = units.lock();
    let Some(unit) = units.get_mut(ordinal) else {
        return;
    };

    if !unit.state.can_transition_to(&next) {
        warn!(
            job_id = %unit.job_id,
            ordinal,
            from = %unit.state.status(),
            to = %next.status(),
            "ignoring illegal unit transition"
        );
        return;
    }

    if unit.state != next {
        debug!(
            job_id = %unit.job_id,
            ordinal,
            from = %unit.state.status(),
            to = %next.status(),
            "unit state changed"
        );
        if next.is_terminal() {
            unit.finished_at = Some(Utc::now());
        }
        unit.state = next;
    }
}

/// A batch of circuits executed unit by unit on one resource.
///
/// Submission order is ordinal order is result order.
pub struct BatchJob<C, R> {
    id: BatchId,
    resource: Arc<R>,
    circuits: Vec<C>,
    tables: Vec<RemappingTable>,
    shots: u32,
    config: CoordinatorConfig,
    units: UnitTable,
    submitted: AtomicBool,
}

impl<C, R> std::fmt::Debug for BatchJob<C, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchJob")
            .field("id", &self.id)
            .field("circuits", &self.circuits.len())
            .field("shots", &self.shots)
            .field("submitted_units", &self.units.lock().len())
            .finish_non_exhaustive()
    }
}

impl<C, R> BatchJob<C, R>
where
    C: Circuit + 'static,
    R: Resource<C> + 'static,
{
    /// Create a batch of `circuits`, each to be run for `shots` repetitions.
    ///
    /// Remapping tables are derived from the circuits here, once. A circuit
    /// measuring into a classical bit it does not declare is rejected.
    pub fn new(resource: Arc<R>, circuits: Vec<C>, shots: u32) -> HalResult<Self> {
        if circuits.is_empty() {
            return Err(HalError::EmptyBatch);
        }
        if shots == 0 {
            return Err(HalError::InvalidShots(
                "Shot count must be at least 1".into(),
            ));
        }

        let tables = circuits
            .iter()
            .map(RemappingTable::from_circuit)
            .collect::<HalResult<Vec<_>>>()?;

        Ok(Self {
            id: BatchId::new(),
            resource,
            circuits,
            tables,
            shots,
            config: CoordinatorConfig::default(),
            units: Arc::new(Mutex::new(Vec::new())),
            submitted: AtomicBool::new(false),
        })
    }

    /// Replace the coordinator configuration.
    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Local batch identifier.
    pub fn id(&self) -> BatchId {
        self.id
    }

    /// Requested shots per circuit.
    pub fn shots(&self) -> u32 {
        self.shots
    }

    /// Circuits of the batch, in ordinal order.
    pub fn circuits(&self) -> &[C] {
        &self.circuits
    }

    /// Remote identifiers of the submitted units, in ordinal order.
    pub fn job_ids(&self) -> Vec<JobId> {
        self.units.lock().iter().map(|u| u.job_id.clone()).collect()
    }

    /// Current status of every submitted unit, in ordinal order.
    pub fn unit_statuses(&self) -> Vec<JobStatus> {
        self.units.lock().iter().map(|u| u.state.status()).collect()
    }

    /// Submit every circuit, strictly one after the other in ordinal order.
    ///
    /// Stops at the first failing submission. Units submitted before it
    /// stay tracked; later circuits are never sent.
    #[instrument(skip(self), fields(batch_id = %self.id))]
    pub async fn submit(&self) -> HalResult<()> {
        if self.submitted.swap(true, Ordering::SeqCst) {
            return Err(HalError::AlreadySubmitted);
        }

        info!(
            "Submitting {} circuits to {} ({} shots each)",
            self.circuits.len(),
            self.resource.name(),
            self.shots
        );

        for (ordinal, circuit) in self.circuits.iter().enumerate() {
            let job_id = self
                .resource
                .submit_unit(circuit, self.shots)
                .await
                .map_err(|e| HalError::SubmissionFailed {
                    ordinal,
                    message: e.to_string(),
                })?;

            debug!(%job_id, ordinal, "unit submitted");
            self.units.lock().push(Unit::new(job_id));
        }

        Ok(())
    }

    /// Poll every non-terminal unit once, concurrently.
    ///
    /// The round is bounded by `poll_timeout`; polls still outstanding at
    /// the deadline are dropped and their units keep their state. Each
    /// poll writes its own unit as soon as it returns. If any poll fails
    /// (transport error or protocol violation) the round still completes
    /// for the others and the first error is returned.
    ///
    /// A finished unit whose sample count differs from the requested shots
    /// is recorded as `Failed` and reported as a protocol violation.
    pub async fn refresh(&self) -> HalResult<()> {
        self.refresh_until(Instant::now() + self.config.poll_timeout)
            .await
    }

    #[instrument(skip(self), fields(batch_id = %self.id))]
    async fn refresh_until(&self, deadline: Instant) -> HalResult<()> {
        let pending: Vec<(usize, JobId)> = self
            .units
            .lock()
            .iter()
            .enumerate()
            .filter(|(_, u)| !u.state.is_terminal())
            .map(|(ordinal, u)| (ordinal, u.job_id.clone()))
            .collect();

        if pending.is_empty() {
            return Ok(());
        }

        let permits = self
            .config
            .max_concurrent_polls
            .unwrap_or(pending.len())
            .max(1);
        let semaphore = Arc::new(Semaphore::new(permits));

        let mut polls = JoinSet::new();
        for (ordinal, job_id) in pending {
            let resource = Arc::clone(&self.resource);
            let units = Arc::clone(&self.units);
            let semaphore = Arc::clone(&semaphore);
            let shots = self.shots as usize;

            polls.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| HalError::Internal(e.to_string()))?;

                let response = resource.poll_unit(&job_id).await?;
                debug!(%job_id, ordinal, status = %response.status, "unit polled");

                let next = match response.into_state(&job_id)? {
                    UnitState::Finished(samples) if samples.len() != shots => {
                        let message = format!(
                            "job {job_id} returned {} shots, expected {shots}",
                            samples.len()
                        );
                        apply_state(&units, ordinal, UnitState::Failed(message.clone()));
                        return Err(HalError::Protocol(message));
                    }
                    next => next,
                };
                apply_state(&units, ordinal, next);
                Ok::<(), HalError>(())
            });
        }

        let mut first_error: Option<HalError> = None;

        loop {
            match tokio::time::timeout_at(deadline, polls.join_next()).await {
                Ok(Some(Ok(Ok(())))) => {}
                Ok(Some(Ok(Err(e)))) => {
                    warn!("poll failed: {}", e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
                Ok(Some(Err(e))) => {
                    if first_error.is_none() {
                        first_error = Some(HalError::Internal(format!("poll task failed: {e}")));
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        outstanding = polls.len(),
                        "poll round timed out; outstanding units keep their state"
                    );
                    polls.abort_all();
                    break;
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Aggregate status of the batch, from one consistent snapshot.
    pub fn aggregate_status(&self) -> JobStatus {
        aggregate(self.units.lock().iter().map(|u| u.state.status()))
    }

    /// Refresh until the aggregate is terminal or `timeout` elapses.
    ///
    /// Sleeps `poll_interval` between rounds. No round outlives the
    /// deadline. Returns the terminal status, or [`HalError::Timeout`] if
    /// the deadline passes first.
    #[instrument(skip(self), fields(batch_id = %self.id))]
    pub async fn wait_for_completion(
        &self,
        poll_interval: Duration,
        timeout: Duration,
    ) -> HalResult<JobStatus> {
        let deadline = Instant::now() + timeout;

        loop {
            let round_deadline = (Instant::now() + self.config.poll_timeout).min(deadline);
            self.refresh_until(round_deadline).await?;

            let status = self.aggregate_status();
            if status.is_terminal() {
                info!(%status, "batch reached final state");
                return Ok(status);
            }

            let now = Instant::now();
            if now >= deadline {
                warn!(%status, "timed out waiting for batch");
                return Err(HalError::Timeout(self.id.to_string()));
            }

            tokio::time::sleep(poll_interval.min(deadline - now)).await;
        }
    }

    /// Assemble the combined result.
    ///
    /// Requires a terminal aggregate status. Finished units carry encoded
    /// counts even when the batch as a whole failed; failed units carry
    /// their remote error text.
    pub fn collect_result(&self) -> HalResult<BatchResult> {
        let (status, snapshot) = {
            let units = self.units.lock();
            let status = aggregate(units.iter().map(|u| u.state.status()));
            if !status.is_terminal() {
                return Err(HalError::NotReady(status));
            }
            (status, units.clone())
        };

        let units = snapshot
            .into_iter()
            .enumerate()
            .map(|(ordinal, unit)| self.unit_result(ordinal, unit))
            .collect::<HalResult<Vec<_>>>()?;

        Ok(BatchResult {
            batch_id: self.id,
            resource: self.resource.name().to_string(),
            status,
            success: status.is_success(),
            units,
        })
    }

    fn unit_result(&self, ordinal: usize, unit: Unit) -> HalResult<UnitResult> {
        let circuit = &self.circuits[ordinal];
        let status = unit.state.status();

        let (counts, error) = match unit.state {
            UnitState::Finished(samples) => {
                (Some(format_counts(&samples, &self.tables[ordinal])?), None)
            }
            UnitState::Failed(message) => (None, Some(message)),
            UnitState::Queued | UnitState::Running | UnitState::Cancelled => (None, None),
        };

        Ok(UnitResult {
            ordinal,
            job_id: unit.job_id,
            success: status.is_success(),
            status,
            shots: self.shots,
            counts,
            error,
            submitted_at: unit.submitted_at,
            finished_at: unit.finished_at,
            header: UnitHeader {
                name: circuit.name().to_string(),
                memory_slots: circuit.num_clbits(),
                metadata: circuit.metadata(),
            },
        })
    }

    /// Error text of every failed unit, keyed by ordinal.
    pub fn failed_units(&self) -> BTreeMap<usize, String> {
        self.units
            .lock()
            .iter()
            .enumerate()
            .filter_map(|(ordinal, u)| match &u.state {
                UnitState::Failed(message) => Some((ordinal, message.clone())),
                _ => None,
            })
            .collect()
    }

    /// Wait with the configured interval and deadline, then collect.
    pub async fn result(&self) -> HalResult<BatchResult> {
        self.wait_for_completion(self.config.poll_interval, self.config.wait_timeout)
            .await?;
        self.collect_result()
    }
}
