//! HAL Batch: lifecycle coordination for multi-circuit quantum jobs
//!
//! This crate runs a batch of independent circuits on a remote resource that
//! executes one circuit at a time and only offers poll-based status
//! retrieval. Any resource (offline simulator, cloud simulator or ion-trap
//! device) implements the [`Resource`] trait to participate.
//!
//! # Overview
//!
//! The crate provides:
//! - A [`Resource`] trait with two calls: `submit_unit()` and `poll_unit()`
//! - [`BatchJob`], the lifecycle coordinator: serial submission, concurrent
//!   refresh, status aggregation, blocking wait and result assembly
//! - [`JobStatus`] / [`UnitState`] for per-unit tracking
//! - [`RemappingTable`] and the [`encode`] functions that turn raw detector
//!   outcomes into hex-keyed [`Counts`]
//! - [`BatchResult`] / [`UnitResult`] for the combined outcome
//! - [`HalError`] categorized by origin (transport, protocol, input contract)
//!
//! # Lifecycle
//!
//! ```text
//!   BatchJob::new() ──→ submit() ──→ wait_for_completion() ──→ collect_result()
//!      (sync)          (serial)     (refresh + aggregate)          (sync)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use hal_batch::{BatchJob, NativeCircuit};
//!
//! let mut bell = NativeCircuit::new("bell", 2, 2);
//! bell.r(std::f64::consts::FRAC_PI_2, 0.0, 0).rxx(std::f64::consts::FRAC_PI_4, 0, 1).measure_all();
//!
//! let batch = BatchJob::new(Arc::new(my_resource), vec![bell], 200)?;
//! batch.submit().await?;
//! batch.wait_for_completion(Duration::from_millis(500), Duration::from_secs(60)).await?;
//! let result = batch.collect_result()?;
//! println!("{:?}", result.counts(0));
//! ```

pub mod circuit;
pub mod config;
pub mod coordinator;
pub mod encode;
pub mod error;
pub mod job;
pub mod mapping;
pub mod resource;
pub mod result;
pub mod transpile;

pub use circuit::{Circuit, NativeCircuit, Operation};
pub use config::CoordinatorConfig;
pub use coordinator::{BatchJob, aggregate};
pub use encode::{encode_shot, format_counts, format_key, remap_shot};
pub use error::{HalError, HalResult};
pub use job::{BatchId, JobId, JobStatus, Samples, UnitState};
pub use mapping::RemappingTable;
pub use resource::{PollResponse, Resource};
pub use result::{BatchResult, Counts, UnitHeader, UnitResult};
