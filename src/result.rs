//! Batch result types.
//!
//! Count keys are hexadecimal renderings of the classical register with
//! bit 0 as the least significant bit: `"0x4"` means classical bit 2 read
//! `1` and every other bit read `0`.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::job::{BatchId, JobId, JobStatus};

/// Measurement counts of one unit.
///
/// Maps hex keys to occurrence counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    /// Map from hex key to count.
    counts: FxHashMap<String, u64>,
}

impl Counts {
    /// Create empty counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create counts from an iterator of (key, count) pairs.
    /// Duplicate keys are accumulated (summed), consistent with `insert()`.
    pub fn from_pairs(iter: impl IntoIterator<Item = (impl Into<String>, u64)>) -> Self {
        let mut counts = Self::new();
        for (k, v) in iter {
            counts.insert(k, v);
        }
        counts
    }

    /// Add `count` occurrences of `key`.
    pub fn insert(&mut self, key: impl Into<String>, count: u64) {
        *self.counts.entry(key.into()).or_default() += count;
    }

    /// Get the count for a key.
    pub fn get(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Iterate over (key, count) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &u64)> {
        self.counts.iter()
    }

    /// Get the total number of shots.
    pub fn total_shots(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Get the most frequent key.
    pub fn most_frequent(&self) -> Option<(&String, &u64)> {
        self.counts.iter().max_by_key(|&(_, count)| count)
    }

    /// Get probabilities for each key.
    #[allow(clippy::cast_precision_loss)]
    pub fn probabilities(&self) -> FxHashMap<String, f64> {
        let total = self.total_shots() as f64;
        if total == 0.0 {
            return FxHashMap::default();
        }
        self.counts
            .iter()
            .map(|(k, &v)| (k.clone(), v as f64 / total))
            .collect()
    }

    /// Get sorted counts (by count descending, then by key).
    pub fn sorted(&self) -> Vec<(&String, &u64)> {
        let mut items: Vec<_> = self.counts.iter().collect();
        items.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        items
    }

    /// Get the number of distinct keys.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if counts are empty.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FromIterator<(String, u64)> for Counts {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

/// Descriptive data copied from the circuit of a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitHeader {
    /// Circuit name.
    pub name: String,
    /// Number of classical bits of the circuit.
    pub memory_slots: u32,
    /// Circuit metadata.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Outcome of one unit, in batch order.
///
/// `counts` is only present for finished units. Presence of counts in a
/// batch does not imply that the batch succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitResult {
    /// Position of the unit in the batch.
    pub ordinal: usize,
    /// Remote identifier of the unit.
    pub job_id: JobId,
    /// Whether this unit finished.
    pub success: bool,
    /// Status of the unit when the result was collected.
    pub status: JobStatus,
    /// Requested shots.
    pub shots: u32,
    /// Encoded counts (finished units only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<Counts>,
    /// Remote error text (failed units only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Time the unit was submitted.
    pub submitted_at: DateTime<Utc>,
    /// Time the unit was first seen in a terminal state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Circuit header.
    pub header: UnitHeader,
}

/// Combined result of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    /// Local batch identifier.
    pub batch_id: BatchId,
    /// Name of the resource the batch ran on.
    pub resource: String,
    /// Aggregate status when the result was collected.
    pub status: JobStatus,
    /// `true` only if every unit finished.
    pub success: bool,
    /// Per-unit outcomes in submission order.
    pub units: Vec<UnitResult>,
}

impl BatchResult {
    /// Counts of the unit at `ordinal`, if it finished.
    pub fn counts(&self, ordinal: usize) -> Option<&Counts> {
        self.units.get(ordinal).and_then(|u| u.counts.as_ref())
    }

    /// Counts of every unit in order; `None` for units without data.
    pub fn all_counts(&self) -> Vec<Option<&Counts>> {
        self.units.iter().map(|u| u.counts.as_ref()).collect()
    }
}
