//! Qubit → classical bit remapping tables.
//!
//! The resource reports one detector outcome per qubit, in qubit order.
//! Circuits may measure qubits into arbitrary classical bits, so every
//! shot is re-encoded through a [`RemappingTable`] built from the circuit's
//! measurement instructions.
//!
//! A table is either empty (identity mapping) or maps the contiguous
//! domain `0..width` injectively into `0..K`, with `K = max(destination) + 1`
//! possibly larger than `width`.

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::circuit::Circuit;
use crate::error::{HalError, HalResult};

/// Mapping from source (qubit) position to destination (classical bit) position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemappingTable {
    entries: BTreeMap<u32, u32>,
}

impl RemappingTable {
    /// Create an empty (identity) table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(source, destination)` pairs.
    ///
    /// Later pairs for the same source override earlier ones.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let mut table = Self::new();
        for (source, destination) in pairs {
            table.insert(source, destination);
        }
        table
    }

    /// Build the table from a circuit's measurement instructions.
    ///
    /// Every destination must be a classical bit the circuit declares.
    pub fn from_circuit<C: Circuit + ?Sized>(circuit: &C) -> HalResult<Self> {
        let num_clbits = circuit.num_clbits();
        if let Some((qubit, clbit)) = circuit
            .measurements()
            .into_iter()
            .find(|&(_, clbit)| clbit >= num_clbits)
        {
            return Err(HalError::InvalidMapping(format!(
                "circuit {} measures qubit {qubit} into clbit {clbit}, but has {num_clbits} clbits",
                circuit.name()
            )));
        }
        Ok(Self::from_pairs(circuit.measurements()))
    }

    /// Map `source` to `destination`, replacing any previous entry.
    pub fn insert(&mut self, source: u32, destination: u32) {
        self.entries.insert(source, destination);
    }

    /// Destination of `source`, if mapped.
    pub fn get(&self, source: u32) -> Option<u32> {
        self.entries.get(&source).copied()
    }

    /// Whether this is the identity (empty) table.
    pub fn is_identity(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of mapped sources.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no source is mapped.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(source, destination)` pairs in source order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.entries.iter().map(|(&s, &d)| (s, d))
    }

    /// Width of the re-encoded output for an input of `input_width` bits.
    pub fn output_width(&self, input_width: usize) -> usize {
        self.entries
            .values()
            .max()
            .map_or(input_width, |&max| max as usize + 1)
    }

    /// Check that the table can re-encode shots of `input_width` bits.
    ///
    /// The domain must be exactly `0..input_width` and no two sources may
    /// share a destination. The identity table accepts any width.
    pub fn validate(&self, input_width: usize) -> HalResult<()> {
        if self.is_identity() {
            return Ok(());
        }

        let domain_matches = self.entries.len() == input_width
            && self
                .entries
                .keys()
                .enumerate()
                .all(|(i, &source)| source as usize == i);
        if !domain_matches {
            return Err(HalError::InvalidMapping(format!(
                "table sources {:?} do not cover exactly 0..{input_width}",
                self.entries.keys().collect::<Vec<_>>()
            )));
        }

        let mut seen = FxHashSet::default();
        for (source, destination) in self.iter() {
            if !seen.insert(destination) {
                return Err(HalError::InvalidMapping(format!(
                    "destination {destination} is mapped more than once (source {source})"
                )));
            }
        }

        Ok(())
    }
}
