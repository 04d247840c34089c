//! Circuit-shaped input of a batch.
//!
//! The coordinator does not build or inspect gates. It needs three things
//! from each circuit: its measurement instructions (to derive the remapping
//! table), its classical register width, and descriptive header data.
//! [`Circuit`] captures exactly that; [`NativeCircuit`] is a small concrete
//! implementation over the trapped-ion native operations.

use serde::{Deserialize, Serialize};

/// What the coordinator needs to know about a circuit.
pub trait Circuit: Send + Sync {
    /// Human-readable circuit name.
    fn name(&self) -> &str;

    /// Number of qubits (width of each raw shot vector).
    fn num_qubits(&self) -> u32;

    /// Number of classical bits (memory slots).
    fn num_clbits(&self) -> u32;

    /// `(qubit, clbit)` pairs of every measurement, in program order.
    fn measurements(&self) -> Vec<(u32, u32)>;

    /// Free-form metadata copied into the unit header.
    fn metadata(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}

/// A single circuit operation. Angles are in radians.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation")]
pub enum Operation {
    /// Z-axis rotation.
    #[serde(rename = "RZ")]
    Rz {
        /// Target qubit index (0-based).
        qubit: u32,
        /// Rotation angle.
        phi: f64,
    },

    /// X-axis rotation. Not native; rewritten as `R` by
    /// [`normalize`](crate::transpile::normalize).
    #[serde(rename = "RX")]
    Rx {
        /// Target qubit index (0-based).
        qubit: u32,
        /// Rotation angle.
        theta: f64,
    },

    /// Phased-X rotation `R(θ, φ)`.
    #[serde(rename = "R")]
    R {
        /// Target qubit index (0-based).
        qubit: u32,
        /// Rotation angle, θ ∈ [0, π] once normalized.
        theta: f64,
        /// Phase angle.
        phi: f64,
    },

    /// Mølmer-Sørensen gate.
    #[serde(rename = "RXX")]
    Rxx {
        /// Target qubit indices (0-based), `[q0, q1]`.
        qubits: [u32; 2],
        /// Entangling angle, θ ∈ [0, π/2] once normalized.
        theta: f64,
    },

    /// Measure `qubit` into classical bit `clbit`.
    #[serde(rename = "MEASURE")]
    Measure {
        /// Measured qubit.
        qubit: u32,
        /// Destination classical bit.
        clbit: u32,
    },
}

impl Operation {
    /// Whether the operation is accepted by the resource without rewriting.
    pub fn is_native(&self) -> bool {
        match self {
            Operation::Rz { .. } | Operation::Measure { .. } => true,
            Operation::Rx { .. } => false,
            Operation::R { theta, .. } => (0.0..=std::f64::consts::PI).contains(theta),
            Operation::Rxx { theta, .. } => (0.0..=std::f64::consts::FRAC_PI_2).contains(theta),
        }
    }
}

/// Concrete circuit built from [`Operation`]s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NativeCircuit {
    /// Circuit name.
    pub name: String,
    /// Number of qubits.
    pub num_qubits: u32,
    /// Number of classical bits.
    pub num_clbits: u32,
    /// Operations in program order.
    pub operations: Vec<Operation>,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl NativeCircuit {
    /// Create an empty circuit.
    pub fn new(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            num_clbits,
            operations: Vec::new(),
            metadata: serde_json::Value::Null,
        }
    }

    /// Set metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Append an operation.
    pub fn push(&mut self, op: Operation) -> &mut Self {
        self.operations.push(op);
        self
    }

    /// Append `RZ(phi)` on `qubit`.
    pub fn rz(&mut self, phi: f64, qubit: u32) -> &mut Self {
        self.push(Operation::Rz { qubit, phi })
    }

    /// Append `RX(theta)` on `qubit`.
    pub fn rx(&mut self, theta: f64, qubit: u32) -> &mut Self {
        self.push(Operation::Rx { qubit, theta })
    }

    /// Append `R(theta, phi)` on `qubit`.
    pub fn r(&mut self, theta: f64, phi: f64, qubit: u32) -> &mut Self {
        self.push(Operation::R { qubit, theta, phi })
    }

    /// Append `RXX(theta)` on `q0, q1`.
    pub fn rxx(&mut self, theta: f64, q0: u32, q1: u32) -> &mut Self {
        self.push(Operation::Rxx {
            qubits: [q0, q1],
            theta,
        })
    }

    /// Measure `qubit` into `clbit`.
    pub fn measure(&mut self, qubit: u32, clbit: u32) -> &mut Self {
        self.push(Operation::Measure { qubit, clbit })
    }

    /// Measure qubit `i` into clbit `i` for every qubit.
    pub fn measure_all(&mut self) -> &mut Self {
        for q in 0..self.num_qubits {
            self.measure(q, q);
        }
        self
    }

    /// Whether every operation is native.
    pub fn is_native(&self) -> bool {
        self.operations.iter().all(Operation::is_native)
    }
}

impl Circuit for NativeCircuit {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    fn num_clbits(&self) -> u32 {
        self.num_clbits
    }

    fn measurements(&self) -> Vec<(u32, u32)> {
        self.operations
            .iter()
            .filter_map(|op| match op {
                Operation::Measure { qubit, clbit } => Some((*qubit, *clbit)),
                _ => None,
            })
            .collect()
    }

    fn metadata(&self) -> serde_json::Value {
        self.metadata.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_measurements_in_program_order() {
        let mut qc = NativeCircuit::new("swap", 3, 3);
        qc.r(PI, 0.0, 0).measure(0, 2).measure(1, 1).measure(2, 0);
        assert_eq!(qc.measurements(), vec![(0, 2), (1, 1), (2, 0)]);
    }

    #[test]
    fn test_measure_all() {
        let mut qc = NativeCircuit::new("bell", 2, 2);
        qc.measure_all();
        assert_eq!(qc.measurements(), vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_native_check() {
        let mut qc = NativeCircuit::new("c", 2, 2);
        qc.rz(0.3, 0).r(PI / 2.0, 0.0, 1).rxx(PI / 4.0, 0, 1);
        assert!(qc.is_native());

        qc.rx(0.5, 0);
        assert!(!qc.is_native());

        assert!(!Operation::Rxx { qubits: [0, 1], theta: PI }.is_native());
        assert!(!Operation::R { qubit: 0, theta: -0.1, phi: 0.0 }.is_native());
    }

    #[test]
    fn test_operation_serialization() {
        let op = Operation::Measure { qubit: 1, clbit: 0 };
        let json = serde_json::to_string(&op).unwrap();
        assert!(json.contains(r#""operation":"MEASURE""#));
        assert!(json.contains(r#""clbit":0"#));

        let op = Operation::Rxx { qubits: [0, 1], theta: 0.25 };
        let json = serde_json::to_string(&op).unwrap();
        assert!(json.contains(r#""operation":"RXX""#));
        assert!(json.contains("[0,1]"));
    }

    #[test]
    fn test_metadata_passthrough() {
        let qc = NativeCircuit::new("m", 1, 1).with_metadata(serde_json::json!({"run": 7}));
        assert_eq!(Circuit::metadata(&qc)["run"], 7);
        assert_eq!(Circuit::name(&qc), "m");
        assert_eq!(qc.num_clbits(), 1);
    }
}
