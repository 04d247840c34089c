//! Angle normalization for the native gate set.
//!
//! The resource accepts `R(θ, φ)` with θ ∈ [0, π] and `RXX(θ)` with
//! θ ∈ [0, π/2]. These rewrites are pure and stateless; they are applied
//! by the driver before a circuit is handed to the coordinator.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::circuit::{NativeCircuit, Operation};

/// `RX(θ)` as `R(θ', φ)` with θ' ∈ [0, π] and φ ∈ {0, π}.
pub fn rewrite_rx_as_r(qubit: u32, theta: f64) -> Operation {
    let theta = theta.sin().atan2(theta.cos());
    let phi = if theta < 0.0 { PI } else { 0.0 };
    Operation::R {
        qubit,
        theta: theta.abs(),
        phi,
    }
}

/// `RXX(θ)` for θ ∈ [-π/2, π/2] with a non-negative entangling angle.
fn rxx_positive_angle(qubits: [u32; 2], theta: f64) -> Vec<Operation> {
    let rxx = Operation::Rxx {
        qubits,
        theta: theta.abs(),
    };

    if theta >= 0.0 {
        return vec![rxx];
    }

    vec![
        Operation::Rz {
            qubit: qubits[0],
            phi: PI,
        },
        rxx,
        Operation::Rz {
            qubit: qubits[0],
            phi: PI,
        },
    ]
}

/// Operations equivalent to `RXX(θ)` whose entangling angle lies in [0, π/2].
pub fn wrap_rxx_angle(qubits: [u32; 2], theta: f64) -> Vec<Operation> {
    if theta.abs() <= FRAC_PI_2 {
        return rxx_positive_angle(qubits, theta);
    }

    // RXX is 2π-periodic
    let theta = theta.rem_euclid(2.0 * PI);

    if theta <= FRAC_PI_2 {
        rxx_positive_angle(qubits, theta)
    } else if theta <= 3.0 * FRAC_PI_2 {
        let mut ops = vec![
            rewrite_rx_as_r(qubits[0], PI),
            rewrite_rx_as_r(qubits[1], PI),
        ];
        ops.extend(rxx_positive_angle(qubits, theta - PI));
        ops
    } else {
        rxx_positive_angle(qubits, theta - 2.0 * PI)
    }
}

/// Rewrite every `RX` as `R` and wrap `RXX` angles outside [0, π/2].
pub fn normalize(circuit: &NativeCircuit) -> NativeCircuit {
    let mut out = NativeCircuit {
        operations: Vec::with_capacity(circuit.operations.len()),
        ..circuit.clone()
    };

    for op in &circuit.operations {
        match *op {
            Operation::Rx { qubit, theta } => out.operations.push(rewrite_rx_as_r(qubit, theta)),
            Operation::Rxx { qubits, theta } if !(0.0..=FRAC_PI_2).contains(&theta) => {
                out.operations.extend(wrap_rxx_angle(qubits, theta));
            }
            _ => out.operations.push(op.clone()),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-10, "{a} != {b}");
    }

    #[test]
    fn test_rx_positive_angle() {
        match rewrite_rx_as_r(3, PI / 3.0) {
            Operation::R { qubit, theta, phi } => {
                assert_eq!(qubit, 3);
                assert_close(theta, PI / 3.0);
                assert_close(phi, 0.0);
            }
            other => panic!("Expected R op, got {other:?}"),
        }
    }

    #[test]
    fn test_rx_negative_angle_flips_phase() {
        match rewrite_rx_as_r(0, -PI / 2.0) {
            Operation::R { theta, phi, .. } => {
                assert_close(theta, PI / 2.0);
                assert_close(phi, PI);
            }
            other => panic!("Expected R op, got {other:?}"),
        }
    }

    #[test]
    fn test_rx_angle_wraps_into_range() {
        // 3π/2 ≡ -π/2
        match rewrite_rx_as_r(0, 3.0 * PI / 2.0) {
            Operation::R { theta, phi, .. } => {
                assert_close(theta, PI / 2.0);
                assert_close(phi, PI);
            }
            other => panic!("Expected R op, got {other:?}"),
        }
    }

    #[test]
    fn test_rxx_small_positive_unchanged() {
        let ops = wrap_rxx_angle([0, 1], PI / 4.0);
        assert_eq!(
            ops,
            vec![Operation::Rxx {
                qubits: [0, 1],
                theta: PI / 4.0
            }]
        );
    }

    #[test]
    fn test_rxx_small_negative_conjugated() {
        let ops = wrap_rxx_angle([2, 5], -PI / 4.0);
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0], Operation::Rz { qubit: 2, phi: PI });
        assert_eq!(
            ops[1],
            Operation::Rxx {
                qubits: [2, 5],
                theta: PI / 4.0
            }
        );
        assert_eq!(ops[2], Operation::Rz { qubit: 2, phi: PI });
    }

    #[test]
    fn test_rxx_middle_band_adds_x_flips() {
        let ops = wrap_rxx_angle([0, 1], PI);
        assert_eq!(ops.len(), 3);
        assert!(matches!(ops[0], Operation::R { qubit: 0, .. }));
        assert!(matches!(ops[1], Operation::R { qubit: 1, .. }));
        match ops[2] {
            Operation::Rxx { theta, .. } => assert_close(theta, 0.0),
            ref other => panic!("Expected Rxx op, got {other:?}"),
        }
    }

    #[test]
    fn test_rxx_upper_band_uses_periodicity() {
        let ops = wrap_rxx_angle([0, 1], 7.0 * PI / 4.0);
        assert_eq!(ops.len(), 3);
        match ops[1] {
            Operation::Rxx { theta, .. } => assert_close(theta, PI / 4.0),
            ref other => panic!("Expected Rxx op, got {other:?}"),
        }
    }

    #[test]
    fn test_wrapped_angles_always_native() {
        let mut theta = -4.0 * PI;
        while theta <= 4.0 * PI {
            for op in wrap_rxx_angle([0, 1], theta) {
                assert!(op.is_native(), "theta={theta}: {op:?}");
            }
            theta += PI / 7.0;
        }
    }

    #[test]
    fn test_normalize_circuit() {
        let mut qc = NativeCircuit::new("n", 2, 2);
        qc.rx(-PI / 2.0, 0).rxx(PI / 8.0, 0, 1).rxx(-PI / 8.0, 0, 1).measure_all();
        assert!(!qc.is_native());

        let native = normalize(&qc);
        assert!(native.is_native());
        // R + RXX + (RZ, RXX, RZ) + 2 × MEASURE
        assert_eq!(native.operations.len(), 7);
        assert_eq!(native.name, "n");
        assert_eq!(native.operations[5], Operation::Measure { qubit: 0, clbit: 0 });
    }
}
