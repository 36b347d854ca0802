//! Device-native decompositions of the Fourier components
//!
//! Each gateset rewrites the components using only gates a device runs
//! natively, so circuits need no further compilation:
//! - `lucy` (OQC Lucy): SX, Rz, X, ECR
//! - `rigetti`: Rx(±π/2), Rz, CZ
//! - `ibmq`: SX, Rz, X, CNOT
//!
//! Every decomposition equals its generic counterpart up to global phase.

use crate::circuit::{Circuit, Gate, GateType};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Predefined basis gate set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gateset {
    Lucy,
    Rigetti,
    Ibmq,
}

impl std::fmt::Display for Gateset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lucy => write!(f, "lucy"),
            Self::Rigetti => write!(f, "rigetti"),
            Self::Ibmq => write!(f, "ibmq"),
        }
    }
}

/// Builder for short gate sequences
struct Sequence(Circuit);

impl Sequence {
    fn new(n_qubits: usize) -> Self {
        Self(Circuit::new(n_qubits))
    }

    fn gate(mut self, gate_type: GateType, qubit: usize) -> Self {
        self.0.add(Gate::single(gate_type, qubit));
        self
    }

    fn two(mut self, gate_type: GateType, control: usize, target: usize) -> Self {
        self.0.add(Gate::two(gate_type, control, target));
        self
    }

    fn append(mut self, other: &Circuit, qubits: &[usize]) -> Self {
        self.0.append(other, qubits);
        self
    }

    fn build(self) -> Circuit {
        self.0
    }
}

impl Gateset {
    /// |00> → Bell state
    pub fn state_preparation(&self) -> Circuit {
        match self {
            Gateset::Lucy => Sequence::new(2)
                .gate(GateType::SX, 0)
                .gate(GateType::Rz(PI), 0)
                .gate(GateType::X, 0)
                .gate(GateType::SX, 1)
                .two(GateType::ECR, 0, 1)
                .build(),
            Gateset::Rigetti => Sequence::new(2)
                .append(&rigetti_hadamard(), &[0])
                .append(&rigetti_cnot(), &[0, 1])
                .build(),
            Gateset::Ibmq => Sequence::new(2)
                .gate(GateType::Rz(PI / 2.0), 0)
                .gate(GateType::SX, 0)
                .gate(GateType::Rz(PI / 2.0), 0)
                .two(GateType::CNOT, 0, 1)
                .build(),
        }
    }

    pub fn u_dag(&self, phi: f64) -> Circuit {
        match self {
            Gateset::Lucy | Gateset::Ibmq => Sequence::new(1)
                .gate(GateType::SX, 0)
                .gate(GateType::Rz(PI / 2.0), 0)
                .gate(GateType::SX, 0)
                .gate(GateType::Rz(-phi), 0)
                .gate(GateType::SX, 0)
                .gate(GateType::Rz(PI / 2.0), 0)
                .gate(GateType::SX, 0)
                .build(),
            Gateset::Rigetti => Sequence::new(1)
                .gate(GateType::Rz(PI / 2.0), 0)
                .gate(GateType::Rx(PI / 2.0), 0)
                .gate(GateType::Rz(-phi), 0)
                .gate(GateType::Rx(-PI / 2.0), 0)
                .gate(GateType::Rz(-PI / 2.0), 0)
                .build(),
        }
    }

    pub fn v0_dag(&self, phi: f64) -> Circuit {
        match self {
            Gateset::Lucy | Gateset::Ibmq => Sequence::new(1)
                .gate(GateType::Rz(-PI / 2.0), 0)
                .gate(GateType::SX, 0)
                .gate(GateType::Rz(-(phi + PI) / 2.0), 0)
                .gate(GateType::SX, 0)
                .gate(GateType::X, 0)
                .build(),
            Gateset::Rigetti => Sequence::new(1)
                .gate(GateType::Rz(-PI / 2.0), 0)
                .gate(GateType::Rx(PI / 2.0), 0)
                .gate(GateType::Rz(-(phi + PI) / 2.0), 0)
                .gate(GateType::Rx(-PI / 2.0), 0)
                .build(),
        }
    }

    pub fn v1_dag(&self, phi: f64) -> Circuit {
        match self {
            Gateset::Lucy | Gateset::Ibmq => Sequence::new(1)
                .gate(GateType::Rz(PI / 2.0), 0)
                .gate(GateType::SX, 0)
                .gate(GateType::Rz(-(PI - phi) / 2.0), 0)
                .gate(GateType::X, 0)
                .gate(GateType::SX, 0)
                .build(),
            Gateset::Rigetti => Sequence::new(1)
                .gate(GateType::Rz(PI / 2.0), 0)
                .gate(GateType::Rx(PI / 2.0), 0)
                .gate(GateType::Rz(-(PI - phi) / 2.0), 0)
                .gate(GateType::Rx(-PI / 2.0), 0)
                .build(),
        }
    }

    pub fn v0_v1_direct_sum_dag(&self, phi: f64) -> Circuit {
        match self {
            Gateset::Lucy => Sequence::new(2)
                .gate(GateType::Rz(-PI / 2.0), 1)
                .gate(GateType::SX, 1)
                .gate(GateType::Rz(-(phi + PI) / 2.0), 1)
                .gate(GateType::Rz(3.0 * PI / 2.0), 0)
                .gate(GateType::X, 0)
                .two(GateType::ECR, 0, 1)
                .build(),
            Gateset::Rigetti => Sequence::new(2)
                .gate(GateType::Rz(PI), 0)
                .append(&self.v0_dag(phi), &[1])
                .append(&rigetti_cnot(), &[0, 1])
                .build(),
            Gateset::Ibmq => Sequence::new(2)
                .gate(GateType::Rz(PI), 0)
                .append(&self.v0_dag(phi), &[1])
                .two(GateType::CNOT, 0, 1)
                .build(),
        }
    }
}

/// H = Rx(π/2) Rz(π/2) Rx(π/2)
fn rigetti_hadamard() -> Circuit {
    Sequence::new(1)
        .gate(GateType::Rx(PI / 2.0), 0)
        .gate(GateType::Rz(PI / 2.0), 0)
        .gate(GateType::Rx(PI / 2.0), 0)
        .build()
}

/// CNOT(0, 1) = H(1) CZ(0, 1) H(1)
fn rigetti_cnot() -> Circuit {
    let hadamard = rigetti_hadamard();
    Sequence::new(2)
        .append(&hadamard, &[1])
        .two(GateType::CZ, 0, 1)
        .append(&hadamard, &[1])
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn native(gateset: Gateset, gate_type: &GateType) -> bool {
        match gateset {
            Gateset::Lucy => matches!(
                gate_type,
                GateType::SX | GateType::Rz(_) | GateType::X | GateType::ECR
            ),
            Gateset::Rigetti => match gate_type {
                GateType::Rx(angle) => (angle.abs() - PI / 2.0).abs() < 1e-12,
                GateType::Rz(_) | GateType::CZ => true,
                _ => false,
            },
            Gateset::Ibmq => matches!(
                gate_type,
                GateType::SX | GateType::Rz(_) | GateType::X | GateType::CNOT
            ),
        }
    }

    #[test]
    fn test_components_use_only_native_gates() {
        for gateset in [Gateset::Lucy, Gateset::Rigetti, Gateset::Ibmq] {
            let circuits = [
                gateset.state_preparation(),
                gateset.u_dag(0.1),
                gateset.v0_dag(0.1),
                gateset.v1_dag(0.1),
                gateset.v0_v1_direct_sum_dag(0.1),
            ];
            for circuit in &circuits {
                for gate in &circuit.gates {
                    assert!(
                        native(gateset, &gate.gate_type),
                        "{:?} is not native to {}",
                        gate.gate_type,
                        gateset
                    );
                }
            }
        }
    }

    #[test]
    fn test_gateset_names() {
        let parsed: Gateset = serde_json::from_str("\"rigetti\"").unwrap();
        assert_eq!(parsed, Gateset::Rigetti);
        assert_eq!(serde_json::to_string(&Gateset::Ibmq).unwrap(), "\"ibmq\"");
        assert!(serde_json::from_str::<Gateset>("\"aspen\"").is_err());
    }
}
