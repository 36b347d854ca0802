//! Fourier discrimination experiments
//!
//! The Fourier family of measurements is `U(phi) = H P(phi) H†`. This module
//! provides the circuit components for a given angle and enumerates every
//! circuit of an experiment set together with its key.
//!
//! Components act on virtual qubits: qubit 0 is the target, qubit 1 the
//! ancilla. Schemes remap them onto physical qubits. Without a gateset the
//! high-level gates below are used; with one, its native decomposition.

use crate::circuit::{Circuit, Gate, GateType};
use crate::error::Result;
use crate::gateset::Gateset;
use crate::models::{CircuitKey, FourierExperimentSet};
use num_complex::Complex64;
use std::f64::consts::PI;

/// Components of the Fourier discrimination experiment for one angle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FourierComponents {
    pub phi: f64,
    pub gateset: Option<Gateset>,
}

impl FourierComponents {
    pub fn new(phi: f64) -> Self {
        Self { phi, gateset: None }
    }

    pub fn with_gateset(phi: f64, gateset: Option<Gateset>) -> Self {
        Self { phi, gateset }
    }

    /// Bell state preparation |00> → (|00> + |11>)/√2
    pub fn state_preparation(&self) -> Circuit {
        if let Some(gateset) = self.gateset {
            return gateset.state_preparation();
        }
        let mut circuit = Circuit::new(2);
        circuit.add(Gate::single(GateType::H, 0));
        circuit.add(Gate::two(GateType::CNOT, 0, 1));
        circuit
    }

    /// Basis change `U†`, so that a Z measurement realises `U(phi)`
    pub fn u_dag(&self) -> Circuit {
        if let Some(gateset) = self.gateset {
            return gateset.u_dag(self.phi);
        }
        let mut circuit = Circuit::new(1);
        circuit.add(Gate::single(GateType::H, 0));
        circuit.add(Gate::single(GateType::Phase(-self.phi), 0));
        circuit.add(Gate::single(GateType::H, 0));
        circuit
    }

    /// Positive part of the Holevo-Helstrom measurement
    pub fn v0_dag(&self) -> Circuit {
        if let Some(gateset) = self.gateset {
            return gateset.v0_dag(self.phi);
        }
        let mut circuit = Circuit::new(1);
        circuit.add(Gate::single(GateType::Rz(-PI / 2.0), 0));
        circuit.add(Gate::single(GateType::Ry(-(self.phi + PI) / 2.0), 0));
        circuit
    }

    /// Negative part of the Holevo-Helstrom measurement
    pub fn v1_dag(&self) -> Circuit {
        if let Some(gateset) = self.gateset {
            return gateset.v1_dag(self.phi);
        }
        let mut circuit = self.v0_dag();
        circuit.add(Gate::single(GateType::Rx(-PI), 0));
        circuit
    }

    /// Direct sum `V0† ⊕ V1†`, controlled by qubit 0
    pub fn v0_v1_direct_sum_dag(&self) -> Circuit {
        if let Some(gateset) = self.gateset {
            return gateset.v0_v1_direct_sum_dag(self.phi);
        }
        let mut circuit = Circuit::new(2);
        circuit.add(Gate::single(GateType::Phase(PI), 0));
        circuit.append(&self.v0_dag(), &[1]);
        circuit.add(Gate::two(GateType::CNOT, 0, 1));
        circuit
    }
}

/// Optimal probability of discriminating `U(phi)` from the Z measurement
///
/// `p = 1/2 + |1 - e^{i phi}| / 4`
pub fn discrimination_probability_upper_bound(phi: f64) -> f64 {
    0.5 + 0.25 * (Complex64::new(1.0, 0.0) - Complex64::from_polar(1.0, phi)).norm()
}

/// All circuits of an experiment set with their keys
///
/// Order: qubit pairs, then angles, then the scheme's circuit variants.
pub fn collect_circuits_and_keys(
    experiments: &FourierExperimentSet,
) -> Result<(Vec<Circuit>, Vec<CircuitKey>)> {
    let scheme = experiments.method.scheme();
    let labels = experiments.enumerate_experiment_labels();

    let mut circuits = Vec::with_capacity(labels.len() * scheme.circuit_names().len());
    let mut keys = Vec::with_capacity(circuits.capacity());
    for label in labels {
        let components = FourierComponents::with_gateset(label.phi, experiments.gateset);
        for (name, circuit) in scheme.assemble(label.target, label.ancilla, &components)? {
            circuits.push(circuit);
            keys.push(CircuitKey::new(label.target, label.ancilla, name, label.phi));
        }
    }
    Ok((circuits, keys))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnglesRange, ExperimentKind, Method, QubitsPair};
    use crate::simulator::outcome_probabilities;

    fn experiments(method: Method) -> FourierExperimentSet {
        FourierExperimentSet {
            kind: ExperimentKind::DiscriminationFourier,
            qubits: vec![
                QubitsPair {
                    target: 0,
                    ancilla: 1,
                },
                QubitsPair {
                    target: 3,
                    ancilla: 2,
                },
            ],
            angles: AnglesRange {
                start: 0.0,
                stop: PI,
                num_steps: 3,
            },
            method,
            num_shots: 100,
            gateset: None,
        }
    }

    #[test]
    fn test_upper_bound_endpoints() {
        assert!((discrimination_probability_upper_bound(0.0) - 0.5).abs() < 1e-12);
        assert!((discrimination_probability_upper_bound(PI) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_v1_extends_v0() {
        let components = FourierComponents::new(0.3);
        let v0 = components.v0_dag();
        let v1 = components.v1_dag();

        assert_eq!(v1.gates.len(), v0.gates.len() + 1);
        assert_eq!(&v1.gates[..2], &v0.gates[..]);
        assert_eq!(v1.gates[2].gate_type, GateType::Rx(-PI));
    }

    #[test]
    fn test_direct_sum_places_v0_on_ancilla() {
        let circuit = FourierComponents::new(1.0).v0_v1_direct_sum_dag();

        assert_eq!(circuit.gates.len(), 4);
        assert_eq!(circuit.gates[1].qubits, vec![1]);
        assert_eq!(circuit.gates[2].qubits, vec![1]);
        assert_eq!(circuit.gates[3].qubits, vec![0, 1]);
    }

    #[test]
    fn test_collect_postselection_order() {
        let (circuits, keys) = collect_circuits_and_keys(&experiments(Method::Postselection)).unwrap();

        assert_eq!(circuits.len(), 2 * 3 * 4);
        assert_eq!(keys.len(), circuits.len());
        assert_eq!(keys[0], CircuitKey::new(0, 1, "id_v0", 0.0));
        assert_eq!(keys[3], CircuitKey::new(0, 1, "u_v1", 0.0));
        assert_eq!(keys[4].phi, PI / 2.0);
        assert_eq!(keys[12].target, 3);
        assert_eq!(circuits[12].measured, vec![3, 2]);
    }

    #[test]
    fn test_collect_direct_sum_order() {
        let (circuits, keys) = collect_circuits_and_keys(&experiments(Method::DirectSum)).unwrap();

        assert_eq!(circuits.len(), 2 * 3 * 2);
        let names: Vec<&str> = keys.iter().take(4).map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["id", "u", "id", "u"]);
    }

    #[test]
    fn test_native_gatesets_give_generic_outcome_probabilities() {
        for method in [Method::Postselection, Method::DirectSum] {
            let generic = experiments(method);
            let (reference, _) = collect_circuits_and_keys(&generic).unwrap();

            for gateset in [Gateset::Lucy, Gateset::Rigetti, Gateset::Ibmq] {
                let native = FourierExperimentSet {
                    gateset: Some(gateset),
                    ..generic.clone()
                };
                let (circuits, _) = collect_circuits_and_keys(&native).unwrap();
                assert_eq!(circuits.len(), reference.len());

                for (circuit, expected) in circuits.iter().zip(&reference) {
                    let actual = outcome_probabilities(circuit).unwrap();
                    let expected = outcome_probabilities(expected).unwrap();
                    for (a, e) in actual.iter().zip(&expected) {
                        assert!((a - e).abs() < 1e-9, "{} / {}: {} vs {}", gateset, method, a, e);
                    }
                }
            }
        }
    }

    #[test]
    fn test_native_state_preparation_is_bell_state() {
        for gateset in [Gateset::Lucy, Gateset::Rigetti, Gateset::Ibmq] {
            let mut circuit = FourierComponents::with_gateset(0.1, Some(gateset)).state_preparation();
            circuit.measure_all();

            let probs = outcome_probabilities(&circuit).unwrap();
            assert!((probs[0] - 0.5).abs() < 1e-12, "{}", gateset);
            assert!((probs[3] - 0.5).abs() < 1e-12, "{}", gateset);
        }
    }
}
