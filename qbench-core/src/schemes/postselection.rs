//! Postselection scheme
//!
//! Four circuits combine identity or `U†` on the target with `V0†` or `V1†` on
//! the ancilla. Each is postselected on the expected target outcome.

use super::{finalize, variant, DiscriminationScheme, NamedDistributions};
use crate::circuit::Circuit;
use crate::error::Result;
use crate::fourier::FourierComponents;
use crate::histogram::{count_of, marginal};

#[derive(Debug, Clone, Copy, Default)]
pub struct Postselection;

const NAMES: &[&str] = &["id_v0", "id_v1", "u_v0", "u_v1"];

fn identity_circuit(components: &FourierComponents, v_dag: &Circuit) -> Circuit {
    let mut circuit = components.state_preparation();
    circuit.append(v_dag, &[1]);
    circuit
}

fn black_box_circuit(components: &FourierComponents, v_dag: &Circuit) -> Circuit {
    let mut circuit = components.state_preparation();
    circuit.append(&components.u_dag(), &[0]);
    circuit.append(v_dag, &[1]);
    circuit
}

impl DiscriminationScheme for Postselection {
    fn circuit_names(&self) -> &'static [&'static str] {
        NAMES
    }

    fn assemble(
        &self,
        target: usize,
        ancilla: usize,
        components: &FourierComponents,
    ) -> Result<Vec<(&'static str, Circuit)>> {
        let v0 = components.v0_dag();
        let v1 = components.v1_dag();
        let raw = [
            identity_circuit(components, &v0),
            identity_circuit(components, &v1),
            black_box_circuit(components, &v0),
            black_box_circuit(components, &v1),
        ];

        NAMES
            .iter()
            .zip(raw)
            .map(|(&name, circuit)| Ok((name, finalize(circuit, target, ancilla)?)))
            .collect()
    }

    fn probability(&self, counts: &NamedDistributions) -> Result<f64> {
        // (variant, outcome, postselected target bit)
        let terms = [
            ("u_v0", "00", "0"),
            ("u_v1", "01", "1"),
            ("id_v0", "10", "0"),
            ("id_v1", "11", "1"),
        ];

        let mut sum = 0.0;
        for (name, outcome, target_bit) in terms {
            let dist = variant(counts, name)?;
            sum += count_of(dist, outcome) / count_of(&marginal(dist, 0), target_bit);
        }
        Ok(sum / 4.0)
    }
}
