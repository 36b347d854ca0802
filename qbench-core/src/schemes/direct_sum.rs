//! Direct-sum scheme
//!
//! Two circuits, identity or `U†` on the target, both followed by
//! `V0† ⊕ V1†`. The ancilla outcome decides which measurement was guessed.

use super::{finalize, variant, DiscriminationScheme, NamedDistributions};
use crate::circuit::Circuit;
use crate::error::Result;
use crate::fourier::FourierComponents;
use crate::histogram::{count_of, marginal};

#[derive(Debug, Clone, Copy, Default)]
pub struct DirectSum;

const NAMES: &[&str] = &["id", "u"];

impl DiscriminationScheme for DirectSum {
    fn circuit_names(&self) -> &'static [&'static str] {
        NAMES
    }

    fn assemble(
        &self,
        target: usize,
        ancilla: usize,
        components: &FourierComponents,
    ) -> Result<Vec<(&'static str, Circuit)>> {
        let direct_sum = components.v0_v1_direct_sum_dag();

        let mut id_circuit = components.state_preparation();
        id_circuit.append(&direct_sum, &[0, 1]);

        let mut u_circuit = components.state_preparation();
        u_circuit.append(&components.u_dag(), &[0]);
        u_circuit.append(&direct_sum, &[0, 1]);

        Ok(vec![
            ("id", finalize(id_circuit, target, ancilla)?),
            ("u", finalize(u_circuit, target, ancilla)?),
        ])
    }

    fn probability(&self, counts: &NamedDistributions) -> Result<f64> {
        let id = variant(counts, "id")?;
        let u = variant(counts, "u")?;
        let num_shots: f64 = id.values().sum();

        Ok((count_of(&marginal(id, 1), "1") + count_of(&marginal(u, 1), "0")) / (2.0 * num_shots))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::Distribution;

    fn dist(entries: &[(&str, f64)]) -> Distribution {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_probability_formula() {
        let mut counts = NamedDistributions::new();
        // ancilla is the left character
        counts.insert("id".into(), dist(&[("10", 70.0), ("11", 10.0), ("00", 20.0)]));
        counts.insert("u".into(), dist(&[("00", 40.0), ("01", 20.0), ("10", 40.0)]));

        let p = DirectSum.probability(&counts).unwrap();

        // (80 + 60) / 200
        assert!((p - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_no_shots_is_not_finite() {
        let mut counts = NamedDistributions::new();
        counts.insert("id".into(), Distribution::new());
        counts.insert("u".into(), Distribution::new());

        assert!(!DirectSum.probability(&counts).unwrap().is_finite());
    }

    #[test]
    fn test_assemble() {
        let circuits = DirectSum.assemble(1, 0, &FourierComponents::new(0.0)).unwrap();

        assert_eq!(circuits.len(), 2);
        assert_eq!(circuits[0].0, "id");
        assert_eq!(circuits[1].1.measured, vec![1, 0]);
        // prep (2) + direct sum (4), plus u_dag (3)
        assert_eq!(circuits[0].1.gates.len(), 6);
        assert_eq!(circuits[1].1.gates.len(), 9);
    }
}
