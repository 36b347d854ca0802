//! Discrimination schemes
//!
//! A scheme knows which circuits an experiment needs and how to turn their
//! histograms into a discrimination probability.

mod direct_sum;
mod postselection;

pub use direct_sum::DirectSum;
pub use postselection::Postselection;

use crate::circuit::Circuit;
use crate::error::{QBenchError, Result};
use crate::fourier::FourierComponents;
use crate::histogram::Distribution;
use crate::models::Method;
use std::collections::BTreeMap;

/// Circuit variant name → (possibly mitigated) counts
pub type NamedDistributions = BTreeMap<String, Distribution>;

/// Circuit assembly and probability formula of one scheme
pub trait DiscriminationScheme: Send + Sync {
    /// Names of the circuit variants, in assembly order
    fn circuit_names(&self) -> &'static [&'static str];

    /// Circuits for one experiment, measuring `target` into bit 0 and
    /// `ancilla` into bit 1
    fn assemble(
        &self,
        target: usize,
        ancilla: usize,
        components: &FourierComponents,
    ) -> Result<Vec<(&'static str, Circuit)>>;

    /// Discrimination probability from the counts of every variant
    ///
    /// Fails with [`QBenchError::MissingCircuit`] when a variant is absent.
    /// Degenerate counts yield a non-finite value.
    fn probability(&self, counts: &NamedDistributions) -> Result<f64>;
}

impl Method {
    /// Scheme implementing this method
    pub fn scheme(&self) -> &'static dyn DiscriminationScheme {
        match self {
            Method::Postselection => &Postselection,
            Method::DirectSum => &DirectSum,
        }
    }
}

/// Counts of variant `name`
fn variant<'a>(counts: &'a NamedDistributions, name: &str) -> Result<&'a Distribution> {
    counts
        .get(name)
        .ok_or_else(|| QBenchError::MissingCircuit(name.to_string()))
}

/// Measure both qubits and move them onto `target` and `ancilla`
fn finalize(mut circuit: Circuit, target: usize, ancilla: usize) -> Result<Circuit> {
    circuit.measure_all();
    circuit.remap(&[target, ancilla])
}
