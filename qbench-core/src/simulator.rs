//! Statevector simulator backing the mock backends
//!
//! Only qubits a circuit touches are simulated, so circuits placed on high
//! physical indices stay cheap.

use crate::circuit::{Circuit, GateType};
use crate::error::{QBenchError, Result};
use crate::histogram::Histogram;
use crate::mitigation::QubitMitigationInfo;
use ndarray::{arr2, Array1, Array2};
use num_complex::Complex64;
use rand::distributions::{Distribution as _, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeSet;

/// Largest number of active qubits accepted
pub const MAX_ACTIVE_QUBITS: usize = 16;

/// Pure state of `n_qubits`; basis index bit `q` is qubit `q`
#[derive(Debug, Clone)]
pub struct StateVector {
    pub n_qubits: usize,
    pub amplitudes: Array1<Complex64>,
}

impl StateVector {
    /// |0...0>
    pub fn new(n_qubits: usize) -> Self {
        let mut amplitudes = Array1::<Complex64>::zeros(1 << n_qubits);
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Self {
            n_qubits,
            amplitudes,
        }
    }

    pub fn dimension(&self) -> usize {
        self.amplitudes.len()
    }

    pub fn probability(&self, index: usize) -> f64 {
        self.amplitudes.get(index).map_or(0.0, |a| a.norm_sqr())
    }

    /// Apply a 2x2 unitary to `qubit`
    pub fn apply_single(&mut self, qubit: usize, gate: &Array2<Complex64>) -> Result<()> {
        let inner_dim = 1 << qubit;
        let outer_dim = self.dimension() / (2 * inner_dim);

        // View as (Outer, 2, Inner); the middle axis is the target qubit
        let mut tensor = self
            .amplitudes
            .view_mut()
            .into_shape((outer_dim, 2, inner_dim))
            .map_err(|e| QBenchError::InvalidCircuit(e.to_string()))?;

        let (u00, u01, u10, u11) = (gate[[0, 0]], gate[[0, 1]], gate[[1, 0]], gate[[1, 1]]);
        for mut chunk in tensor.outer_iter_mut() {
            for i in 0..inner_dim {
                let alpha = chunk[[0, i]];
                let beta = chunk[[1, i]];
                chunk[[0, i]] = u00 * alpha + u01 * beta;
                chunk[[1, i]] = u10 * alpha + u11 * beta;
            }
        }
        Ok(())
    }

    /// Controlled NOT
    pub fn apply_cnot(&mut self, control: usize, target: usize) {
        let control_bit = 1 << control;
        let target_bit = 1 << target;
        for i in 0..self.dimension() {
            // Visit each swapped pair once
            if i & control_bit != 0 && i & target_bit == 0 {
                self.amplitudes.swap(i, i | target_bit);
            }
        }
    }

    /// Controlled Z
    pub fn apply_cz(&mut self, a: usize, b: usize) {
        let mask = (1 << a) | (1 << b);
        for (i, amplitude) in self.amplitudes.iter_mut().enumerate() {
            if i & mask == mask {
                *amplitude = -*amplitude;
            }
        }
    }

    /// Echoed cross-resonance
    ///
    /// Rx(π/2) on `target` when `control` is 0, Rx(-π/2) when it is 1, then
    /// X on `control`.
    pub fn apply_ecr(&mut self, control: usize, target: usize) {
        let c_bit = 1 << control;
        let t_bit = 1 << target;
        let r = Complex64::new(std::f64::consts::FRAC_1_SQRT_2, 0.0);
        let i = Complex64::new(0.0, 1.0);

        for base in 0..self.dimension() {
            if base & (c_bit | t_bit) != 0 {
                continue;
            }
            // Indices named by (control, target) bits
            let (i00, i01, i10, i11) = (base, base | t_bit, base | c_bit, base | c_bit | t_bit);
            let (a00, a01, a10, a11) = (
                self.amplitudes[i00],
                self.amplitudes[i01],
                self.amplitudes[i10],
                self.amplitudes[i11],
            );
            self.amplitudes[i10] = r * (a00 - i * a01);
            self.amplitudes[i11] = r * (a01 - i * a00);
            self.amplitudes[i00] = r * (a10 + i * a11);
            self.amplitudes[i01] = r * (a11 + i * a10);
        }
    }

    /// Probabilities of outcomes on `qubits`; outcome bit `i` is `qubits[i]`
    pub fn marginal_probabilities(&self, qubits: &[usize]) -> Vec<f64> {
        let mut probs = vec![0.0; 1 << qubits.len()];
        for (index, amplitude) in self.amplitudes.iter().enumerate() {
            let outcome = qubits
                .iter()
                .enumerate()
                .fold(0, |acc, (bit, &q)| acc | (((index >> q) & 1) << bit));
            probs[outcome] += amplitude.norm_sqr();
        }
        probs
    }
}

/// Matrix of a single-qubit gate
fn single_qubit_matrix(gate: &GateType) -> Option<Array2<Complex64>> {
    let c = |re: f64, im: f64| Complex64::new(re, im);
    let matrix = match *gate {
        GateType::X => arr2(&[[c(0.0, 0.0), c(1.0, 0.0)], [c(1.0, 0.0), c(0.0, 0.0)]]),
        GateType::SX => arr2(&[[c(0.5, 0.5), c(0.5, -0.5)], [c(0.5, -0.5), c(0.5, 0.5)]]),
        GateType::H => {
            let r = std::f64::consts::FRAC_1_SQRT_2;
            arr2(&[[c(r, 0.0), c(r, 0.0)], [c(r, 0.0), c(-r, 0.0)]])
        }
        GateType::Rx(theta) => {
            let (s, co) = (theta / 2.0).sin_cos();
            arr2(&[[c(co, 0.0), c(0.0, -s)], [c(0.0, -s), c(co, 0.0)]])
        }
        GateType::Ry(theta) => {
            let (s, co) = (theta / 2.0).sin_cos();
            arr2(&[[c(co, 0.0), c(-s, 0.0)], [c(s, 0.0), c(co, 0.0)]])
        }
        GateType::Rz(theta) => arr2(&[
            [Complex64::from_polar(1.0, -theta / 2.0), c(0.0, 0.0)],
            [c(0.0, 0.0), Complex64::from_polar(1.0, theta / 2.0)],
        ]),
        GateType::Phase(lambda) => arr2(&[
            [c(1.0, 0.0), c(0.0, 0.0)],
            [c(0.0, 0.0), Complex64::from_polar(1.0, lambda)],
        ]),
        GateType::CNOT | GateType::CZ | GateType::ECR => return None,
    };
    Some(matrix)
}

/// Run `circuit` and return its final state over the active qubits
///
/// Also returns the active physical qubits, in compact order.
pub fn simulate(circuit: &Circuit) -> Result<(StateVector, Vec<usize>)> {
    circuit.validate()?;

    let active: Vec<usize> = circuit
        .gates
        .iter()
        .flat_map(|g| g.qubits.iter().copied())
        .chain(circuit.measured.iter().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if active.len() > MAX_ACTIVE_QUBITS {
        return Err(QBenchError::InvalidCircuit(format!(
            "Circuit acts on {} qubits, simulator supports {}",
            active.len(),
            MAX_ACTIVE_QUBITS
        )));
    }
    let compact = |q: usize| active.binary_search(&q).unwrap_or_default();

    let mut state = StateVector::new(active.len());
    for gate in &circuit.gates {
        match gate.gate_type {
            GateType::CNOT => state.apply_cnot(compact(gate.qubits[0]), compact(gate.qubits[1])),
            GateType::CZ => state.apply_cz(compact(gate.qubits[0]), compact(gate.qubits[1])),
            GateType::ECR => state.apply_ecr(compact(gate.qubits[0]), compact(gate.qubits[1])),
            ref single => {
                if let Some(matrix) = single_qubit_matrix(single) {
                    state.apply_single(compact(gate.qubits[0]), &matrix)?;
                }
            }
        }
    }
    Ok((state, active))
}

/// Outcome probabilities of the measured qubits of `circuit`
///
/// Index bit `i` is classical bit `i`.
pub fn outcome_probabilities(circuit: &Circuit) -> Result<Vec<f64>> {
    let (state, active) = simulate(circuit)?;
    let measured: Vec<usize> = circuit
        .measured
        .iter()
        .map(|q| active.binary_search(q).unwrap_or_default())
        .collect();
    Ok(state.marginal_probabilities(&measured))
}

/// Push outcome probabilities through independent per-bit readout errors
///
/// For every bit:
/// P'(0) = (1-p10)*P(0) + p01*P(1)
/// P'(1) = p10*P(0) + (1-p01)*P(1)
pub fn apply_readout_error(probs: &[f64], error: &QubitMitigationInfo) -> Vec<f64> {
    let p10 = error.prob_meas1_prep0;
    let p01 = error.prob_meas0_prep1;
    let n_bits = probs.len().trailing_zeros() as usize;

    let mut noisy = probs.to_vec();
    for bit in 0..n_bits {
        let mask = 1 << bit;
        for zero in (0..noisy.len()).filter(|i| i & mask == 0) {
            let one = zero | mask;
            let (p0, p1) = (noisy[zero], noisy[one]);
            noisy[zero] = (1.0 - p10) * p0 + p01 * p1;
            noisy[one] = p10 * p0 + (1.0 - p01) * p1;
        }
    }
    noisy
}

/// Sample `shots` measurement outcomes of `circuit`
///
/// Bitstrings print classical bit 0 rightmost. With `readout_error`, every
/// measured bit is misread at the given rates.
pub fn sample_counts(
    circuit: &Circuit,
    shots: u32,
    seed: u64,
    readout_error: Option<&QubitMitigationInfo>,
) -> Result<Histogram> {
    let n_bits = circuit.n_clbits();
    let mut probs = outcome_probabilities(circuit)?;
    if let Some(error) = readout_error {
        probs = apply_readout_error(&probs, error);
    }

    let sampler =
        WeightedIndex::new(&probs).map_err(|e| QBenchError::InvalidCircuit(e.to_string()))?;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut counts = Histogram::new();
    for _ in 0..shots {
        let outcome = sampler.sample(&mut rng);
        let bitstring = format!("{:0width$b}", outcome, width = n_bits);
        *counts.entry(bitstring).or_insert(0) += 1;
    }
    Ok(counts)
}
