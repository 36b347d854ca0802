//! Readout error mitigation
//!
//! Implements a tensor-product noise model: each measured bit has its own 2x2
//! confusion matrix, inverted independently.

use crate::backend::BackendProperties;
use crate::histogram::{Distribution, Histogram};
use serde::{Deserialize, Serialize};

/// Single-qubit readout error rates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QubitMitigationInfo {
    /// P(0|1) - probability of measuring 0 when prepared 1
    pub prob_meas0_prep1: f64,
    /// P(1|0) - probability of measuring 1 when prepared 0
    pub prob_meas1_prep0: f64,
}

impl QubitMitigationInfo {
    /// Read error rates of `qubit` from calibration data
    ///
    /// Returns `None` when either rate is not reported.
    pub fn from_properties(properties: &BackendProperties, qubit: usize) -> Option<Self> {
        Some(Self {
            prob_meas0_prep1: properties.qubit_property(qubit, "prob_meas0_prep1")?,
            prob_meas1_prep0: properties.qubit_property(qubit, "prob_meas1_prep0")?,
        })
    }
}

/// Error rates of both qubits of an experiment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MitigationInfo {
    pub target: QubitMitigationInfo,
    pub ancilla: QubitMitigationInfo,
}

impl MitigationInfo {
    /// Read error rates of both qubits from calibration data
    pub fn from_properties(
        properties: &BackendProperties,
        target: usize,
        ancilla: usize,
    ) -> Option<Self> {
        Some(Self {
            target: QubitMitigationInfo::from_properties(properties, target)?,
            ancilla: QubitMitigationInfo::from_properties(properties, ancilla)?,
        })
    }

    /// Mitigator for histograms whose bit 0 is the target and bit 1 the ancilla
    pub fn mitigator(&self) -> ReadoutMitigation {
        ReadoutMitigation::with_error_rates(vec![self.target, self.ancilla])
    }
}

/// Readout Error Mitigation engine
#[derive(Debug, Clone)]
pub struct ReadoutMitigation {
    /// Error rates per classical bit
    bit_errors: Vec<QubitMitigationInfo>,
}

impl ReadoutMitigation {
    /// Create MEM with error rates for classical bits 0, 1, ...
    pub fn with_error_rates(error_rates: Vec<QubitMitigationInfo>) -> Self {
        Self {
            bit_errors: error_rates,
        }
    }

    /// Number of classical bits handled
    pub fn n_bits(&self) -> usize {
        self.bit_errors.len()
    }

    /// Apply mitigation to measurement counts
    ///
    /// Returns a quasi-distribution scaled to the original number of shots.
    /// Bitstrings of the wrong width are ignored.
    pub fn mitigate(&self, counts: &Histogram) -> Distribution {
        let n_bits = self.n_bits();
        let n_states = 1usize << n_bits;

        let mut probs = vec![0.0; n_states];
        let mut total = 0u64;
        for (state, &count) in counts {
            if state.len() != n_bits {
                continue;
            }
            let Ok(idx) = usize::from_str_radix(state, 2) else {
                continue;
            };
            probs[idx] += count as f64;
            total += count;
        }
        if total == 0 {
            return Distribution::new();
        }
        for p in probs.iter_mut() {
            *p /= total as f64;
        }

        // For each bit, apply 2x2 inverse independently
        for (q, err) in self.bit_errors.iter().enumerate() {
            // Confusion matrix: [[1-p10, p01], [p10, 1-p01]]
            // with p10 = P(1|0), p01 = P(0|1)
            let p10 = err.prob_meas1_prep0;
            let p01 = err.prob_meas0_prep1;
            let det = (1.0 - p10) * (1.0 - p01) - p10 * p01;

            if det.abs() < 1e-10 {
                continue; // Singular matrix, skip
            }

            let inv00 = (1.0 - p01) / det;
            let inv01 = -p01 / det;
            let inv10 = -p10 / det;
            let inv11 = (1.0 - p10) / det;

            let mut new_probs = vec![0.0; n_states];
            for state in 0..n_states {
                let bit = (state >> q) & 1;
                let partner = state ^ (1 << q);

                if bit == 0 {
                    new_probs[state] = inv00 * probs[state] + inv01 * probs[partner];
                } else {
                    new_probs[state] = inv10 * probs[partner] + inv11 * probs[state];
                }
            }
            probs = new_probs;
        }

        // Clip and normalize
        let sum: f64 = probs.iter().map(|p| p.max(0.0)).sum();
        let mut result = Distribution::new();
        if sum <= 0.0 {
            return result;
        }
        for (idx, &prob) in probs.iter().enumerate() {
            let prob = prob.max(0.0) / sum;
            if prob > 1e-10 {
                let state = format!("{:0width$b}", idx, width = n_bits);
                result.insert(state, prob * total as f64);
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::QubitProperty;
    use crate::histogram::{count_of, marginal};

    fn rates(p10: f64, p01: f64) -> QubitMitigationInfo {
        QubitMitigationInfo {
            prob_meas1_prep0: p10,
            prob_meas0_prep1: p01,
        }
    }

    /// Histogram with the ancilla on the left and the target on the right
    fn target_ancilla(entries: &[(&str, u64)]) -> Histogram {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_mitigation_restores_ancilla_marginal() {
        // Ancilla prepared in |1>, target evenly split, read through
        // target rates (0.1, 0.2) and ancilla rates (0.21, 0.37)
        let counts = target_ancilla(&[("10", 3465), ("11", 2835), ("00", 2035), ("01", 1665)]);
        let info = MitigationInfo {
            target: rates(0.1, 0.2),
            ancilla: rates(0.21, 0.37),
        };

        let mitigated = info.mitigator().mitigate(&counts);

        let raw: Distribution = counts.iter().map(|(k, &v)| (k.clone(), v as f64)).collect();
        assert!((count_of(&marginal(&raw, 1), "1") - 6300.0).abs() < 1e-9);

        let ancilla = marginal(&mitigated, 1);
        let target = marginal(&mitigated, 0);
        assert!((count_of(&ancilla, "1") - 10_000.0).abs() < 1e-6);
        assert!(count_of(&ancilla, "0") < 1e-6);
        assert!((count_of(&target, "0") - 5000.0).abs() < 1e-6);
        assert!((count_of(&target, "1") - 5000.0).abs() < 1e-6);
    }

    #[test]
    fn test_ideal_rates_keep_target_and_ancilla_counts() {
        let counts = target_ancilla(&[("10", 620), ("01", 250), ("11", 130)]);
        let info = MitigationInfo {
            target: rates(0.0, 0.0),
            ancilla: rates(0.0, 0.0),
        };

        let mitigated = info.mitigator().mitigate(&counts);

        for (state, &count) in &counts {
            assert!((mitigated[state] - count as f64).abs() < 1e-9, "{}", state);
        }
        assert!(!mitigated.contains_key("00"));
        assert!((count_of(&marginal(&mitigated, 1), "1") - 750.0).abs() < 1e-9);
    }

    #[test]
    fn test_mitigation_inverts_single_bit_flip() {
        // Target always prepared in |0>, 10% read as 1
        let mut counts = Histogram::new();
        counts.insert("00".to_string(), 900);
        counts.insert("01".to_string(), 100);

        let mem = ReadoutMitigation::with_error_rates(vec![rates(0.1, 0.0), rates(0.0, 0.0)]);
        let mitigated = mem.mitigate(&counts);

        assert!((mitigated["00"] - 1000.0).abs() < 1e-6);
        assert!(mitigated.get("01").copied().unwrap_or(0.0) < 1e-6);
    }

    #[test]
    fn test_empty_counts() {
        let mem = ReadoutMitigation::with_error_rates(vec![rates(0.1, 0.1)]);
        assert!(mem.mitigate(&Histogram::new()).is_empty());
    }

    #[test]
    fn test_mitigation_info_from_properties() {
        let qubit = vec![
            QubitProperty {
                name: "prob_meas1_prep0".into(),
                value: 0.21,
                unit: String::new(),
            },
            QubitProperty {
                name: "prob_meas0_prep1".into(),
                value: 0.37,
                unit: String::new(),
            },
        ];
        let props = BackendProperties {
            backend_name: "dev".into(),
            qubits: vec![qubit.clone(), qubit, vec![]],
        };

        let info = MitigationInfo::from_properties(&props, 0, 1).unwrap();
        assert_eq!(info.target.prob_meas1_prep0, 0.21);
        assert_eq!(info.ancilla.prob_meas0_prep1, 0.37);

        assert!(MitigationInfo::from_properties(&props, 0, 2).is_none());
        assert!(MitigationInfo::from_properties(&props, 0, 9).is_none());
    }
}
