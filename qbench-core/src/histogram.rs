//! Measurement histograms
//!
//! Bitstrings follow the usual little-endian convention: classical bit 0 is the
//! rightmost character.

use std::collections::BTreeMap;

/// Measured bitstring → number of shots
pub type Histogram = BTreeMap<String, u64>;

/// Bitstring → (quasi-)count; used for mitigated data and probability formulas
pub type Distribution = BTreeMap<String, f64>;

/// Total number of shots in a histogram
pub fn total(histogram: &Histogram) -> u64 {
    histogram.values().sum()
}

/// Convert integer counts to floating point counts
pub fn to_distribution(histogram: &Histogram) -> Distribution {
    histogram
        .iter()
        .map(|(bitstring, &count)| (bitstring.clone(), count as f64))
        .collect()
}

/// Marginalize a distribution onto a single classical bit
///
/// The result has keys "0" and/or "1".
pub fn marginal(distribution: &Distribution, bit: usize) -> Distribution {
    let mut result = Distribution::new();
    for (bitstring, &count) in distribution {
        let Some(value) = bitstring.chars().rev().nth(bit) else {
            continue;
        };
        *result.entry(value.to_string()).or_insert(0.0) += count;
    }
    result
}

/// Count stored under `bitstring`, zero when absent
pub fn count_of(distribution: &Distribution, bitstring: &str) -> f64 {
    distribution.get(bitstring).copied().unwrap_or(0.0)
}
