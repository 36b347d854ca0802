//! Tabulation of resolved results into discrimination probabilities

use crate::error::{QBenchError, Result};
use crate::histogram::to_distribution;
use crate::models::SingleResult;
use crate::schemes::NamedDistributions;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Probability formula applied to the named counts of one experiment
pub type ProbabilityFn<'a> = dyn Fn(&NamedDistributions) -> Result<f64> + 'a;

/// One experiment's discrimination probability
///
/// A `None` probability flags an experiment whose data could not feed the
/// formula (no surviving results, a missing variant, or degenerate counts).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub target: usize,
    pub ancilla: usize,
    pub phi: f64,
    pub disc_prob: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mit_disc_prob: Option<f64>,
}

/// Tabulated results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<Row>,
    /// Whether the `mit_disc_prob` column is present
    pub mitigated: bool,
}

impl Table {
    /// Export as CSV; flagged values are empty cells
    pub fn to_csv(&self) -> String {
        let mut csv = String::from("target,ancilla,phi,disc_prob");
        if self.mitigated {
            csv.push_str(",mit_disc_prob");
        }
        csv.push('\n');

        for row in &self.rows {
            let _ = write!(
                csv,
                "{},{},{},{}",
                row.target,
                row.ancilla,
                row.phi,
                cell(row.disc_prob)
            );
            if self.mitigated {
                let _ = write!(csv, ",{}", cell(row.mit_disc_prob));
            }
            csv.push('\n');
        }

        csv
    }

    /// Rows that could not be computed
    pub fn flagged(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().filter(|row| row.disc_prob.is_none())
    }
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Whether every circuit carries mitigation data
///
/// Experiments without results are ignored. Partial coverage is an error.
fn mitigation_coverage(results: &[SingleResult]) -> Result<bool> {
    let circuits = results.iter().flat_map(|r| &r.results_per_circuit);
    let total = circuits.clone().count();
    let with = circuits
        .filter(|c| c.mitigated_histogram.is_some())
        .count();

    if with > 0 && with < total {
        return Err(QBenchError::InconsistentMitigation { with, total });
    }
    Ok(total > 0 && with == total)
}

/// Evaluate `probability`, flagging missing or degenerate inputs
fn evaluate(probability: &ProbabilityFn<'_>, counts: &NamedDistributions) -> Result<Option<f64>> {
    match probability(counts) {
        Ok(p) if p.is_finite() => Ok(Some(p)),
        Ok(_) | Err(QBenchError::MissingCircuit(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Compute one row per experiment
///
/// Mitigated probabilities are computed only when every circuit of every
/// non-empty experiment carries a mitigated histogram.
pub fn tabulate(results: &[SingleResult], probability: &ProbabilityFn<'_>) -> Result<Table> {
    let mitigated = mitigation_coverage(results)?;

    let mut rows = Vec::with_capacity(results.len());
    for entry in results {
        let raw: NamedDistributions = entry
            .results_per_circuit
            .iter()
            .map(|c| (c.name.clone(), to_distribution(&c.histogram)))
            .collect();

        let mit_disc_prob = if mitigated && !entry.results_per_circuit.is_empty() {
            let corrected: NamedDistributions = entry
                .results_per_circuit
                .iter()
                .filter_map(|c| Some((c.name.clone(), c.mitigated_histogram.clone()?)))
                .collect();
            evaluate(probability, &corrected)?
        } else {
            None
        };

        rows.push(Row {
            target: entry.target,
            ancilla: entry.ancilla,
            phi: entry.phi,
            disc_prob: evaluate(probability, &raw)?,
            mit_disc_prob,
        });
    }

    Ok(Table { rows, mitigated })
}
