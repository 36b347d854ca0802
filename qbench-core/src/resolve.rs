//! Resolution of batch jobs into per-experiment results
//!
//! Every circuit result is read independently: a circuit whose result cannot
//! be read, for whatever reason, is dropped and counted, and the remaining
//! results are still regrouped by `(target, ancilla, phi)`.

use crate::backend::BackendProperties;
use crate::batching::BatchJob;
use crate::jobs::Job;
use crate::mitigation::MitigationInfo;
use crate::models::{CircuitKey, ExperimentLabel, ResultForCircuit, SingleResult};
use crate::progress;
use log::{debug, warn};
use std::collections::HashMap;

/// Message logged once when some circuit results could not be obtained
pub const MISSING_DATA_WARNING: &str =
    "Some jobs have failed. Examine the output file to determine which data are missing.";

/// Regrouped results and the number of circuits whose result was lost
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub results: Vec<SingleResult>,
    pub failed: usize,
}

/// Read the result of the `index`-th circuit of `job`
///
/// Returns `None` when the result cannot be read: the circuit failed, the
/// job is gone, or the backend errored while fetching it. When calibration
/// data covering both qubits of `key` is given, the result also carries
/// mitigation info and a mitigated histogram.
pub fn extract_result_from_job(
    job: &dyn Job,
    key: &CircuitKey,
    index: usize,
    properties: Option<&BackendProperties>,
) -> Option<ResultForCircuit> {
    let histogram = match job.counts(index) {
        Ok(histogram) => histogram,
        Err(e) => {
            let kind = if e.is_item_failure() {
                "failed"
            } else {
                "unreadable"
            };
            debug!(
                "No result for circuit {} of job {} ({}), {}: {}",
                index,
                job.job_id(),
                key.name,
                kind,
                e
            );
            return None;
        }
    };

    let mitigation_info =
        properties.and_then(|props| MitigationInfo::from_properties(props, key.target, key.ancilla));
    let mitigated_histogram = mitigation_info.map(|info| info.mitigator().mitigate(&histogram));

    Some(ResultForCircuit {
        name: key.name.clone(),
        histogram,
        mitigation_info,
        mitigated_histogram,
    })
}

/// Resolve batch jobs and report how many circuit results were lost
///
/// Results appear in the order their `(target, ancilla, phi)` was first seen.
/// An experiment whose circuits all failed is kept with no results. With
/// `show_progress`, a bar advances per resolved batch.
pub fn resolve_batches_with_stats(batches: &[BatchJob], show_progress: bool) -> Resolution {
    let mut results: Vec<SingleResult> = Vec::new();
    let mut positions: HashMap<ExperimentLabel, usize> = HashMap::new();
    let mut failed = 0;
    let bar = progress::bar(batches.len(), "Resolving", show_progress);

    for batch in batches {
        let properties = batch.job.properties();
        for (index, key) in batch.keys.iter().enumerate() {
            let label = key.label();
            let position = *positions.entry(label).or_insert_with(|| {
                results.push(SingleResult {
                    target: label.target,
                    ancilla: label.ancilla,
                    phi: label.phi,
                    results_per_circuit: Vec::new(),
                });
                results.len() - 1
            });

            match extract_result_from_job(batch.job.as_ref(), key, index, properties.as_ref()) {
                Some(result) => results[position].results_per_circuit.push(result),
                None => failed += 1,
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    if failed > 0 {
        warn!("{}", MISSING_DATA_WARNING);
    }

    Resolution { results, failed }
}

/// Resolve batch jobs into per-experiment results
pub fn resolve_batches(batches: &[BatchJob], show_progress: bool) -> Vec<SingleResult> {
    resolve_batches_with_stats(batches, show_progress).results
}
