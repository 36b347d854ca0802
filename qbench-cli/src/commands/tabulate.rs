//! `qbench tabulate`: discrimination probabilities as CSV.

use super::{read_outcome, write_output};
use log::warn;
use qbench_core::{Engine, Result};
use std::path::Path;

pub fn run(sync_results: &Path, output: Option<&Path>) -> Result<()> {
    let outcome = read_outcome(sync_results)?;
    let table = Engine::default().tabulate_results(&outcome)?;

    let flagged = table.flagged().count();
    if flagged > 0 {
        warn!("{} rows have no probability (missing or unusable histograms)", flagged);
    }
    write_output(output, &table.to_csv())
}
