//! `qbench resolve`: turn job ids into histograms.

use super::{provider_for, read_outcome, write_output};
use qbench_core::{Engine, Result};
use std::path::Path;

pub fn run(async_results: &Path, output: Option<&Path>, show_progress: bool) -> Result<()> {
    let outcome = read_outcome(async_results)?;
    let provider = provider_for(&outcome.metadata().backend_description)?;

    let resolved = Engine::default()
        .with_progress(show_progress)
        .resolve_results(&outcome, provider.as_ref())?;
    write_output(output, &resolved.to_json()?)
}
