//! `qbench status`: count job statuses of an asynchronous run.

use super::{provider_for, read_outcome, write_output};
use qbench_core::{Engine, Result};
use std::path::Path;

pub fn run(async_results: &Path) -> Result<()> {
    let outcome = read_outcome(async_results)?;
    let provider = provider_for(&outcome.metadata().backend_description)?;

    let counts = Engine::default().fetch_statuses(&outcome, provider.as_ref())?;
    write_output(None, &serde_json::to_string_pretty(&counts)?)
}
