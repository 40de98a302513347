//! `warngate reset` command

use anyhow::{bail, Result};
use console::style;
use tracing::info;

use crate::history::{HistoryStore, RunId};

/// Mark a run as acceptable reference for `analysis_id` regardless of its quality gate.
pub(super) fn run(store: &HistoryStore, job: &str, build: u64, analysis_id: &str) -> Result<()> {
    let mut history = store.load()?;
    let run = RunId::new(job, build);
    if !history.reset_reference(&run, analysis_id) {
        bail!("Run {} is not recorded in {}", run, store.path().display());
    }
    store.save(&history)?;
    info!("Reset reference for {} (analysis id '{}')", run, analysis_id);
    println!(
        "{} {} will be accepted as reference for '{}'",
        style("✓").green(),
        run,
        analysis_id
    );
    Ok(())
}
