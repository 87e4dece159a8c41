use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

use crate::error::BuildError;
use crate::state::{CounterStore, LAST_INDEX_KEY};

/// Allocate the next free `Build<N>.<extension>` path inside `directory`.
///
/// The scan starts one past the persisted counter rather than at 1, so build
/// numbers keep increasing across clean operations; if the directory is ever
/// cleared without resetting the counter, numbering skips ahead. That is
/// accepted behavior, not a bug. Correctness only requires that the returned
/// path does not exist at call time.
///
/// The counter is persisted only after a free slot is found, so a failed
/// allocation leaves it untouched.
///
/// Not safe against two processes racing on the same directory and counter
/// store — the existence check and the persist are not atomic with respect
/// to external writers. Callers needing that must serialize allocations
/// externally.
///
/// # Errors
/// [`BuildError::DirectoryUnwritable`] when `directory` cannot be created.
pub fn allocate_artifact_path(
    directory: &Utf8Path,
    counter: &mut dyn CounterStore,
    extension: &str,
) -> Result<Utf8PathBuf> {
    fs::create_dir_all(directory).map_err(|source| BuildError::DirectoryUnwritable {
        path: directory.to_path_buf(),
        source,
    })?;

    let mut index = counter.get(LAST_INDEX_KEY)?;
    let candidate = loop {
        index += 1;
        let candidate = directory.join(format!("Build{index}.{extension}"));
        if !candidate.exists() {
            break candidate;
        }
    };

    counter.set(LAST_INDEX_KEY, index)?;
    tracing::debug!("Allocated artifact path {candidate} (index {index})");

    Ok(candidate)
}
