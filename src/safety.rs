//! Working-tree safety: the predicate that refuses a destructive operation
//! (checkout of a branch, or reset) when it would silently overwrite a file
//! present in the working tree but not tracked by the current head.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;

use crate::error::GitletError;
use crate::state::Repo;

/// Fails with [`GitletError::UntrackedOverwrite`] if any path tracked by
/// `target_tracked` exists on disk but is not tracked by `head_tracked`.
/// Must run before any filesystem mutation for the operation it guards.
pub fn check(
    repo: &Repo,
    target_tracked: &BTreeMap<PathBuf, String>,
    head_tracked: &BTreeMap<PathBuf, String>,
) -> Result<()> {
    for path in target_tracked.keys() {
        let on_disk = repo.root.join(path).is_file();
        if on_disk && !head_tracked.contains_key(path) {
            return Err(GitletError::UntrackedOverwrite.into());
        }
    }
    Ok(())
}
