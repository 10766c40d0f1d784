//! The staging area.
//!
//! `.gitlet/staging/<path>` holds the exact bytes that will be written for
//! `<path>` in the next commit. Presence of a file there means "add or
//! modify on next commit"; the separate removal set (in
//! [`crate::state::Repo`]) tracks pending deletions.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::commit::Commit;
use crate::error::GitletError;
use crate::hash::sha1_hex;
use crate::objects::Store;
use crate::state::Repo;

pub fn staged_paths(repo: &Repo) -> Result<BTreeSet<PathBuf>> {
    let dir = repo.staging_dir();
    if !dir.is_dir() {
        return Ok(BTreeSet::new());
    }
    let mut paths = BTreeSet::new();
    for entry in fs::read_dir(&dir).context("read staging directory")? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            paths.insert(PathBuf::from(entry.file_name()));
        }
    }
    Ok(paths)
}

pub fn is_staged(repo: &Repo, path: &Path) -> bool {
    repo.staging_dir().join(path).is_file()
}

pub fn staged_bytes(repo: &Repo, path: &Path) -> Result<Vec<u8>> {
    fs::read(repo.staging_dir().join(path))
        .with_context(|| format!("read staged copy of {}", path.display()))
}

pub fn clear_staged(repo: &Repo, path: &Path) -> Result<()> {
    let staged_path = repo.staging_dir().join(path);
    if staged_path.exists() {
        fs::remove_file(&staged_path)
            .with_context(|| format!("remove staged copy of {}", path.display()))?;
    }
    Ok(())
}

pub fn clear_all_staged(repo: &Repo) -> Result<()> {
    for path in staged_paths(repo)? {
        clear_staged(repo, &path)?;
    }
    Ok(())
}

fn stage_bytes(repo: &Repo, path: &Path, bytes: &[u8]) -> Result<()> {
    fs::create_dir_all(repo.staging_dir()).context("create staging directory")?;
    fs::write(repo.staging_dir().join(path), bytes)
        .with_context(|| format!("stage {}", path.display()))
}

/// §4.5 `add`: reads the working-tree file, and either clears any existing
/// staged copy (when the file already matches head) or overwrites the
/// staged copy with the current bytes. Either way, unstages the path from
/// removal.
pub fn add(repo: &Repo, store: &Store, path: &Path) -> Result<()> {
    let working_path = repo.root.join(path);
    anyhow::ensure!(working_path.is_file(), GitletError::FileDoesNotExist);

    let bytes = fs::read(&working_path).with_context(|| format!("read {}", path.display()))?;
    let hash = sha1_hex(&bytes);

    let head = Commit::load(store, &repo.head()?)?;
    if head.tracked.get(path).is_some_and(|h| h == &hash) {
        clear_staged(repo, path)?;
    } else {
        stage_bytes(repo, path, &bytes)?;
    }

    let mut removal = repo.removal()?;
    removal.remove(path);
    repo.set_removal(&removal)?;

    Ok(())
}

/// §4.6 `rm`: fails if the path is neither staged nor tracked by head;
/// otherwise drops any staged copy and, if head tracks the path, adds it to
/// the removal set and deletes the working-tree file.
pub fn rm(repo: &Repo, store: &Store, path: &Path) -> Result<()> {
    let head = Commit::load(store, &repo.head()?)?;

    let staged = is_staged(repo, path);
    let tracked = head.tracks(path);

    anyhow::ensure!(staged || tracked, GitletError::NothingToRemove);

    if staged {
        clear_staged(repo, path)?;
    }

    if tracked {
        let mut removal = repo.removal()?;
        removal.insert(path.to_path_buf());
        repo.set_removal(&removal)?;

        let working_path = repo.root.join(path);
        if working_path.exists() {
            fs::remove_file(&working_path)
                .with_context(|| format!("delete {}", path.display()))?;
        }
    }

    Ok(())
}
