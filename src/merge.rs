//! The merge engine: split-point discovery, per-path action
//! classification, action application, and merge-commit finalization.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::commit::{self, Commit};
use crate::error::GitletError;
use crate::objects::Store;
use crate::safety;
use crate::staging;
use crate::state::Repo;

/// §4.11's per-path classification outcome. `Blank` is an internal
/// initializer sentinel from the source material and is intentionally not
/// exposed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Remain,
    Checkout,
    Remove,
    Conflict,
}

/// §4.11's decision table, one row per reachable combination of
/// (split, current, given) presence and (in)equality.
#[tracing::instrument(level = "debug")]
pub fn classify(s: Option<&str>, c: Option<&str>, g: Option<&str>) -> Action {
    use Action::*;
    let action = match (s, c, g) {
        (Some(sv), Some(cv), Some(gv)) => {
            let c_eq_s = cv == sv;
            let g_eq_s = gv == sv;
            match (c_eq_s, g_eq_s) {
                (true, true) => Remain,
                (true, false) => Checkout,
                (false, true) => Remain,
                (false, false) => {
                    if cv == gv {
                        Remain
                    } else {
                        Conflict
                    }
                }
            }
        }
        (Some(_), None, None) => Remain,
        (None, Some(_), None) => Remain,
        (None, None, Some(_)) => Checkout,
        (Some(sv), Some(cv), None) => {
            if cv == sv {
                Remove
            } else {
                Conflict
            }
        }
        (Some(sv), None, Some(gv)) => {
            if gv == sv {
                Remain
            } else {
                Conflict
            }
        }
        (None, Some(cv), Some(gv)) => {
            if cv == gv {
                Remain
            } else {
                Conflict
            }
        }
        (None, None, None) => Remain,
    };
    tracing::debug!(?action, "classified merge path");
    action
}

fn all_ancestors(store: &Store, start: &str) -> Result<HashSet<String>> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(start.to_string());
    queue.push_back(start.to_string());

    while let Some(hash) = queue.pop_front() {
        let commit = Commit::load(store, &hash)?;
        for parent in &commit.parents {
            if visited.insert(parent.clone()) {
                queue.push_back(parent.clone());
            }
        }
    }
    Ok(visited)
}

/// §4.4: BFS from `given` collects every reachable commit; BFS from
/// `current` returns the first visited hash that is also reachable from
/// `given`. Both traversals deduplicate via a visited set.
pub fn split_point(store: &Store, current: &str, given: &str) -> Result<String> {
    let given_ancestors = all_ancestors(store, given)?;

    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(current.to_string());
    queue.push_back(current.to_string());

    while let Some(hash) = queue.pop_front() {
        if given_ancestors.contains(&hash) {
            return Ok(hash);
        }
        let commit = Commit::load(store, &hash)?;
        for parent in &commit.parents {
            if visited.insert(parent.clone()) {
                queue.push_back(parent.clone());
            }
        }
    }

    anyhow::bail!("no common ancestor between {current} and {given}")
}

fn conflict_contents(current: Option<&[u8]>, given: Option<&[u8]>) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"<<<<<<< HEAD\n");
    out.extend_from_slice(current.unwrap_or(&[]));
    out.extend_from_slice(b"=======\n");
    out.extend_from_slice(given.unwrap_or(&[]));
    out.extend_from_slice(b">>>>>>>");
    out
}

/// Clears staging and removal, then restores `target`'s tracked files into
/// the working tree relative to `current`'s tracked files. Used both by
/// `checkout <branch>` and by a merge's fast-forward path.
pub(crate) fn replace_working_tree(
    repo: &Repo,
    store: &Store,
    current: &BTreeMap<PathBuf, String>,
    target: &BTreeMap<PathBuf, String>,
) -> Result<()> {
    for path in current.keys() {
        let working_path = repo.root.join(path);
        if working_path.exists() {
            std::fs::remove_file(&working_path)
                .with_context(|| format!("delete {}", path.display()))?;
        }
    }
    for (path, hash) in target {
        store.restore_blob(hash, &repo.root.join(path))?;
    }
    staging::clear_all_staged(repo)?;
    repo.set_removal(&BTreeSet::new())?;
    Ok(())
}

/// Builds the tracked map and advances `head` for a new commit from the
/// current head plus whatever is staged/marked for removal. Used by both
/// `commit` and merge finalization; shared so both paths build hashes the
/// same way.
pub fn materialize_commit(
    repo: &Repo,
    store: &Store,
    message: String,
    parents: Vec<String>,
    base_tracked: &BTreeMap<PathBuf, String>,
) -> Result<Commit> {
    let mut tracked = base_tracked.clone();

    for path in repo.removal()? {
        tracked.remove(&path);
    }

    for path in staging::staged_paths(repo)? {
        let bytes = staging::staged_bytes(repo, &path)?;
        let hash = store.put_blob(&bytes)?;
        tracked.insert(path.clone(), hash);
    }

    let commit = Commit::new(message, commit::now_millis(), parents, tracked)?;
    commit.save(store)?;

    staging::clear_all_staged(repo)?;
    repo.set_head(&commit.hash)?;
    repo.set_removal(&BTreeSet::new())?;

    Ok(commit)
}

/// §4.11: merges `given_branch` into the current branch.
#[tracing::instrument(skip(repo, store))]
pub fn merge(repo: &Repo, store: &Store, given_branch: &str) -> Result<()> {
    let current_branch = repo.current_branch()?;
    tracing::debug!(%current_branch, %given_branch, "starting merge");
    anyhow::ensure!(repo.branch_exists(given_branch), GitletError::NoSuchBranch);
    anyhow::ensure!(given_branch != current_branch, GitletError::SelfMerge);

    let staged = staging::staged_paths(repo)?;
    let removal = repo.removal()?;
    anyhow::ensure!(
        staged.is_empty() && removal.is_empty(),
        GitletError::UncommittedChanges
    );

    let current_head = repo.head()?;
    let given_head = repo.branch_tip(given_branch)?;

    let current_commit = Commit::load(store, &current_head)?;
    let given_commit = Commit::load(store, &given_head)?;

    safety::check(repo, &given_commit.tracked, &current_commit.tracked)?;

    let split = split_point(store, &current_head, &given_head)?;

    if split == given_head {
        return Err(GitletError::AncestorMerge.into());
    }

    if split == current_head {
        replace_working_tree(repo, store, &current_commit.tracked, &given_commit.tracked)?;
        repo.set_branch_tip(&current_branch, &given_head)?;
        println!("Current branch fast-forwarded.");
        return Ok(());
    }

    let split_commit = Commit::load(store, &split)?;

    let mut paths: BTreeSet<PathBuf> = BTreeSet::new();
    paths.extend(split_commit.tracked.keys().cloned());
    paths.extend(current_commit.tracked.keys().cloned());
    paths.extend(given_commit.tracked.keys().cloned());

    let mut conflicted = false;

    for path in &paths {
        let s = split_commit.tracked.get(path).map(String::as_str);
        let c = current_commit.tracked.get(path).map(String::as_str);
        let g = given_commit.tracked.get(path).map(String::as_str);

        match classify(s, c, g) {
            Action::Remain => {}
            Action::Checkout => {
                let hash = g.expect("checkout action implies the given side is present");
                let bytes = store.get_blob(hash)?;
                std::fs::write(repo.root.join(path), &bytes)
                    .with_context(|| format!("restore {}", path.display()))?;
                stage_merged_bytes(repo, path, &bytes)?;
            }
            Action::Remove => {
                let mut removal = repo.removal()?;
                removal.insert(path.clone());
                repo.set_removal(&removal)?;
                let working_path = repo.root.join(path);
                if working_path.exists() {
                    std::fs::remove_file(&working_path)
                        .with_context(|| format!("delete {}", path.display()))?;
                }
            }
            Action::Conflict => {
                let current_bytes = c.map(|h| store.get_blob(h)).transpose()?;
                let given_bytes = g.map(|h| store.get_blob(h)).transpose()?;
                let contents = conflict_contents(
                    current_bytes.as_deref(),
                    given_bytes.as_deref(),
                );
                std::fs::write(repo.root.join(path), &contents)
                    .with_context(|| format!("write conflict markers to {}", path.display()))?;
                stage_merged_bytes(repo, path, &contents)?;

                if !conflicted {
                    println!("Encountered a merge conflict.");
                    conflicted = true;
                }
            }
        }
    }

    let staged_now = staging::staged_paths(repo)?;
    let removal_now = repo.removal()?;
    if staged_now.is_empty() && removal_now.is_empty() && !conflicted {
        println!("No changes added to the commit.");
    }

    materialize_commit(
        repo,
        store,
        format!("Merged {given_branch} into {current_branch}."),
        vec![current_head, given_head],
        &current_commit.tracked,
    )?;

    Ok(())
}

fn stage_merged_bytes(repo: &Repo, path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::create_dir_all(repo.staging_dir()).context("create staging directory")?;
    std::fs::write(repo.staging_dir().join(path), bytes)
        .with_context(|| format!("stage {}", path.display()))
}
