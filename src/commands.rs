//! One function per command-surface verb (spec.md §6), each a thin
//! orchestration over [`crate::state`], [`crate::objects`],
//! [`crate::staging`], [`crate::merge`], and [`crate::remote`]. `main.rs`
//! parses argv into a [`clap`] enum and calls straight through to these.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::commit::{self, Commit};
use crate::error::GitletError;
use crate::merge;
use crate::objects::Store;
use crate::remote;
use crate::safety;
use crate::staging;
use crate::state::Repo;

/// `init`: bootstraps `.gitlet/` with the initial commit on branch `master`.
#[tracing::instrument]
pub fn init(repo_dir: Option<String>) -> Result<()> {
    let root = match repo_dir {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir().context("get current working directory")?,
    };

    anyhow::ensure!(!root.join(".gitlet").exists(), GitletError::AlreadyInitialized);

    if !root.exists() {
        fs::create_dir_all(&root).with_context(|| format!("create {}", root.display()))?;
    }

    let gitlet = root.join(".gitlet");
    fs::create_dir(&gitlet).context("create .gitlet")?;
    fs::create_dir(gitlet.join("blobs")).context("create .gitlet/blobs")?;
    fs::create_dir(gitlet.join("commits")).context("create .gitlet/commits")?;
    fs::create_dir(gitlet.join("refs")).context("create .gitlet/refs")?;

    let store = Store::new(gitlet.clone());
    let initial = Commit::initial();
    initial.save(&store).context("save initial commit")?;

    fs::write(gitlet.join("refs/master"), &initial.hash).context("write refs/master")?;
    fs::write(gitlet.join("HEAD"), "master").context("write HEAD")?;

    println!("Initialized empty Gitlet repository.");
    Ok(())
}

/// `add`.
pub fn add(repo: &Repo, store: &Store, path: &Path) -> Result<()> {
    staging::add(repo, store, path)
}

/// `rm`.
pub fn rm(repo: &Repo, store: &Store, path: &Path) -> Result<()> {
    staging::rm(repo, store, path)
}

/// `commit` (§4.7).
#[tracing::instrument(skip(repo, store))]
pub fn commit(repo: &Repo, store: &Store, message: String) -> Result<()> {
    anyhow::ensure!(!message.is_empty(), GitletError::EmptyMessage);

    let staged = staging::staged_paths(repo)?;
    let removal = repo.removal()?;
    anyhow::ensure!(!staged.is_empty() || !removal.is_empty(), GitletError::NoChanges);

    let head_hash = repo.head()?;
    let head = Commit::load(store, &head_hash)?;

    merge::materialize_commit(repo, store, message, vec![head_hash], &head.tracked)?;
    Ok(())
}

/// `log`: first-parent walk from head.
pub fn log(repo: &Repo, store: &Store) -> Result<()> {
    let head = repo.head()?;
    for c in commit::first_parent_log(store, &head) {
        print!("{c}");
    }
    Ok(())
}

/// `global-log`: every commit in the store, unspecified order.
pub fn global_log(store: &Store) -> Result<()> {
    for c in commit::global_log(store)? {
        print!("{c}");
    }
    Ok(())
}

/// `find`: exact-message match across all commits.
pub fn find(store: &Store, message: &str) -> Result<()> {
    let hashes = commit::find(store, message)?;
    anyhow::ensure!(!hashes.is_empty(), "Found no commit with that message.");
    for hash in hashes {
        println!("{hash}");
    }
    Ok(())
}

/// `status`: five sections, sorted, per spec.md §6.
pub fn status(repo: &Repo, store: &Store) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "=== Branches ===")?;
    let current = repo.current_branch()?;
    for name in repo.branches()? {
        if name == current {
            writeln!(out, "*{name}")?;
        } else {
            writeln!(out, "{name}")?;
        }
    }
    writeln!(out)?;

    writeln!(out, "=== Staged Files ===")?;
    for path in staging::staged_paths(repo)? {
        writeln!(out, "{}", path.display())?;
    }
    writeln!(out)?;

    writeln!(out, "=== Removed Files ===")?;
    for path in repo.removal()? {
        writeln!(out, "{}", path.display())?;
    }
    writeln!(out)?;

    writeln!(out, "=== Modifications Not Staged For Commit ===")?;
    for (path, annotation) in modifications_not_staged(repo, store)? {
        writeln!(out, "{} ({annotation})", path.display())?;
    }
    writeln!(out)?;

    writeln!(out, "=== Untracked Files ===")?;
    for path in untracked_files(repo, store)? {
        writeln!(out, "{}", path.display())?;
    }
    writeln!(out)?;

    Ok(())
}

fn working_files(repo: &Repo) -> Result<BTreeSet<PathBuf>> {
    let mut files = BTreeSet::new();
    for entry in WalkDir::new(&repo.root)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".gitlet")
        .filter_map(Result::ok)
    {
        if entry.file_type().is_file() {
            let rel = entry
                .path()
                .strip_prefix(&repo.root)
                .expect("walkdir entries are rooted at repo.root")
                .to_path_buf();
            files.insert(rel);
        }
    }
    Ok(files)
}

fn modifications_not_staged(repo: &Repo, store: &Store) -> Result<Vec<(PathBuf, &'static str)>> {
    let head = Commit::load(store, &repo.head()?)?;
    let removal = repo.removal()?;
    let staged = staging::staged_paths(repo)?;
    let working = working_files(repo)?;

    let mut result: Vec<(PathBuf, &'static str)> = Vec::new();

    for (path, blob_hash) in &head.tracked {
        if staged.contains(path) || removal.contains(path) {
            continue;
        }
        if !working.contains(path) {
            result.push((path.clone(), "deleted"));
        } else {
            let bytes = fs::read(repo.root.join(path))
                .with_context(|| format!("read {}", path.display()))?;
            if &crate::hash::sha1_hex(&bytes) != blob_hash {
                result.push((path.clone(), "modified"));
            }
        }
    }

    for path in &staged {
        if !working.contains(path) {
            result.push((path.clone(), "deleted"));
        } else {
            let current = fs::read(repo.root.join(path))
                .with_context(|| format!("read {}", path.display()))?;
            let staged_bytes = staging::staged_bytes(repo, path)?;
            if current != staged_bytes {
                result.push((path.clone(), "modified"));
            }
        }
    }

    result.sort();
    result.dedup();
    Ok(result)
}

fn untracked_files(repo: &Repo, store: &Store) -> Result<BTreeSet<PathBuf>> {
    let head = Commit::load(store, &repo.head()?)?;
    let staged = staging::staged_paths(repo)?;
    Ok(working_files(repo)?
        .into_iter()
        .filter(|p| !head.tracks(p) && !staged.contains(p))
        .collect())
}

/// `checkout -- <file>`: restores `<file>` from head.
pub fn checkout_file_from_head(repo: &Repo, store: &Store, path: &Path) -> Result<()> {
    let head = Commit::load(store, &repo.head()?)?;
    checkout_file_from_commit_tracked(repo, store, &head, path)
}

/// `checkout <commit-prefix> -- <file>`.
pub fn checkout_file_from_commit(
    repo: &Repo,
    store: &Store,
    commit_prefix: &str,
    path: &Path,
) -> Result<()> {
    let hash = store
        .resolve_prefix(commit_prefix)?
        .ok_or(GitletError::NoSuchCommit)?;
    let commit = Commit::load(store, &hash)?;
    checkout_file_from_commit_tracked(repo, store, &commit, path)
}

fn checkout_file_from_commit_tracked(
    repo: &Repo,
    store: &Store,
    commit: &Commit,
    path: &Path,
) -> Result<()> {
    let blob_hash = commit.tracked.get(path).ok_or(GitletError::FileNotInCommit)?;
    store.restore_blob(blob_hash, &repo.root.join(path))
}

/// `checkout <branch>`: switches branches (§4.8 form 3).
pub fn checkout_branch(repo: &Repo, store: &Store, branch: &str) -> Result<()> {
    let current_branch = repo.current_branch()?;
    anyhow::ensure!(repo.branch_exists(branch), GitletError::NoSuchBranch);
    anyhow::ensure!(branch != current_branch, GitletError::SameBranch);

    let current = Commit::load(store, &repo.head()?)?;
    let target_hash = repo.branch_tip(branch)?;
    let target = Commit::load(store, &target_hash)?;

    safety::check(repo, &target.tracked, &current.tracked)?;

    merge::replace_working_tree(repo, store, &current.tracked, &target.tracked)?;
    repo.set_current_branch(branch)?;

    println!("Switched to branch '{branch}'.");
    Ok(())
}

/// `branch <name>`: creates a new branch at head.
pub fn branch(repo: &Repo, name: &str) -> Result<()> {
    let head = repo.head()?;
    repo.create_branch(name, &head)
}

/// `rm-branch <name>`: refuses the currently checked-out branch.
pub fn rm_branch(repo: &Repo, name: &str) -> Result<()> {
    let current = repo.current_branch()?;
    anyhow::ensure!(name != current, GitletError::CannotRemoveCurrent);
    repo.delete_branch(name)
}

/// `reset <commit-prefix>` (§4.9): branch-relative reset, staging cleared
/// but the removal set is left untouched, per spec.md §4.9's literal wording.
pub fn reset(repo: &Repo, store: &Store, commit_prefix: &str) -> Result<()> {
    let target_hash = store
        .resolve_prefix(commit_prefix)?
        .ok_or(GitletError::NoSuchCommit)?;
    let target = Commit::load(store, &target_hash)?;
    let head = Commit::load(store, &repo.head()?)?;

    safety::check(repo, &target.tracked, &head.tracked)?;

    for path in head.tracked.keys() {
        let working_path = repo.root.join(path);
        if working_path.exists() {
            fs::remove_file(&working_path)
                .with_context(|| format!("delete {}", path.display()))?;
        }
    }
    staging::clear_all_staged(repo)?;
    for (path, hash) in &target.tracked {
        store.restore_blob(hash, &repo.root.join(path))?;
    }

    repo.set_head(&target_hash)?;
    Ok(())
}

/// `merge <branch>` (§4.11).
pub fn merge_branch(repo: &Repo, store: &Store, branch: &str) -> Result<()> {
    merge::merge(repo, store, branch)
}

pub fn add_remote(repo: &Repo, name: &str, path: &str) -> Result<()> {
    remote::add_remote(repo, name, path)
}

pub fn rm_remote(repo: &Repo, name: &str) -> Result<()> {
    remote::rm_remote(repo, name)
}

pub fn push(repo: &Repo, store: &Store, remote_name: &str, branch: &str) -> Result<()> {
    remote::push(repo, store, remote_name, branch)
}

pub fn fetch(repo: &Repo, remote_name: &str, branch: &str) -> Result<()> {
    remote::fetch(repo, remote_name, branch)
}

pub fn pull(repo: &Repo, store: &Store, remote_name: &str, branch: &str) -> Result<()> {
    remote::pull(repo, store, remote_name, branch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    fn setup(tmp: &assert_fs::TempDir) -> Result<()> {
        test_utils::set_dir(tmp.path(), || init(None))
    }

    #[test]
    fn init_creates_layout_and_initial_commit() -> Result<()> {
        let tmp = assert_fs::TempDir::new()?;
        setup(&tmp)?;

        assert!(tmp.path().join(".gitlet/blobs").is_dir());
        assert!(tmp.path().join(".gitlet/commits").is_dir());
        assert!(tmp.path().join(".gitlet/refs/master").is_file());
        assert_eq!(fs::read_to_string(tmp.path().join(".gitlet/HEAD"))?, "master");
        Ok(())
    }

    #[test]
    fn init_twice_fails() -> Result<()> {
        let tmp = assert_fs::TempDir::new()?;
        setup(&tmp)?;
        let result = test_utils::set_dir(tmp.path(), || init(None));
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn add_commit_log_round_trip() -> Result<()> {
        let tmp = assert_fs::TempDir::new()?;
        setup(&tmp)?;
        let repo = Repo::at(tmp.path().to_path_buf());
        let store = Store::new(repo.gitlet_dir());

        fs::write(tmp.path().join("a.txt"), "A")?;
        add(&repo, &store, Path::new("a.txt"))?;
        commit(&repo, &store, "m1".to_string())?;

        let log: Vec<_> = commit::first_parent_log(&store, &repo.head()?).collect();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].message, "m1");
        assert_eq!(log[1].message, "initial commit");
        Ok(())
    }

    #[test]
    fn commit_with_no_changes_fails() -> Result<()> {
        let tmp = assert_fs::TempDir::new()?;
        setup(&tmp)?;
        let repo = Repo::at(tmp.path().to_path_buf());
        let store = Store::new(repo.gitlet_dir());

        assert!(commit(&repo, &store, "nothing".to_string()).is_err());
        Ok(())
    }

    #[test]
    fn checkout_branch_restores_target_tree() -> Result<()> {
        let tmp = assert_fs::TempDir::new()?;
        setup(&tmp)?;
        let repo = Repo::at(tmp.path().to_path_buf());
        let store = Store::new(repo.gitlet_dir());

        fs::write(tmp.path().join("a.txt"), "A")?;
        add(&repo, &store, Path::new("a.txt"))?;
        commit(&repo, &store, "m1".to_string())?;

        branch(&repo, "other")?;
        checkout_branch(&repo, &store, "other")?;
        assert_eq!(repo.current_branch()?, "other");
        assert!(tmp.path().join("a.txt").exists());
        Ok(())
    }

    #[test]
    fn checkout_same_branch_fails() -> Result<()> {
        let tmp = assert_fs::TempDir::new()?;
        setup(&tmp)?;
        let repo = Repo::at(tmp.path().to_path_buf());
        let store = Store::new(repo.gitlet_dir());
        assert!(checkout_branch(&repo, &store, "master").is_err());
        Ok(())
    }

    #[test]
    fn reset_moves_head_and_branch_tip() -> Result<()> {
        let tmp = assert_fs::TempDir::new()?;
        setup(&tmp)?;
        let repo = Repo::at(tmp.path().to_path_buf());
        let store = Store::new(repo.gitlet_dir());
        let initial_hash = repo.head()?;

        fs::write(tmp.path().join("a.txt"), "A")?;
        add(&repo, &store, Path::new("a.txt"))?;
        commit(&repo, &store, "m1".to_string())?;

        reset(&repo, &store, &initial_hash)?;

        assert_eq!(repo.head()?, initial_hash);
        assert_eq!(repo.branch_tip("master")?, initial_hash);
        assert!(!tmp.path().join("a.txt").exists());
        Ok(())
    }

    #[test]
    fn find_matches_exact_message() -> Result<()> {
        let tmp = assert_fs::TempDir::new()?;
        setup(&tmp)?;
        let repo = Repo::at(tmp.path().to_path_buf());
        let store = Store::new(repo.gitlet_dir());

        fs::write(tmp.path().join("a.txt"), "A")?;
        add(&repo, &store, Path::new("a.txt"))?;
        commit(&repo, &store, "findable".to_string())?;

        assert!(find(&store, "findable").is_ok());
        assert!(find(&store, "missing").is_err());
        Ok(())
    }
}
