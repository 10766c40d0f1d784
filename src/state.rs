//! Repository-state persistence.
//!
//! Branches, the current branch, the removal set, and the remote registry
//! each live in their own file under `.gitlet/`, rather than one aggregate
//! record — branch tips as `refs/<name>`, the current branch name as
//! `HEAD`, and so on. Together they are the Repository State of the data
//! model: `currentBranch` is the content of `HEAD`; `head` is always
//! resolved as `branch_tip(current_branch)`.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::error::GitletError;

pub struct Repo {
    pub root: PathBuf,
}

impl Repo {
    pub fn at(root: PathBuf) -> Self {
        Repo { root }
    }

    /// Walks upward from the current directory looking for `.gitlet`.
    pub fn discover() -> Result<Self> {
        let mut dir = std::env::current_dir().context("get current working directory")?;
        loop {
            if dir.join(".gitlet").is_dir() {
                return Ok(Repo { root: dir });
            }
            if !dir.pop() {
                return Err(GitletError::NotInitialized.into());
            }
        }
    }

    pub fn gitlet_dir(&self) -> PathBuf {
        self.root.join(".gitlet")
    }

    pub fn blobs_dir(&self) -> PathBuf {
        self.gitlet_dir().join("blobs")
    }

    pub fn commits_dir(&self) -> PathBuf {
        self.gitlet_dir().join("commits")
    }

    pub fn refs_dir(&self) -> PathBuf {
        self.gitlet_dir().join("refs")
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.gitlet_dir().join("staging")
    }

    fn head_file(&self) -> PathBuf {
        self.gitlet_dir().join("HEAD")
    }

    fn removal_file(&self) -> PathBuf {
        self.gitlet_dir().join("removal")
    }

    fn remotes_file(&self) -> PathBuf {
        self.gitlet_dir().join("remotes")
    }

    pub fn current_branch(&self) -> Result<String> {
        fs::read_to_string(self.head_file()).context("read HEAD")
    }

    pub fn set_current_branch(&self, name: &str) -> Result<()> {
        fs::write(self.head_file(), name).context("write HEAD")
    }

    pub fn branch_exists(&self, name: &str) -> bool {
        self.refs_dir().join(name).is_file()
    }

    pub fn branch_tip(&self, name: &str) -> Result<String> {
        fs::read_to_string(self.refs_dir().join(name))
            .map_err(|_| GitletError::NoSuchBranch.into())
    }

    pub fn set_branch_tip(&self, name: &str, hash: &str) -> Result<()> {
        fs::write(self.refs_dir().join(name), hash).with_context(|| format!("update branch {name}"))
    }

    /// Creates a branch ref. `name` may contain `/` (remote-tracking
    /// branches are named `<remote>/<branch>`), so the parent directory is
    /// created on demand.
    pub fn create_branch(&self, name: &str, hash: &str) -> Result<()> {
        anyhow::ensure!(!self.branch_exists(name), GitletError::BranchExists);
        let path = self.refs_dir().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, hash).with_context(|| format!("create branch {name}"))
    }

    pub fn delete_branch(&self, name: &str) -> Result<()> {
        anyhow::ensure!(self.branch_exists(name), GitletError::NoSuchBranch);
        fs::remove_file(self.refs_dir().join(name))
            .with_context(|| format!("delete branch {name}"))
    }

    /// All branch names, sorted.
    pub fn branches(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = fs::read_dir(self.refs_dir())
            .context("read refs directory")?
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        names.sort();
        Ok(names)
    }

    #[tracing::instrument(skip(self))]
    pub fn head(&self) -> Result<String> {
        let head = self.branch_tip(&self.current_branch()?)?;
        tracing::debug!(%head, "loaded repository-state head");
        Ok(head)
    }

    #[tracing::instrument(skip(self))]
    pub fn set_head(&self, hash: &str) -> Result<()> {
        let branch = self.current_branch()?;
        tracing::debug!(%branch, head = %hash, "saving repository-state head");
        self.set_branch_tip(&branch, hash)
    }

    #[tracing::instrument(skip(self))]
    pub fn removal(&self) -> Result<BTreeSet<PathBuf>> {
        if !self.removal_file().is_file() {
            tracing::debug!("no removal set on disk, loading as empty");
            return Ok(BTreeSet::new());
        }
        let contents = fs::read_to_string(self.removal_file()).context("read removal set")?;
        let removal: BTreeSet<PathBuf> =
            serde_json::from_str(&contents).context("deserialize removal set")?;
        tracing::debug!(count = removal.len(), "loaded removal set");
        Ok(removal)
    }

    #[tracing::instrument(skip(self, removal))]
    pub fn set_removal(&self, removal: &BTreeSet<PathBuf>) -> Result<()> {
        tracing::debug!(count = removal.len(), "saving removal set");
        let json = serde_json::to_string(removal).context("serialize removal set")?;
        fs::write(self.removal_file(), json).context("write removal set")
    }

    #[tracing::instrument(skip(self))]
    pub fn remotes(&self) -> Result<BTreeMap<String, PathBuf>> {
        if !self.remotes_file().is_file() {
            tracing::debug!("no remotes registry on disk, loading as empty");
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(self.remotes_file()).context("read remotes")?;
        let remotes: BTreeMap<String, PathBuf> =
            serde_json::from_str(&contents).context("deserialize remotes")?;
        tracing::debug!(count = remotes.len(), "loaded remotes registry");
        Ok(remotes)
    }

    #[tracing::instrument(skip(self, remotes))]
    pub fn set_remotes(&self, remotes: &BTreeMap<String, PathBuf>) -> Result<()> {
        tracing::debug!(count = remotes.len(), "saving remotes registry");
        let json = serde_json::to_string(remotes).context("serialize remotes")?;
        fs::write(self.remotes_file(), json).context("write remotes")
    }
}
