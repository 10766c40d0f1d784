//! Content-addressed object store.
//!
//! Blobs and serialized commits are persisted at `.gitlet/blobs/<hash>` and
//! `.gitlet/commits/<hash>`. Writes are idempotent: identical bytes hash to
//! the same key, so a repeat write is a no-op.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::error::GitletError;
use crate::hash::sha1_hex;

pub struct Store {
    gitlet_dir: PathBuf,
}

impl Store {
    pub fn new(gitlet_dir: PathBuf) -> Self {
        Store { gitlet_dir }
    }

    fn blobs_dir(&self) -> PathBuf {
        self.gitlet_dir.join("blobs")
    }

    fn commits_dir(&self) -> PathBuf {
        self.gitlet_dir.join("commits")
    }

    /// Writes `bytes` under its content hash, returning the hash. A no-op
    /// if an object with that hash already exists.
    pub fn put_blob(&self, bytes: &[u8]) -> Result<String> {
        let hash = sha1_hex(bytes);
        let path = self.blobs_dir().join(&hash);
        if !path.exists() {
            fs::write(&path, bytes).with_context(|| format!("write blob {hash}"))?;
        }
        Ok(hash)
    }

    pub fn get_blob(&self, hash: &str) -> Result<Vec<u8>> {
        fs::read(self.blobs_dir().join(hash))
            .with_context(|| format!("missing blob object {hash}"))
    }

    /// Restores a blob's content directly to `dest` in the working tree.
    pub fn restore_blob(&self, hash: &str, dest: &std::path::Path) -> Result<()> {
        let bytes = self.get_blob(hash)?;
        fs::write(dest, bytes).with_context(|| format!("restore {}", dest.display()))
    }

    pub(crate) fn put_commit_bytes(&self, hash: &str, bytes: &[u8]) -> Result<()> {
        let path = self.commits_dir().join(hash);
        if !path.exists() {
            fs::write(&path, bytes).with_context(|| format!("write commit {hash}"))?;
        }
        Ok(())
    }

    pub(crate) fn get_commit_bytes(&self, hash: &str) -> Result<Vec<u8>> {
        fs::read(self.commits_dir().join(hash)).map_err(|_| GitletError::NoSuchCommit.into())
    }

    /// Resolves an unambiguous prefix to a full commit hash. Among multiple
    /// matches, the lexicographically first directory entry wins (callers
    /// are expected to pass prefixes long enough to be unique).
    pub fn resolve_prefix(&self, prefix: &str) -> Result<Option<String>> {
        let mut names = self.all_commit_hashes()?;
        names.sort();
        Ok(names.into_iter().find(|n| n.starts_with(prefix)))
    }

    pub fn all_commit_hashes(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = fs::read_dir(self.commits_dir())
            .context("read commits directory")?
            .filter_map(Result::ok)
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        names.sort();
        Ok(names)
    }
}
