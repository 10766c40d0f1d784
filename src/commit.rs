//! Commit records and the commit DAG.
//!
//! A commit is immutable once stored: its hash is the SHA-1 of its
//! canonical payload (message, timestamp, parents, tracked map), and that
//! payload never changes after creation. `tracked` is a `BTreeMap` rather
//! than a `HashMap` specifically so that `serde_json` serializes it sorted
//! by path, which is what makes the commit hash reproducible.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::hash::sha1_hex;
use crate::objects::Store;

/// The byte-stable subset of a commit's fields. Serializing this (rather
/// than `Commit` itself) keeps the hash independent of the `hash` field and
/// of any future bookkeeping fields added to `Commit`.
#[derive(Serialize)]
struct CommitPayload<'a> {
    message: &'a str,
    timestamp_ms: u64,
    parents: &'a [String],
    tracked: &'a BTreeMap<PathBuf, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub hash: String,
    pub message: String,
    pub timestamp_ms: u64,
    pub parents: Vec<String>,
    pub tracked: BTreeMap<PathBuf, String>,
}

impl Commit {
    /// The repository's very first commit: no parents, no tracked files,
    /// timestamp pinned to the Unix epoch.
    pub fn initial() -> Self {
        Self::build("initial commit".to_string(), 0, Vec::new(), BTreeMap::new())
    }

    pub fn new(
        message: String,
        timestamp_ms: u64,
        parents: Vec<String>,
        tracked: BTreeMap<PathBuf, String>,
    ) -> Result<Self> {
        anyhow::ensure!(!message.is_empty(), crate::error::GitletError::EmptyMessage);
        anyhow::ensure!(parents.len() <= 2, "a commit may have at most two parents");
        Ok(Self::build(message, timestamp_ms, parents, tracked))
    }

    fn build(
        message: String,
        timestamp_ms: u64,
        parents: Vec<String>,
        tracked: BTreeMap<PathBuf, String>,
    ) -> Self {
        let hash = Self::compute_hash(&message, timestamp_ms, &parents, &tracked);
        Commit {
            hash,
            message,
            timestamp_ms,
            parents,
            tracked,
        }
    }

    fn compute_hash(
        message: &str,
        timestamp_ms: u64,
        parents: &[String],
        tracked: &BTreeMap<PathBuf, String>,
    ) -> String {
        let payload = CommitPayload {
            message,
            timestamp_ms,
            parents,
            tracked,
        };
        let bytes = serde_json::to_vec(&payload).expect("commit payload always serializes");
        sha1_hex(&bytes)
    }

    pub fn save(&self, store: &Store) -> Result<()> {
        let bytes = serde_json::to_vec(self).context("serialize commit")?;
        store.put_commit_bytes(&self.hash, &bytes)
    }

    pub fn load(store: &Store, hash: &str) -> Result<Self> {
        let bytes = store.get_commit_bytes(hash)?;
        serde_json::from_slice(&bytes).context("deserialize commit")
    }

    pub fn tracks(&self, path: &Path) -> bool {
        self.tracked.contains_key(path)
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() == 2
    }

    /// Renders the commit's timestamp the way `log` does:
    /// `Thu Jan 01 00:00:00 1970 +0000`.
    pub fn log_date(&self) -> String {
        let secs = (self.timestamp_ms / 1000) as i64;
        let dt = Utc
            .timestamp_opt(secs, 0)
            .single()
            .unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap());
        dt.format("%a %b %d %H:%M:%S %Y %z").to_string()
    }
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is after the Unix epoch")
        .as_millis() as u64
}

/// Formats a single `log`/`global-log` entry:
/// ```text
/// ===
/// commit <hash>
/// Merge: <p0[0:7]> <p1[0:7]>      (only on merge commits)
/// Date: <date>
/// <message>
/// <blank line>
/// ```
impl std::fmt::Display for Commit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "===")?;
        writeln!(f, "commit {}", self.hash)?;
        if self.is_merge() {
            writeln!(
                f,
                "Merge: {} {}",
                &self.parents[0][..7.min(self.parents[0].len())],
                &self.parents[1][..7.min(self.parents[1].len())]
            )?;
        }
        writeln!(f, "Date: {}", self.log_date())?;
        writeln!(f, "{}", self.message)?;
        writeln!(f)
    }
}

/// Walks the first-parent chain starting at `head`, i.e. the history the
/// `log` command prints.
pub struct FirstParentLog<'a> {
    store: &'a Store,
    current: Option<String>,
}

impl<'a> Iterator for FirstParentLog<'a> {
    type Item = Commit;

    fn next(&mut self) -> Option<Commit> {
        let hash = self.current.take()?;
        let commit = Commit::load(self.store, &hash).ok()?;
        self.current = commit.parents.first().cloned();
        Some(commit)
    }
}

pub fn first_parent_log<'a>(store: &'a Store, head: &str) -> FirstParentLog<'a> {
    FirstParentLog {
        store,
        current: Some(head.to_string()),
    }
}

/// All commits in the store, in unspecified order (`global-log`).
pub fn global_log(store: &Store) -> Result<Vec<Commit>> {
    store
        .all_commit_hashes()?
        .into_iter()
        .map(|h| Commit::load(store, &h))
        .collect()
}

/// Hashes of every commit whose message equals `message` exactly.
pub fn find(store: &Store, message: &str) -> Result<Vec<String>> {
    let mut found = Vec::new();
    for hash in store.all_commit_hashes()? {
        let commit = Commit::load(store, &hash)?;
        if commit.message == message {
            found.push(hash);
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(tmp: &assert_fs::TempDir) -> Store {
        let gitlet = tmp.path().join(".gitlet");
        std::fs::create_dir_all(gitlet.join("blobs")).unwrap();
        std::fs::create_dir_all(gitlet.join("commits")).unwrap();
        Store::new(gitlet)
    }

    #[test]
    fn hash_is_stable_under_round_trip() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let store = store_in(&tmp);
        let mut tracked = BTreeMap::new();
        tracked.insert(PathBuf::from("a.txt"), "ab".repeat(20));
        let commit = Commit::new("m".to_string(), 42, Vec::new(), tracked).unwrap();
        commit.save(&store).unwrap();

        let reloaded = Commit::load(&store, &commit.hash).unwrap();
        let rehash = Commit::compute_hash(
            &reloaded.message,
            reloaded.timestamp_ms,
            &reloaded.parents,
            &reloaded.tracked,
        );
        assert_eq!(rehash, commit.hash);
    }

    #[test]
    fn initial_commit_is_epoch_and_empty() {
        let commit = Commit::initial();
        assert_eq!(commit.message, "initial commit");
        assert_eq!(commit.timestamp_ms, 0);
        assert!(commit.parents.is_empty());
        assert!(commit.tracked.is_empty());
    }

    #[test]
    fn empty_message_is_rejected() {
        let result = Commit::new(String::new(), 0, Vec::new(), BTreeMap::new());
        assert!(result.is_err());
    }

    #[test]
    fn first_parent_log_stops_at_initial_commit() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let store = store_in(&tmp);

        let initial = Commit::initial();
        initial.save(&store).unwrap();

        let second = Commit::new(
            "second".to_string(),
            1,
            vec![initial.hash.clone()],
            BTreeMap::new(),
        )
        .unwrap();
        second.save(&store).unwrap();

        let log: Vec<_> = first_parent_log(&store, &second.hash).collect();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].hash, second.hash);
        assert_eq!(log[1].hash, initial.hash);
    }

    #[test]
    fn find_matches_exact_message() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let store = store_in(&tmp);

        let a = Commit::new("fix bug".to_string(), 0, Vec::new(), BTreeMap::new()).unwrap();
        a.save(&store).unwrap();
        let b = Commit::new("fix bug2".to_string(), 1, Vec::new(), BTreeMap::new()).unwrap();
        b.save(&store).unwrap();

        let found = find(&store, "fix bug").unwrap();
        assert_eq!(found, vec![a.hash]);
    }
}
