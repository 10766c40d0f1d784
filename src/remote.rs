//! Remote sync (§4.12).
//!
//! A remote is just another repository directory on the same filesystem —
//! no transport, no protocol. Every operation is plain file copies plus
//! ref updates, safe to do unconditionally because the object store is
//! content-addressed.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::commit::Commit;
use crate::error::GitletError;
use crate::objects::Store;
use crate::state::Repo;

/// Normalizes path separators in a user-supplied remote path to the host
/// separator, the way the teacher's `Path`-from-`String` conversions assume.
fn normalize_path(raw: &str) -> PathBuf {
    let normalized: String = raw
        .chars()
        .map(|c| if c == '/' || c == '\\' { std::path::MAIN_SEPARATOR } else { c })
        .collect();
    PathBuf::from(normalized)
}

pub fn add_remote(repo: &Repo, name: &str, path: &str) -> Result<()> {
    let mut remotes = repo.remotes()?;
    anyhow::ensure!(!remotes.contains_key(name), GitletError::RemoteExists);
    remotes.insert(name.to_string(), normalize_path(path));
    repo.set_remotes(&remotes)
}

pub fn rm_remote(repo: &Repo, name: &str) -> Result<()> {
    let mut remotes = repo.remotes()?;
    anyhow::ensure!(remotes.contains_key(name), GitletError::NoSuchRemote);
    remotes.remove(name);
    repo.set_remotes(&remotes)
}

fn remote_repo(repo: &Repo, name: &str) -> Result<Repo> {
    let remotes = repo.remotes()?;
    let path = remotes.get(name).ok_or(GitletError::NoSuchRemote)?;
    anyhow::ensure!(path.join(".gitlet").is_dir(), GitletError::NoRemoteDir);
    Ok(Repo::at(path.clone()))
}

/// Copies every blob and commit object from `src` into `dst`. Content-addressed,
/// so an overwrite of an existing object is always writing identical bytes.
fn copy_all_objects(src: &Path, dst: &Path) -> Result<()> {
    for sub in ["blobs", "commits"] {
        let src_dir = src.join(".gitlet").join(sub);
        let dst_dir = dst.join(".gitlet").join(sub);
        fs::create_dir_all(&dst_dir).with_context(|| format!("create {}", dst_dir.display()))?;
        for entry in fs::read_dir(&src_dir).with_context(|| format!("read {}", src_dir.display()))? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                let name = entry.file_name();
                fs::copy(entry.path(), dst_dir.join(&name))
                    .with_context(|| format!("copy object {:?}", name))?;
            }
        }
    }
    Ok(())
}

/// §4.12 `push name branch`: fails `NoRemoteDir`/`NoSuchRemote` if the remote
/// is unknown or its directory is missing. If the peer already has `branch`,
/// requires the peer's tip to be an ancestor of the local head's first-parent
/// chain, else `PushNotFastForward`. Copies every local object to the peer,
/// then advances (or creates) the peer's branch tip. Pushing to `master`
/// also makes `master` the peer's current branch, matching the source's
/// surprising "only master moves HEAD" push semantics (spec.md §9).
pub fn push(local: &Repo, local_store: &Store, remote_name: &str, branch: &str) -> Result<()> {
    let peer = remote_repo(local, remote_name)?;
    let local_head = local.head()?;

    if peer.branch_exists(branch) {
        let peer_tip = peer.branch_tip(branch)?;
        anyhow::ensure!(
            is_ancestor_via_first_parent(local_store, &local_head, &peer_tip)?,
            GitletError::PushNotFastForward
        );
    }

    copy_all_objects(&local.root, &peer.root)?;

    if peer.branch_exists(branch) {
        peer.set_branch_tip(branch, &local_head)?;
    } else {
        peer.create_branch(branch, &local_head)?;
    }

    if branch == "master" {
        peer.set_current_branch("master")?;
    }

    Ok(())
}

fn is_ancestor_via_first_parent(store: &Store, head: &str, candidate: &str) -> Result<bool> {
    let mut cursor = Some(head.to_string());
    while let Some(hash) = cursor {
        if hash == candidate {
            return Ok(true);
        }
        let commit = Commit::load(store, &hash)?;
        cursor = commit.parents.first().cloned();
    }
    Ok(false)
}

/// §4.12 `fetch name branch`: copies every peer object locally and points
/// the remote-tracking branch `"<name>/<branch>"` at the peer's tip. Never
/// touches the working tree.
pub fn fetch(local: &Repo, remote_name: &str, branch: &str) -> Result<()> {
    let peer = remote_repo(local, remote_name)?;
    anyhow::ensure!(peer.branch_exists(branch), GitletError::NoSuchRemoteBranch);

    let peer_tip = peer.branch_tip(branch)?;
    copy_all_objects(&peer.root, &local.root)?;

    let tracking_branch = format!("{remote_name}/{branch}");
    if local.branch_exists(&tracking_branch) {
        local.set_branch_tip(&tracking_branch, &peer_tip)?;
    } else {
        local.create_branch(&tracking_branch, &peer_tip)?;
    }
    Ok(())
}

/// §4.12 `pull name branch`: `fetch` then `merge "name/branch"`.
pub fn pull(local: &Repo, local_store: &Store, remote_name: &str, branch: &str) -> Result<()> {
    fetch(local, remote_name, branch)?;
    let tracking_branch = format!("{remote_name}/{branch}");
    crate::merge::merge(local, local_store, &tracking_branch)
}
