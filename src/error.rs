//! The canonical error taxonomy for gitlet commands.
//!
//! Each variant carries the exact message the command dispatcher prints to
//! standard output on failure. Library functions return `anyhow::Result`
//! throughout, wrapping one of these variants whenever the failure is a
//! named case from the command surface rather than incidental I/O.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GitletError {
    #[error("Not in an initialized Gitlet directory.")]
    NotInitialized,

    #[error("A Gitlet version-control system already exists in the current directory.")]
    AlreadyInitialized,

    #[error("Incorrect operands.")]
    BadArgs,

    #[error("Please enter a command.")]
    NoCommand,

    #[error("No command with that name exists.")]
    UnknownCommand,

    #[error("File does not exist.")]
    FileDoesNotExist,

    #[error("Please enter a commit message.")]
    EmptyMessage,

    #[error("No changes added to the commit.")]
    NoChanges,

    #[error("No reason to remove the file.")]
    NothingToRemove,

    #[error("No commit with that id exists.")]
    NoSuchCommit,

    #[error("File does not exist in that commit.")]
    FileNotInCommit,

    #[error("A branch with that name does not exist.")]
    NoSuchBranch,

    #[error("A branch with that name already exists.")]
    BranchExists,

    #[error("Cannot remove the current branch.")]
    CannotRemoveCurrent,

    #[error("No need to checkout the current branch.")]
    SameBranch,

    #[error("There is an untracked file in the way; delete it, or add and commit it first.")]
    UntrackedOverwrite,

    #[error("You have uncommitted changes.")]
    UncommittedChanges,

    #[error("Given branch is an ancestor of the current branch.")]
    AncestorMerge,

    #[error("Cannot merge a branch with itself.")]
    SelfMerge,

    #[error("Remote directory not found.")]
    NoRemoteDir,

    #[error("A remote with that name already exists.")]
    RemoteExists,

    #[error("A remote with that name does not exist.")]
    NoSuchRemote,

    #[error("That remote does not have that branch.")]
    NoSuchRemoteBranch,

    #[error("Please pull down remote changes before pushing.")]
    PushNotFastForward,
}
