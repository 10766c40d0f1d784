//! Tests `branch`, `rm-branch`, and `reset`.

use std::error::Error;
use std::fs;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;

fn gitlet() -> Command {
    Command::cargo_bin("gitlet").unwrap()
}

#[test]
fn branch_creates_pointer_at_head() -> Result<(), Box<dyn Error>> {
    let tmpdir = assert_fs::TempDir::new()?;
    gitlet().current_dir(&tmpdir).arg("init").assert().success();
    gitlet().current_dir(&tmpdir).arg("branch").arg("feature").assert().success();

    tmpdir.child(".gitlet/refs/feature").assert(predicate::path::is_file());
    Ok(())
}

#[test]
fn branch_rejects_duplicate_name() -> Result<(), Box<dyn Error>> {
    let tmpdir = assert_fs::TempDir::new()?;
    gitlet().current_dir(&tmpdir).arg("init").assert().success();

    let mut cmd = gitlet();
    cmd.current_dir(&tmpdir).arg("branch").arg("master");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("A branch with that name already exists."));

    Ok(())
}

#[test]
fn rm_branch_refuses_current_branch() -> Result<(), Box<dyn Error>> {
    let tmpdir = assert_fs::TempDir::new()?;
    gitlet().current_dir(&tmpdir).arg("init").assert().success();

    let mut cmd = gitlet();
    cmd.current_dir(&tmpdir).arg("rm-branch").arg("master");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Cannot remove the current branch."));

    Ok(())
}

#[test]
fn rm_branch_deletes_other_branch() -> Result<(), Box<dyn Error>> {
    let tmpdir = assert_fs::TempDir::new()?;
    gitlet().current_dir(&tmpdir).arg("init").assert().success();
    gitlet().current_dir(&tmpdir).arg("branch").arg("feature").assert().success();
    gitlet().current_dir(&tmpdir).arg("rm-branch").arg("feature").assert().success();

    tmpdir
        .child(".gitlet/refs/feature")
        .assert(predicate::path::missing());
    Ok(())
}

#[test]
fn reset_moves_head_and_branch_tip() -> Result<(), Box<dyn Error>> {
    let tmpdir = assert_fs::TempDir::new()?;
    gitlet().current_dir(&tmpdir).arg("init").assert().success();

    let initial_hash = fs::read_to_string(tmpdir.path().join(".gitlet/refs/master"))?;

    fs::write(tmpdir.path().join("a.txt"), "A")?;
    gitlet().current_dir(&tmpdir).arg("add").arg("a.txt").assert().success();
    gitlet().current_dir(&tmpdir).arg("commit").arg("m1").assert().success();

    gitlet().current_dir(&tmpdir).arg("reset").arg(&initial_hash).assert().success();

    assert!(!tmpdir.path().join("a.txt").exists());
    let head_after = fs::read_to_string(tmpdir.path().join(".gitlet/refs/master"))?;
    assert_eq!(head_after, initial_hash);

    Ok(())
}

#[test]
fn reset_unknown_commit_fails() -> Result<(), Box<dyn Error>> {
    let tmpdir = assert_fs::TempDir::new()?;
    gitlet().current_dir(&tmpdir).arg("init").assert().success();

    let mut cmd = gitlet();
    cmd.current_dir(&tmpdir).arg("reset").arg("deadbeef");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No commit with that id exists."));

    Ok(())
}
