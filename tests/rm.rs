//! Tests `rm` (spec.md §4.6, §8 scenario 3).

use std::error::Error;
use std::fs;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;

fn gitlet() -> Command {
    Command::cargo_bin("gitlet").unwrap()
}

#[test]
fn rm_untracked_unstaged_fails() -> Result<(), Box<dyn Error>> {
    let tmpdir = assert_fs::TempDir::new()?;
    gitlet().current_dir(&tmpdir).arg("init").assert().success();
    fs::write(tmpdir.path().join("a.txt"), "A")?;

    let mut cmd = gitlet();
    cmd.current_dir(&tmpdir).arg("rm").arg("a.txt");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No reason to remove the file."));

    Ok(())
}

#[test]
fn rm_staged_file_clears_staging() -> Result<(), Box<dyn Error>> {
    let tmpdir = assert_fs::TempDir::new()?;
    gitlet().current_dir(&tmpdir).arg("init").assert().success();

    fs::write(tmpdir.path().join("a.txt"), "A")?;
    gitlet().current_dir(&tmpdir).arg("add").arg("a.txt").assert().success();
    gitlet().current_dir(&tmpdir).arg("rm").arg("a.txt").assert().success();

    // File was never tracked by head, so it stays on disk.
    assert!(tmpdir.path().join("a.txt").exists());

    Ok(())
}

#[test]
fn rm_tracked_file_deletes_from_disk_and_removes_from_next_commit() -> Result<(), Box<dyn Error>> {
    let tmpdir = assert_fs::TempDir::new()?;
    gitlet().current_dir(&tmpdir).arg("init").assert().success();

    fs::write(tmpdir.path().join("a.txt"), "A")?;
    gitlet().current_dir(&tmpdir).arg("add").arg("a.txt").assert().success();
    gitlet().current_dir(&tmpdir).arg("commit").arg("m1").assert().success();

    gitlet().current_dir(&tmpdir).arg("rm").arg("a.txt").assert().success();
    assert!(!tmpdir.path().join("a.txt").exists());

    gitlet().current_dir(&tmpdir).arg("commit").arg("m2").assert().success();

    let mut cmd = gitlet();
    cmd.current_dir(&tmpdir).arg("status");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("=== Removed Files ===\n\n"));

    Ok(())
}
