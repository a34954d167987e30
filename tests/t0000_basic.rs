use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn init_creates_skeleton() {
    let temp = tempfile::tempdir().unwrap();

    Command::cargo_bin("mingit")
        .unwrap()
        .current_dir(temp.path())
        .args(&["init"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Initialized empty Git repository"));

    let git_dir = temp.path().join(".git");
    assert!(git_dir.join("objects").is_dir());
    assert!(git_dir.join("refs/heads").is_dir());
    assert_eq!(
        fs::read_to_string(git_dir.join("HEAD")).unwrap(),
        "ref: refs/heads/main\n"
    );
}

#[test]
fn init_into_named_directory() {
    let temp = tempfile::tempdir().unwrap();

    Command::cargo_bin("mingit")
        .unwrap()
        .current_dir(temp.path())
        .args(&["init", "repo"])
        .assert()
        .success();

    assert!(temp.path().join("repo/.git/objects").is_dir());
}

#[test]
fn init_twice_converges() {
    let temp = tempfile::tempdir().unwrap();

    for _ in 0..2 {
        Command::cargo_bin("mingit")
            .unwrap()
            .current_dir(temp.path())
            .args(&["init"])
            .assert()
            .success();
    }

    assert_eq!(
        fs::read_to_string(temp.path().join(".git/HEAD")).unwrap(),
        "ref: refs/heads/main\n"
    );
}

#[test]
fn objects_dir_starts_empty() {
    let temp = tempfile::tempdir().unwrap();

    Command::cargo_bin("mingit")
        .unwrap()
        .current_dir(temp.path())
        .args(&["init"])
        .assert()
        .success();

    let objects_dir = temp.path().join(".git/objects");
    assert_eq!(fs::read_dir(objects_dir).unwrap().count(), 0);
}
