use std::fs;
use std::path::Path;

use assert_cmd::Command;

const HELLO_CONTENT: &[u8] = b"hello";
const HELLO_SHA1: &str = "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0";

fn init_repo(path: &Path) {
    Command::cargo_bin("mingit")
        .unwrap()
        .current_dir(path)
        .args(&["init"])
        .assert()
        .success();
}

#[test]
fn hash_file_without_writing() {
    let temp = tempfile::tempdir().unwrap();
    init_repo(temp.path());
    fs::write(temp.path().join("hello"), HELLO_CONTENT).unwrap();

    Command::cargo_bin("mingit")
        .unwrap()
        .current_dir(temp.path())
        .args(&["hash-object", "hello"])
        .assert()
        .success()
        // The ID is printed with no trailing newline.
        .stdout(HELLO_SHA1);

    // The blob must not have been written.
    let object_path = temp
        .path()
        .join(".git/objects/b6/fc4c620b67d95f953a5c1c1230aaab5db5a1b0");
    assert!(!object_path.exists());
}

#[test]
fn hash_file_and_write_to_database() {
    let temp = tempfile::tempdir().unwrap();
    init_repo(temp.path());
    fs::write(temp.path().join("hello"), HELLO_CONTENT).unwrap();

    Command::cargo_bin("mingit")
        .unwrap()
        .current_dir(temp.path())
        .args(&["hash-object", "-w", "hello"])
        .assert()
        .success()
        .stdout(HELLO_SHA1);

    let object_path = temp
        .path()
        .join(".git/objects/b6/fc4c620b67d95f953a5c1c1230aaab5db5a1b0");
    assert!(object_path.is_file());
}

#[test]
fn error_missing_file() {
    let temp = tempfile::tempdir().unwrap();
    init_repo(temp.path());

    Command::cargo_bin("mingit")
        .unwrap()
        .current_dir(temp.path())
        .args(&["hash-object", "does-not-exist"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn error_write_outside_repository() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("hello"), HELLO_CONTENT).unwrap();

    Command::cargo_bin("mingit")
        .unwrap()
        .current_dir(temp.path())
        .args(&["hash-object", "-w", "hello"])
        .assert()
        .failure()
        .code(1);
}
