use std::fs;
use std::path::Path;

use assert_cmd::Command;

const EMPTY_TREE_SHA1: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

fn init_repo(path: &Path) {
    Command::cargo_bin("mingit")
        .unwrap()
        .current_dir(path)
        .args(&["init"])
        .assert()
        .success();
}

fn write_tree(path: &Path) -> String {
    let output = Command::cargo_bin("mingit")
        .unwrap()
        .current_dir(path)
        .args(&["write-tree"])
        .assert()
        .success();

    let stdout = output.get_output().stdout.clone();
    String::from_utf8(stdout).unwrap().trim_end().to_string()
}

#[test]
fn empty_directory_yields_empty_tree() {
    let temp = tempfile::tempdir().unwrap();
    init_repo(temp.path());

    assert_eq!(write_tree(temp.path()), EMPTY_TREE_SHA1);
}

#[test]
fn empty_subdirectories_are_skipped() {
    let temp = tempfile::tempdir().unwrap();
    init_repo(temp.path());
    fs::create_dir_all(temp.path().join("empty/nested")).unwrap();

    assert_eq!(write_tree(temp.path()), EMPTY_TREE_SHA1);
}

#[test]
fn nested_tree_matches_git() {
    // Verified against C git for this exact layout:
    //   a.txt   = "hello"
    //   sub/b.txt = "world"
    let temp = tempfile::tempdir().unwrap();
    init_repo(temp.path());
    fs::write(temp.path().join("a.txt"), b"hello").unwrap();
    fs::create_dir_all(temp.path().join("sub")).unwrap();
    fs::write(temp.path().join("sub/b.txt"), b"world").unwrap();

    assert_eq!(
        write_tree(temp.path()),
        "f899d717c7fb5f361cb17d03be709eda8d11c912"
    );

    // The subtree and both blobs were written too.
    for sha in &[
        "0980762b58316262116e0b114d3bd5d44256399f", // tree sub
        "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0", // blob hello
        "04fea06420ca60892f73becee3614f6d023a4b7f", // blob world
    ] {
        let path = temp
            .path()
            .join(format!(".git/objects/{}/{}", &sha[..2], &sha[2..]));
        assert!(path.is_file(), "missing object {}", sha);
    }
}

#[test]
fn write_tree_is_idempotent() {
    let temp = tempfile::tempdir().unwrap();
    init_repo(temp.path());
    fs::write(temp.path().join("a.txt"), b"hello").unwrap();

    let first = write_tree(temp.path());
    let second = write_tree(temp.path());
    assert_eq!(first, second);
    assert_eq!(first, "65829399355e5929e44741d637d52c614ac21bc3");
}

#[test]
fn error_outside_repository() {
    let temp = tempfile::tempdir().unwrap();

    Command::cargo_bin("mingit")
        .unwrap()
        .current_dir(temp.path())
        .args(&["write-tree"])
        .assert()
        .failure()
        .code(1);
}
