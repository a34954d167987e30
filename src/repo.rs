//! The on-disk repository skeleton: the `.git` directory and its refs.

use std::fs;
use std::io::Result;
use std::path::Path;

use crate::object::Id;

/// Creates a new, empty git repository on the local file system.
///
/// Analogous to [`git init`](https://git-scm.com/docs/git-init), reduced to
/// the skeleton this client uses: `objects/`, `refs/heads/`, and a `HEAD`
/// pointing at `refs/heads/main`.
///
/// Idempotent: repeated invocations leave the repository in the same final
/// state, and an existing `HEAD` is never rewritten.
pub fn init(work_dir: &Path) -> Result<()> {
    let git_dir = work_dir.join(".git");

    fs::create_dir_all(git_dir.join("objects"))?;
    fs::create_dir_all(git_dir.join("refs/heads"))?;

    let head_path = git_dir.join("HEAD");
    if !head_path.exists() {
        fs::write(head_path, "ref: refs/heads/main\n")?;
    }

    Ok(())
}

/// Point `HEAD` at a branch, e.g. `refs/heads/main`.
pub fn write_head_symref(git_dir: &Path, refname: &str) -> Result<()> {
    fs::write(git_dir.join("HEAD"), format!("ref: {}\n", refname))
}

/// Write a ref file, e.g. `refs/heads/main`, creating parent directories
/// as needed.
pub fn write_ref(git_dir: &Path, refname: &str, id: &Id) -> Result<()> {
    let path = git_dir.join(refname);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format!("{}\n", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_skeleton() {
        let temp = tempfile::tempdir().unwrap();
        init(temp.path()).unwrap();

        let git_dir = temp.path().join(".git");
        assert!(git_dir.join("objects").is_dir());
        assert!(git_dir.join("refs/heads").is_dir());
        assert_eq!(
            fs::read_to_string(git_dir.join("HEAD")).unwrap(),
            "ref: refs/heads/main\n"
        );
    }

    #[test]
    fn init_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        init(temp.path()).unwrap();
        init(temp.path()).unwrap();

        let git_dir = temp.path().join(".git");
        assert_eq!(
            fs::read_to_string(git_dir.join("HEAD")).unwrap(),
            "ref: refs/heads/main\n"
        );
    }

    #[test]
    fn init_preserves_existing_head() {
        let temp = tempfile::tempdir().unwrap();
        init(temp.path()).unwrap();

        let git_dir = temp.path().join(".git");
        write_head_symref(&git_dir, "refs/heads/trunk").unwrap();
        init(temp.path()).unwrap();

        assert_eq!(
            fs::read_to_string(git_dir.join("HEAD")).unwrap(),
            "ref: refs/heads/trunk\n"
        );
    }

    #[test]
    fn write_ref_creates_parents() {
        let temp = tempfile::tempdir().unwrap();
        init(temp.path()).unwrap();

        let git_dir = temp.path().join(".git");
        let id = Id::from_hex("b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0").unwrap();
        write_ref(&git_dir, "refs/heads/feature/nested", &id).unwrap();

        assert_eq!(
            fs::read_to_string(git_dir.join("refs/heads/feature/nested")).unwrap(),
            "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0\n"
        );
    }
}
