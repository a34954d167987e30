//! Working-tree checkout: materializing a commit's tree on disk.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use crate::object::{commit, tree, FileMode, Id, Kind, Object};
use crate::store::ObjectStore;
use crate::{Error, Result};

/// Materialize the tree of `commit_id` under `dest`.
///
/// Every object the commit references must already be present in the
/// store. Existing non-empty files are never overwritten.
pub fn checkout_commit(store: &ObjectStore, commit_id: &Id, dest: &Path) -> Result<()> {
    let commit_object = read_kind(store, commit_id, Kind::Commit)?;
    let summary = commit::parse_commit(&commit_object.content)?;
    checkout_tree(store, &summary.tree, dest)
}

/// Materialize a tree object under `dir`, recursing into subtrees.
pub fn checkout_tree(store: &ObjectStore, tree_id: &Id, dir: &Path) -> Result<()> {
    let tree_object = read_kind(store, tree_id, Kind::Tree)?;

    for entry in tree::parse_tree(&tree_object.content)? {
        let path = dir.join(OsStr::from_bytes(&entry.name));

        match entry.mode {
            FileMode::Tree => {
                fs::create_dir_all(&path)?;
                checkout_tree(store, &entry.id, &path)?;
            }
            FileMode::Normal | FileMode::Executable => {
                let blob = read_kind(store, &entry.id, Kind::Blob)?;
                refuse_overwrite(&path)?;
                fs::write(&path, &blob.content)?;
                if entry.mode == FileMode::Executable {
                    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
                }
            }
            FileMode::SymbolicLink => {
                let blob = read_kind(store, &entry.id, Kind::Blob)?;
                std::os::unix::fs::symlink(OsStr::from_bytes(&blob.content), &path)?;
            }
            FileMode::Submodule => {
                // Submodule contents are fetched separately; leave an
                // empty directory as git does.
                fs::create_dir_all(&path)?;
            }
        }
    }

    Ok(())
}

fn read_kind(store: &ObjectStore, id: &Id, expected: Kind) -> Result<Object> {
    let object = store.read(id)?;
    if object.kind != expected {
        return Err(Error::Object(format!(
            "object {} is a {}, expected {}",
            id, object.kind, expected
        )));
    }
    Ok(object)
}

fn refuse_overwrite(path: &Path) -> Result<()> {
    if let Ok(metadata) = fs::symlink_metadata(path) {
        if metadata.len() > 0 {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("refusing to overwrite {}", path.display()),
            )));
        }
    }
    Ok(())
}
