use std::fs;
use std::io::Write;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use super::{require_repo, Cli};

use mingit::object::{tree, FileMode, Id, Kind, Object, TreeEntry};
use mingit::{ObjectStore, Result};

use clap::{App, ArgMatches, SubCommand};

pub(crate) fn subcommand<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name("write-tree")
        .about("Create a tree object from the current working directory")
}

pub(crate) fn run(cli: &mut Cli, _args: &ArgMatches) -> Result<()> {
    let store = ObjectStore::new(&require_repo()?);

    // Empty subdirectories are skipped, but the root tree itself is
    // written even when it has no entries.
    let id = match write_tree_dir(&store, Path::new("."))? {
        Some(id) => id,
        None => store.write(&Object::new(Kind::Tree, Vec::new()))?,
    };

    writeln!(cli, "{}", id)?;
    Ok(())
}

// Post-order traversal: blobs and subtrees are written before the tree
// that references them. Returns `None` for a directory with no entries.
fn write_tree_dir(store: &ObjectStore, dir: &Path) -> Result<Option<Id>> {
    let mut entries = Vec::new();

    for dir_entry in fs::read_dir(dir)? {
        let dir_entry = dir_entry?;
        let name = dir_entry.file_name();
        if name == ".git" {
            continue;
        }

        let file_type = dir_entry.file_type()?;
        if file_type.is_dir() {
            if let Some(id) = write_tree_dir(store, &dir_entry.path())? {
                entries.push(TreeEntry::new(FileMode::Tree, name.as_bytes(), id));
            }
        } else if file_type.is_symlink() {
            let target = fs::read_link(dir_entry.path())?;
            let blob = Object::new(Kind::Blob, target.as_os_str().as_bytes().to_vec());
            let id = store.write(&blob)?;
            entries.push(TreeEntry::new(FileMode::SymbolicLink, name.as_bytes(), id));
        } else {
            let content = fs::read(dir_entry.path())?;
            let id = store.write(&Object::new(Kind::Blob, content))?;

            let mode = if dir_entry.metadata()?.permissions().mode() & 0o111 != 0 {
                FileMode::Executable
            } else {
                FileMode::Normal
            };
            entries.push(TreeEntry::new(mode, name.as_bytes(), id));
        }
    }

    if entries.is_empty() {
        return Ok(None);
    }

    let payload = tree::encode_tree(entries);
    store.write(&Object::new(Kind::Tree, payload)).map(Some)
}
