//! The loose object database: zlib-deflated canonical encodings stored
//! under `.git/objects/` with a two-level fan-out derived from the ID.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::object::{Id, Object};
use crate::zlib;
use crate::{Error, Result};

/// Reads and writes loose objects beneath a repository's `.git` directory.
///
/// Objects are write-once and immutable: writing an ID that already exists
/// is a no-op, since content addressing guarantees the existing file holds
/// the same bytes.
pub struct ObjectStore {
    objects_dir: PathBuf,
}

impl ObjectStore {
    /// Create a store rooted at the given `.git` directory.
    pub fn new(git_dir: &Path) -> ObjectStore {
        ObjectStore {
            objects_dir: git_dir.join("objects"),
        }
    }

    /// The path a loose object for `id` lives at: `objects/<xx>/<38 hex>`.
    pub fn object_path(&self, id: &Id) -> PathBuf {
        self.objects_dir
            .join(id.directory_name())
            .join(id.file_name())
    }

    /// Returns true if a loose object with this ID exists.
    pub fn contains(&self, id: &Id) -> bool {
        self.object_path(id).is_file()
    }

    /// Write an object, creating its fan-out directory if missing,
    /// and return its ID.
    pub fn write(&self, object: &Object) -> Result<Id> {
        let id = object.id();
        let dir = self.objects_dir.join(id.directory_name());
        let path = dir.join(id.file_name());
        if path.exists() {
            return Ok(id);
        }

        fs::create_dir_all(&dir)?;
        fs::write(&path, zlib::deflate(&object.encoded()))?;
        Ok(id)
    }

    /// Read the object with the given ID.
    ///
    /// Fails with an object error when the ID is unknown or the stored
    /// bytes do not inflate and parse back into a well-formed object.
    pub fn read(&self, id: &Id) -> Result<Object> {
        let path = self.object_path(id);
        let compressed = fs::read(&path).map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                Error::Object(format!("object {} not found", id))
            } else {
                Error::Io(err)
            }
        })?;

        let (encoded, _) = zlib::inflate_prefix(&compressed)
            .map_err(|err| Error::Object(format!("object {} is unreadable: {}", id, err)))?;

        Object::parse(&encoded)
            .map_err(|err| Error::Object(format!("object {} is corrupt: {}", id, err)))
    }
}
