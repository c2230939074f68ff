//! Working-directory snapshot: build tree objects from the filesystem.

use std::path::Path;

use bstr::BString;
use minigit_hash::ObjectId;
use minigit_object::{FileMode, ObjectType, Tree, TreeEntry};
use minigit_odb::ObjectStore;

use crate::RepoError;

/// Recursively snapshot a directory into tree and blob objects.
///
/// Every entry except `.git` is captured: subdirectories become subtrees,
/// symlinks become blobs of the link target with mode 120000, regular
/// files become blobs with mode 100755 when any executable bit is set and
/// 100644 otherwise. Returns the OID of the root tree.
pub fn write_tree(store: &ObjectStore, dir: &Path) -> Result<ObjectId, RepoError> {
    let mut tree = Tree::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name == ".git" {
            continue;
        }

        let path = entry.path();
        // Do not follow symlinks: the link itself is the entry.
        let metadata = std::fs::symlink_metadata(&path)?;

        let (mode, oid) = if metadata.file_type().is_symlink() {
            let target = std::fs::read_link(&path)?;
            let target_bytes = path_to_bytes(&target);
            let oid = store.write_raw(ObjectType::Blob, &target_bytes)?;
            (FileMode::Symlink, oid)
        } else if metadata.is_dir() {
            let oid = write_tree(store, &path)?;
            (FileMode::Tree, oid)
        } else {
            let data = std::fs::read(&path)?;
            let oid = store.write_raw(ObjectType::Blob, &data)?;
            (executable_mode(&metadata), oid)
        };

        tree.entries.push(TreeEntry {
            mode,
            name: BString::from(name.to_string_lossy().as_bytes()),
            oid,
        });
    }

    let payload = tree.serialize_content();
    Ok(store.write_raw(ObjectType::Tree, &payload)?)
}

#[cfg(unix)]
fn executable_mode(metadata: &std::fs::Metadata) -> FileMode {
    use std::os::unix::fs::PermissionsExt;
    if metadata.permissions().mode() & 0o111 != 0 {
        FileMode::Executable
    } else {
        FileMode::Regular
    }
}

#[cfg(not(unix))]
fn executable_mode(_metadata: &std::fs::Metadata) -> FileMode {
    FileMode::Regular
}

#[cfg(unix)]
fn path_to_bytes(path: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().to_vec()
}

#[cfg(not(unix))]
fn path_to_bytes(path: &Path) -> Vec<u8> {
    path.to_string_lossy().into_owned().into_bytes()
}
