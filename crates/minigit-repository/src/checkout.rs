//! Working-tree materialization.

use std::path::Path;

use bstr::ByteSlice;
use minigit_hash::ObjectId;
use minigit_object::{FileMode, Object};
use minigit_odb::ObjectStore;

use crate::{RepoError, Repository};

/// Materialize the given commit into the repository's working tree.
///
/// The work tree is first cleared of everything except `.git`, then the
/// commit's tree is walked: directories are created, files written with
/// mode 0644/0755, symlinks created from the blob payload. Any missing
/// object aborts the checkout — a hole here means delta resolution went
/// wrong, and silently skipping would hide it.
pub fn checkout_commit(repo: &Repository, commit_oid: &ObjectId) -> Result<(), RepoError> {
    let work_tree = repo.work_tree().ok_or(RepoError::BareNoWorkTree)?.to_path_buf();

    let commit = match read_required(repo.odb(), commit_oid)? {
        Object::Commit(c) => c,
        other => {
            return Err(RepoError::UnexpectedObjectType {
                oid: *commit_oid,
                expected: "commit",
                actual: other.object_type().as_str(),
            })
        }
    };

    clear_work_tree(&work_tree)?;
    materialize_tree(repo.odb(), &commit.tree, &work_tree)?;
    Ok(())
}

/// Remove every entry of the work tree except `.git`.
fn clear_work_tree(work_tree: &Path) -> Result<(), RepoError> {
    for entry in std::fs::read_dir(work_tree)? {
        let entry = entry?;
        if entry.file_name() == ".git" {
            continue;
        }
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            std::fs::remove_dir_all(&path)?;
        } else {
            std::fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Recursively write a tree's entries under `target`.
fn materialize_tree(
    store: &ObjectStore,
    tree_oid: &ObjectId,
    target: &Path,
) -> Result<(), RepoError> {
    let tree = match read_required(store, tree_oid)? {
        Object::Tree(t) => t,
        other => {
            return Err(RepoError::UnexpectedObjectType {
                oid: *tree_oid,
                expected: "tree",
                actual: other.object_type().as_str(),
            })
        }
    };

    for entry in tree.iter() {
        let path = target.join(entry.name.to_str_lossy().as_ref());

        match entry.mode {
            FileMode::Tree => {
                std::fs::create_dir_all(&path)?;
                materialize_tree(store, &entry.oid, &path)?;
            }
            FileMode::Regular | FileMode::Executable => {
                let data = read_blob(store, &entry.oid)?;
                std::fs::write(&path, &data)?;
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    let mode = if entry.mode == FileMode::Executable {
                        0o755
                    } else {
                        0o644
                    };
                    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode))?;
                }
            }
            FileMode::Symlink => {
                let data = read_blob(store, &entry.oid)?;
                #[cfg(unix)]
                {
                    let link_target = std::path::PathBuf::from(
                        String::from_utf8_lossy(&data).into_owned(),
                    );
                    std::os::unix::fs::symlink(&link_target, &path)?;
                }
                #[cfg(not(unix))]
                {
                    std::fs::write(&path, &data)?;
                }
            }
            // Submodules are not materialized.
            FileMode::Gitlink => {}
            FileMode::Unknown(_) => {
                let data = read_blob(store, &entry.oid)?;
                std::fs::write(&path, &data)?;
            }
        }
    }

    Ok(())
}

fn read_required(store: &ObjectStore, oid: &ObjectId) -> Result<Object, RepoError> {
    store.read(oid)?.ok_or(RepoError::MissingObject(*oid))
}

fn read_blob(store: &ObjectStore, oid: &ObjectId) -> Result<Vec<u8>, RepoError> {
    match read_required(store, oid)? {
        Object::Blob(b) => Ok(b.data),
        other => Err(RepoError::UnexpectedObjectType {
            oid: *oid,
            expected: "blob",
            actual: other.object_type().as_str(),
        }),
    }
}
