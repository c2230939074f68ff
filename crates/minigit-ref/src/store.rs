use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use bstr::ByteSlice;
use minigit_hash::ObjectId;
use minigit_utils::LockFile;

use crate::error::RefError;
use crate::name::RefName;
use crate::Reference;

/// Symbolic ref chains longer than this indicate a loop.
const MAX_SYMREF_DEPTH: usize = 5;

/// Files-backend reference store over a git directory.
pub struct RefStore {
    git_dir: PathBuf,
}

impl RefStore {
    /// Create a ref store for the given git directory.
    pub fn new(git_dir: impl AsRef<Path>) -> Self {
        Self {
            git_dir: git_dir.as_ref().to_path_buf(),
        }
    }

    /// The file system path for a loose ref.
    fn ref_path(&self, name: &RefName) -> PathBuf {
        self.git_dir.join(name.as_str())
    }

    /// Read a ref.
    ///
    /// Returns `Ok(None)` when the ref does not exist.
    pub fn read(&self, name: &RefName) -> Result<Option<Reference>, RefError> {
        let path = self.ref_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read(&path).map_err(|e| RefError::IoPath {
            path: path.clone(),
            source: e,
        })?;

        let trimmed = contents.trim();

        if let Some(target_name) = trimmed.strip_prefix(b"ref: ") {
            let target_str = std::str::from_utf8(target_name.trim())
                .map_err(|_| RefError::Parse("invalid UTF-8 in symbolic ref target".into()))?;
            let target = RefName::new(target_str)?;
            Ok(Some(Reference::Symbolic {
                name: name.clone(),
                target,
            }))
        } else {
            let hex = std::str::from_utf8(trimmed)
                .map_err(|_| RefError::Parse("invalid UTF-8 in ref OID".into()))?;
            let oid = ObjectId::from_hex(hex)?;
            Ok(Some(Reference::Direct {
                name: name.clone(),
                target: oid,
            }))
        }
    }

    /// Resolve a ref to an OID, following symbolic ref chains.
    ///
    /// Returns `Ok(None)` when the ref (or its final target) does not exist.
    pub fn resolve_to_oid(&self, name: &RefName) -> Result<Option<ObjectId>, RefError> {
        let mut current = name.clone();
        for _ in 0..MAX_SYMREF_DEPTH {
            match self.read(&current)? {
                Some(Reference::Direct { target, .. }) => return Ok(Some(target)),
                Some(Reference::Symbolic { target, .. }) => current = target,
                None => return Ok(None),
            }
        }
        Err(RefError::SymrefLoop(name.to_string()))
    }

    /// Write a direct ref atomically: `<git>/refs/...` = `<hex>\n`.
    ///
    /// Parent directories are created as needed; last writer wins.
    pub fn write_ref(&self, name: &RefName, oid: &ObjectId) -> Result<(), RefError> {
        let path = self.ref_path(name);

        if let Some(parent) = path.parent() {
            self.check_dir_file_conflict(name)?;
            fs::create_dir_all(parent).map_err(|e| RefError::IoPath {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut lock = LockFile::acquire(&path)?;
        let content = format!("{}\n", oid.to_hex());
        lock.write_all(content.as_bytes())
            .map_err(|e| RefError::IoPath {
                path: path.clone(),
                source: e,
            })?;
        lock.commit()?;
        Ok(())
    }

    /// Write a symbolic ref atomically: `ref: <target>\n`.
    pub fn write_symbolic_ref(&self, name: &RefName, target: &RefName) -> Result<(), RefError> {
        let path = self.ref_path(name);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| RefError::IoPath {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut lock = LockFile::acquire(&path)?;
        let content = format!("ref: {}\n", target);
        lock.write_all(content.as_bytes())
            .map_err(|e| RefError::IoPath {
                path: path.clone(),
                source: e,
            })?;
        lock.commit()?;
        Ok(())
    }

    /// Check for directory/file conflicts when creating a ref.
    ///
    /// If `refs/heads/main` exists as a file, `refs/heads/main/sub` cannot
    /// be created (main would need to be a directory), and vice versa.
    fn check_dir_file_conflict(&self, name: &RefName) -> Result<(), RefError> {
        let ref_path = self.ref_path(name);

        let mut current = self.git_dir.clone();
        for component in name.as_str().split('/') {
            current = current.join(component);
            if current == ref_path {
                break;
            }
            if current.is_file() {
                return Err(RefError::DirectoryConflict {
                    name: name.to_string(),
                    conflict: current
                        .strip_prefix(&self.git_dir)
                        .unwrap_or(&current)
                        .display()
                        .to_string(),
                });
            }
        }

        if ref_path.is_dir() {
            return Err(RefError::DirectoryConflict {
                name: name.to_string(),
                conflict: format!(
                    "{} (is a directory)",
                    ref_path
                        .strip_prefix(&self.git_dir)
                        .unwrap_or(&ref_path)
                        .display()
                ),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OID_HEX: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

    #[test]
    fn write_and_read_direct_ref() {
        let dir = tempfile::tempdir().unwrap();
        let store = RefStore::new(dir.path());
        let name = RefName::new("refs/heads/main").unwrap();
        let oid = ObjectId::from_hex(OID_HEX).unwrap();

        store.write_ref(&name, &oid).unwrap();

        let content = fs::read_to_string(dir.path().join("refs/heads/main")).unwrap();
        assert_eq!(content, format!("{}\n", OID_HEX));

        match store.read(&name).unwrap().unwrap() {
            Reference::Direct { target, .. } => assert_eq!(target, oid),
            other => panic!("expected Direct, got {:?}", other),
        }
    }

    #[test]
    fn write_and_read_symbolic_ref() {
        let dir = tempfile::tempdir().unwrap();
        let store = RefStore::new(dir.path());
        let head = RefName::new("HEAD").unwrap();
        let target = RefName::new("refs/heads/main").unwrap();

        store.write_symbolic_ref(&head, &target).unwrap();

        let content = fs::read_to_string(dir.path().join("HEAD")).unwrap();
        assert_eq!(content, "ref: refs/heads/main\n");

        match store.read(&head).unwrap().unwrap() {
            Reference::Symbolic { target: t, .. } => assert_eq!(t, target),
            other => panic!("expected Symbolic, got {:?}", other),
        }
    }

    #[test]
    fn read_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = RefStore::new(dir.path());
        let name = RefName::new("refs/heads/nonexistent").unwrap();
        assert!(store.read(&name).unwrap().is_none());
    }

    #[test]
    fn resolve_follows_symref_chain() {
        let dir = tempfile::tempdir().unwrap();
        let store = RefStore::new(dir.path());
        let oid = ObjectId::from_hex(OID_HEX).unwrap();

        let branch = RefName::new("refs/heads/main").unwrap();
        let head = RefName::new("HEAD").unwrap();
        store.write_ref(&branch, &oid).unwrap();
        store.write_symbolic_ref(&head, &branch).unwrap();

        assert_eq!(store.resolve_to_oid(&head).unwrap(), Some(oid));
    }

    #[test]
    fn resolve_unborn_branch_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = RefStore::new(dir.path());
        let head = RefName::new("HEAD").unwrap();
        store
            .write_symbolic_ref(&head, &RefName::new("refs/heads/main").unwrap())
            .unwrap();
        assert_eq!(store.resolve_to_oid(&head).unwrap(), None);
    }

    #[test]
    fn resolve_detects_symref_loop() {
        let dir = tempfile::tempdir().unwrap();
        let store = RefStore::new(dir.path());
        let a = RefName::new("refs/heads/a").unwrap();
        let b = RefName::new("refs/heads/b").unwrap();
        store.write_symbolic_ref(&a, &b).unwrap();
        store.write_symbolic_ref(&b, &a).unwrap();

        assert!(matches!(
            store.resolve_to_oid(&a),
            Err(RefError::SymrefLoop(_))
        ));
    }

    #[test]
    fn last_writer_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = RefStore::new(dir.path());
        let name = RefName::new("refs/heads/main").unwrap();
        let first = ObjectId::from_hex(OID_HEX).unwrap();
        let second = ObjectId::from_hex("0000000000000000000000000000000000000001").unwrap();

        store.write_ref(&name, &first).unwrap();
        store.write_ref(&name, &second).unwrap();

        assert_eq!(store.resolve_to_oid(&name).unwrap(), Some(second));
    }

    #[test]
    fn dir_file_conflict_detected() {
        let dir = tempfile::tempdir().unwrap();
        let store = RefStore::new(dir.path());
        let oid = ObjectId::from_hex(OID_HEX).unwrap();

        store
            .write_ref(&RefName::new("refs/heads/main").unwrap(), &oid)
            .unwrap();

        let nested = RefName::new("refs/heads/main/sub").unwrap();
        assert!(matches!(
            store.write_ref(&nested, &oid),
            Err(RefError::DirectoryConflict { .. })
        ));
    }
}
