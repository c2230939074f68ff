//! Repository discovery, initialization, and central access for the minigit
//! subsystems: object store, ref store, working-tree snapshot and checkout.

pub mod checkout;
mod clone;
mod error;
mod init;
pub mod snapshot;

pub use clone::{finalize_clone_refs, select_default_ref};
pub use error::RepoError;
pub use init::InitOptions;

use std::path::{Path, PathBuf};

use minigit_hash::ObjectId;
use minigit_odb::ObjectStore;
use minigit_ref::{RefName, RefStore, Reference};

/// The central repository struct tying the subsystems together.
pub struct Repository {
    /// Path to the .git directory.
    git_dir: PathBuf,
    /// Path to the working tree (None for bare repos).
    work_tree: Option<PathBuf>,
    /// Object store.
    odb: ObjectStore,
    /// Reference store.
    refs: RefStore,
}

impl Repository {
    /// Open an existing repository at the given path.
    ///
    /// `path` should point to either the `.git` directory or the working
    /// tree root.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        let path = path.as_ref();
        if path.join("HEAD").is_file() && path.join("objects").is_dir() {
            // Path is a git dir (bare repo or .git directory).
            Ok(Self::from_git_dir(path.to_path_buf(), None))
        } else if path.join(".git").is_dir() {
            Ok(Self::from_git_dir(
                path.join(".git"),
                Some(path.to_path_buf()),
            ))
        } else {
            Err(RepoError::NotFound(path.to_path_buf()))
        }
    }

    /// Discover a repository starting from the given directory, walking up.
    pub fn discover(start: impl AsRef<Path>) -> Result<Self, RepoError> {
        let start = start.as_ref();
        let absolute = if start.is_relative() {
            std::env::current_dir()?.join(start)
        } else {
            start.to_path_buf()
        };

        let mut dir: &Path = &absolute;
        loop {
            if dir.join(".git").is_dir() {
                return Ok(Self::from_git_dir(
                    dir.join(".git"),
                    Some(dir.to_path_buf()),
                ));
            }
            if dir.join("HEAD").is_file() && dir.join("objects").is_dir() {
                return Ok(Self::from_git_dir(dir.to_path_buf(), None));
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => return Err(RepoError::NotFound(absolute)),
            }
        }
    }

    /// Initialize a new repository at the given path.
    pub fn init(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        Self::init_opts(path, &InitOptions::default())
    }

    /// Initialize a new repository with custom options.
    pub fn init_opts(path: impl AsRef<Path>, opts: &InitOptions) -> Result<Self, RepoError> {
        let (git_dir, work_tree) = init::init_repository(path.as_ref(), opts)?;
        Ok(Self::from_git_dir(git_dir, work_tree))
    }

    fn from_git_dir(git_dir: PathBuf, work_tree: Option<PathBuf>) -> Self {
        let odb = ObjectStore::open(git_dir.join("objects"));
        let refs = RefStore::new(&git_dir);
        Self {
            git_dir,
            work_tree,
            odb,
            refs,
        }
    }

    /// Path to the .git directory.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Path to the working tree (None for bare repos).
    pub fn work_tree(&self) -> Option<&Path> {
        self.work_tree.as_deref()
    }

    /// Access the object store.
    pub fn odb(&self) -> &ObjectStore {
        &self.odb
    }

    /// Access the reference store.
    pub fn refs(&self) -> &RefStore {
        &self.refs
    }

    /// Resolve HEAD to an OID (None when unborn).
    pub fn head_oid(&self) -> Result<Option<ObjectId>, RepoError> {
        let head = RefName::new("HEAD")?;
        Ok(self.refs.resolve_to_oid(&head)?)
    }

    /// Get the current branch name (None if detached HEAD).
    pub fn current_branch(&self) -> Result<Option<String>, RepoError> {
        let head = RefName::new("HEAD")?;
        match self.refs.read(&head)? {
            Some(Reference::Symbolic { target, .. }) => {
                let name = target.as_str();
                let branch = name.strip_prefix("refs/heads/").unwrap_or(name);
                Ok(Some(branch.to_string()))
            }
            Some(Reference::Direct { .. }) => Ok(None), // detached HEAD
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("git_dir", &self.git_dir)
            .field("work_tree", &self.work_tree)
            .finish_non_exhaustive()
    }
}
