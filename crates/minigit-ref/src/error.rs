use std::path::PathBuf;

/// Error types for reference operations.
#[derive(Debug, thiserror::Error)]
pub enum RefError {
    #[error("invalid ref name: {0}")]
    InvalidName(String),

    #[error("ref not found: {0}")]
    NotFound(String),

    #[error("symbolic ref loop detected: {0}")]
    SymrefLoop(String),

    #[error("directory-file conflict: cannot create ref '{name}' because '{conflict}' exists")]
    DirectoryConflict { name: String, conflict: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("lock file error: {0}")]
    Lock(#[from] minigit_utils::LockError),

    #[error("{0}")]
    Util(#[from] minigit_utils::UtilError),

    #[error("I/O error on {path}: {source}")]
    IoPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Hash(#[from] minigit_hash::HashError),
}
