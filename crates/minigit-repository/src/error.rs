use std::path::PathBuf;

use minigit_hash::ObjectId;

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("not a git repository (or any of the parent directories): {0}")]
    NotFound(PathBuf),

    #[error("bare repository has no working tree")]
    BareNoWorkTree,

    #[error("object not found: {0}")]
    MissingObject(ObjectId),

    #[error("expected a {expected}, but {oid} is a {actual}")]
    UnexpectedObjectType {
        oid: ObjectId,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("remote did not advertise any branch")]
    NoBranch,

    #[error(transparent)]
    Store(#[from] minigit_odb::StoreError),

    #[error(transparent)]
    Ref(#[from] minigit_ref::RefError),

    #[error(transparent)]
    Object(#[from] minigit_object::ObjectError),

    #[error(transparent)]
    Hash(#[from] minigit_hash::HashError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
