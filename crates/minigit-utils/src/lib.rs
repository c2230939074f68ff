pub mod date;
pub mod error;
pub mod lockfile;

// Re-export core types at crate root for convenience
pub use bstr::{BStr, BString, ByteSlice, ByteVec};
pub use error::{LockError, UtilError};
pub use lockfile::LockFile;

pub type Result<T> = std::result::Result<T, UtilError>;
