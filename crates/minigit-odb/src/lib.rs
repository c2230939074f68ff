//! Loose object storage: read and write zlib-compressed objects.
//!
//! Each loose object lives at `.git/objects/XX/YYYY...` where `XX` is the first
//! byte of the OID in hex and `YYYY...` is the rest. The file content is
//! zlib-compressed `"<type> <size>\0<content>"`.

mod read;
mod write;

use std::path::{Path, PathBuf};

use minigit_hash::ObjectId;

/// Interface to the loose object directory (`.git/objects/`).
pub struct ObjectStore {
    /// Path to the objects directory.
    objects_dir: PathBuf,
    /// Zlib compression level.
    compression_level: flate2::Compression,
}

impl ObjectStore {
    /// Open the loose object store at the given path.
    pub fn open(objects_dir: impl AsRef<Path>) -> Self {
        Self {
            objects_dir: objects_dir.as_ref().to_path_buf(),
            compression_level: flate2::Compression::default(),
        }
    }

    /// Set the zlib compression level (0–9).
    pub fn set_compression_level(&mut self, level: u32) {
        self.compression_level = flate2::Compression::new(level);
    }

    /// Get the path to the objects directory.
    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    /// Get the file path for a given OID.
    pub fn object_path(&self, oid: &ObjectId) -> PathBuf {
        self.objects_dir.join(oid.loose_path())
    }
}

/// Errors from loose object operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("corrupt loose object {oid}: {reason}")]
    Corrupt { oid: String, reason: String },

    #[error("decompression error for {oid}: {source}")]
    Decompress {
        oid: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("object parse error: {0}")]
    Object(#[from] minigit_object::ObjectError),

    #[error("hash error: {0}")]
    Hash(#[from] minigit_hash::HashError),
}
