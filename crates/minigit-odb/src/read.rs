use std::fs;
use std::io::Read;

use flate2::read::ZlibDecoder;
use minigit_hash::ObjectId;
use minigit_object::header;
use minigit_object::{Object, ObjectType};

use crate::{ObjectStore, StoreError};

impl ObjectStore {
    /// Check if a loose object exists.
    pub fn contains(&self, oid: &ObjectId) -> bool {
        self.object_path(oid).is_file()
    }

    /// Read a loose object by OID.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    /// Returns `Err` if the object exists but is corrupt.
    pub fn read(&self, oid: &ObjectId) -> Result<Option<Object>, StoreError> {
        match self.read_raw(oid)? {
            Some((obj_type, payload)) => {
                Ok(Some(Object::parse_content(obj_type, &payload)?))
            }
            None => Ok(None),
        }
    }

    /// Read the type and raw payload of a loose object by OID.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    pub fn read_raw(&self, oid: &ObjectId) -> Result<Option<(ObjectType, Vec<u8>)>, StoreError> {
        let path = self.object_path(oid);
        let compressed = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        };

        let decompressed = decompress_all(&compressed, oid)?;
        let (obj_type, content_size, header_len) = header::parse_header(&decompressed)?;
        let content = &decompressed[header_len..];
        if content.len() != content_size {
            return Err(StoreError::Corrupt {
                oid: oid.to_hex(),
                reason: format!(
                    "size mismatch: header says {}, got {}",
                    content_size,
                    content.len()
                ),
            });
        }
        Ok(Some((obj_type, content.to_vec())))
    }

    /// Read just the header (type + size) without decompressing the full content.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    pub fn read_header(
        &self,
        oid: &ObjectId,
    ) -> Result<Option<(ObjectType, usize)>, StoreError> {
        let path = self.object_path(oid);
        let compressed = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        };

        // Decompress just enough to read the header (type + size + null byte).
        // Headers are typically < 32 bytes, so 64 is plenty of room.
        let mut decoder = ZlibDecoder::new(&compressed[..]);
        let mut buf = [0u8; 64];
        let mut filled = 0;

        loop {
            if filled >= buf.len() {
                return Err(StoreError::Corrupt {
                    oid: oid.to_hex(),
                    reason: "header exceeds 64 bytes".into(),
                });
            }
            let n = decoder
                .read(&mut buf[filled..])
                .map_err(|e| StoreError::Decompress {
                    oid: oid.to_hex(),
                    source: e,
                })?;
            if n == 0 {
                return Err(StoreError::Corrupt {
                    oid: oid.to_hex(),
                    reason: "unexpected EOF before header null terminator".into(),
                });
            }
            filled += n;
            if buf[..filled].contains(&0) {
                break;
            }
        }

        let (obj_type, content_size, _header_len) = header::parse_header(&buf[..filled])?;
        Ok(Some((obj_type, content_size)))
    }
}

/// Zlib-decompress the full contents of a loose object file.
fn decompress_all(compressed: &[u8], oid: &ObjectId) -> Result<Vec<u8>, StoreError> {
    let mut decoder = ZlibDecoder::new(compressed);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| StoreError::Decompress {
            oid: oid.to_hex(),
            source: e,
        })?;
    Ok(decompressed)
}
