//! Pack ingest: unpack a received packfile into the loose object store.
//!
//! A pack arriving from upload-pack is processed in two passes. Pass 1
//! parses every entry in order, persists non-delta objects immediately, and
//! queues delta entries with their base reference and raw delta bytes.
//! Pass 2 resolves each delta against its base — an earlier in-pack entry,
//! an object resolved moments ago, or an object already on disk (thin
//! packs) — and persists the result as an ordinary loose object.

use std::collections::HashMap;
use std::io::Read;

use flate2::bufread::ZlibDecoder;
use minigit_hash::hasher::Hasher;
use minigit_hash::ObjectId;
use minigit_object::ObjectType;
use minigit_odb::ObjectStore;

use crate::entry::parse_entry_header;
use crate::{
    delta, is_supported_version, PackEntryType, PackError, MAX_DELTA_CHAIN_DEPTH,
    PACK_HEADER_SIZE, PACK_SIGNATURE,
};

/// Counters from a completed ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnpackStats {
    /// Total objects declared in the pack header.
    pub objects: u32,
    /// How many of them arrived as deltas.
    pub deltas: usize,
}

/// How a queued delta names its base.
enum BaseRef {
    /// Absolute offset of the base entry in this pack (OFS_DELTA).
    Offset(u64),
    /// OID of the base object (REF_DELTA, possibly outside the pack).
    Sha(ObjectId),
}

/// A delta entry awaiting resolution.
struct DeltaRecord {
    pack_offset: u64,
    base: BaseRef,
    data: Vec<u8>,
}

/// What lives at a given pack offset.
enum Slot {
    Resolved { kind: ObjectType, oid: ObjectId },
    Delta(usize),
}

/// Unpack a complete in-memory packfile into `store`.
///
/// All objects (delta or not) end up as loose objects; the pack structure
/// itself is discarded. Fails loudly on any malformed entry, unresolvable
/// base, or checksum mismatch — partial writes are harmless because the
/// store is content-addressed and idempotent.
pub fn unpack(store: &ObjectStore, pack: &[u8]) -> Result<UnpackStats, PackError> {
    if pack.len() < PACK_HEADER_SIZE + ObjectId::RAW_LEN {
        return Err(PackError::InvalidHeader("pack too small".into()));
    }
    if &pack[0..4] != PACK_SIGNATURE {
        return Err(PackError::InvalidHeader("bad PACK signature".into()));
    }
    let version = u32::from_be_bytes([pack[4], pack[5], pack[6], pack[7]]);
    if !is_supported_version(version) {
        return Err(PackError::UnsupportedVersion(version));
    }
    let count = u32::from_be_bytes([pack[8], pack[9], pack[10], pack[11]]);

    // The trailer is a SHA-1 over everything before it.
    let body_end = pack.len() - ObjectId::RAW_LEN;
    let expected = ObjectId::from_bytes(&pack[body_end..])?;
    let actual = Hasher::digest(&pack[..body_end])?;
    if actual != expected {
        return Err(PackError::ChecksumMismatch { expected, actual });
    }

    // Pass 1: parse entries, persist non-deltas, queue deltas.
    let mut by_offset: HashMap<u64, Slot> = HashMap::new();
    let mut deltas: Vec<DeltaRecord> = Vec::new();
    let mut cursor = PACK_HEADER_SIZE as u64;

    for _ in 0..count {
        if cursor as usize >= body_end {
            return Err(PackError::CorruptEntry(cursor));
        }
        let entry_offset = cursor;
        let entry = parse_entry_header(&pack[cursor as usize..body_end], entry_offset)?;
        let data_start = entry.data_offset as usize;
        let (stream, consumed) =
            inflate_entry(&pack[data_start..body_end], entry.uncompressed_size, entry_offset)?;
        cursor = entry.data_offset + consumed;

        match entry.entry_type {
            PackEntryType::Commit
            | PackEntryType::Tree
            | PackEntryType::Blob
            | PackEntryType::Tag => {
                let kind = entry
                    .entry_type
                    .to_object_type()
                    .expect("non-delta entry type");
                let oid = store.write_raw(kind, &stream)?;
                by_offset.insert(entry_offset, Slot::Resolved { kind, oid });
            }
            PackEntryType::OfsDelta { base_offset } => {
                by_offset.insert(entry_offset, Slot::Delta(deltas.len()));
                deltas.push(DeltaRecord {
                    pack_offset: entry_offset,
                    base: BaseRef::Offset(base_offset),
                    data: stream,
                });
            }
            PackEntryType::RefDelta { base_oid } => {
                by_offset.insert(entry_offset, Slot::Delta(deltas.len()));
                deltas.push(DeltaRecord {
                    pack_offset: entry_offset,
                    base: BaseRef::Sha(base_oid),
                    data: stream,
                });
            }
        }
    }

    if cursor as usize != body_end {
        return Err(PackError::CorruptEntry(cursor));
    }

    // Pass 2: resolve deltas. A REF_DELTA base may itself be a delta
    // appearing later in the pack, so retry rounds until one makes no
    // progress; a stuck MissingBase is then genuine.
    let mut resolved: Vec<Option<(ObjectType, ObjectId)>> =
        (0..deltas.len()).map(|_| None).collect();
    let mut pending: Vec<usize> = (0..deltas.len()).collect();

    while !pending.is_empty() {
        let round_size = pending.len();
        let mut still_pending = Vec::new();
        let mut last_missing: Option<PackError> = None;

        for idx in pending {
            match resolve_delta(store, &deltas, &by_offset, &mut resolved, idx, 0) {
                Ok(_) => {}
                Err(e @ PackError::MissingBase(_)) => {
                    still_pending.push(idx);
                    last_missing = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        if still_pending.len() == round_size {
            return Err(last_missing.expect("unresolved deltas imply a missing base"));
        }
        pending = still_pending;
    }

    Ok(UnpackStats {
        objects: count,
        deltas: deltas.len(),
    })
}

/// Resolve one queued delta (memoized), returning the resulting object.
fn resolve_delta(
    store: &ObjectStore,
    deltas: &[DeltaRecord],
    by_offset: &HashMap<u64, Slot>,
    resolved: &mut Vec<Option<(ObjectType, ObjectId)>>,
    idx: usize,
    depth: usize,
) -> Result<(ObjectType, ObjectId), PackError> {
    if let Some(done) = resolved[idx] {
        return Ok(done);
    }
    let rec = &deltas[idx];
    if depth >= MAX_DELTA_CHAIN_DEPTH {
        return Err(PackError::DeltaChainTooDeep {
            offset: rec.pack_offset,
            max_depth: MAX_DELTA_CHAIN_DEPTH,
        });
    }

    let (kind, base_payload) = match rec.base {
        BaseRef::Offset(off) => match by_offset.get(&off) {
            Some(&Slot::Resolved { kind, oid }) => (kind, read_required(store, &oid)?),
            Some(&Slot::Delta(base_idx)) => {
                let (kind, oid) =
                    resolve_delta(store, deltas, by_offset, resolved, base_idx, depth + 1)?;
                (kind, read_required(store, &oid)?)
            }
            // The back-offset does not land on an entry boundary.
            None => return Err(PackError::CorruptEntry(rec.pack_offset)),
        },
        BaseRef::Sha(oid) => match store.read_raw(&oid)? {
            Some((kind, payload)) => (kind, payload),
            None => return Err(PackError::MissingBase(oid)),
        },
    };

    let target = delta::apply_delta(&base_payload, &rec.data)?;
    let oid = store.write_raw(kind, &target)?;
    resolved[idx] = Some((kind, oid));
    Ok((kind, oid))
}

/// Read an object that must exist (it was persisted earlier in this ingest).
fn read_required(store: &ObjectStore, oid: &ObjectId) -> Result<Vec<u8>, PackError> {
    match store.read_raw(oid)? {
        Some((_, payload)) => Ok(payload),
        None => Err(PackError::MissingBase(*oid)),
    }
}

/// Decompress one entry's zlib stream, returning the bytes and the exact
/// compressed span consumed (streams are not length-prefixed, so the
/// cursor advance must come from the decoder).
fn inflate_entry(
    compressed: &[u8],
    expected_size: usize,
    entry_offset: u64,
) -> Result<(Vec<u8>, u64), PackError> {
    let mut decoder = ZlibDecoder::new(compressed);
    let mut out = Vec::with_capacity(expected_size);
    decoder
        .read_to_end(&mut out)
        .map_err(|_| PackError::CorruptEntry(entry_offset))?;
    if out.len() != expected_size {
        return Err(PackError::CorruptEntry(entry_offset));
    }
    Ok((out, decoder.total_in()))
}
