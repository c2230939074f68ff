use std::cmp::Ordering;

use bstr::{BStr, BString, ByteSlice};
use minigit_hash::ObjectId;

use crate::ObjectError;

/// File mode for tree entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileMode {
    /// Regular file (100644)
    Regular,
    /// Executable file (100755)
    Executable,
    /// Symbolic link (120000)
    Symlink,
    /// Git submodule link (160000)
    Gitlink,
    /// Subdirectory (040000)
    Tree,
    /// Unknown mode (preserved for round-trip)
    Unknown(u32),
}

impl FileMode {
    /// Parse from octal ASCII bytes (e.g., `b"100644"`).
    pub fn from_bytes(s: &[u8]) -> Result<Self, ObjectError> {
        let raw = parse_octal(s)
            .ok_or_else(|| ObjectError::InvalidFileMode(String::from_utf8_lossy(s).into()))?;
        Ok(Self::from_raw(raw))
    }

    /// Create from the raw numeric value.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0o100644 => Self::Regular,
            0o100755 => Self::Executable,
            0o120000 => Self::Symlink,
            0o160000 => Self::Gitlink,
            0o040000 => Self::Tree,
            other => Self::Unknown(other),
        }
    }

    /// Serialize to octal ASCII bytes (git's canonical format, no leading zeros for trees).
    pub fn as_bytes(&self) -> BString {
        BString::from(format!("{:o}", self.raw()))
    }

    /// Get the raw numeric value.
    pub fn raw(&self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Gitlink => 0o160000,
            Self::Tree => 0o40000,
            Self::Unknown(v) => *v,
        }
    }

    /// Is this a tree (directory) entry?
    pub fn is_tree(&self) -> bool {
        matches!(self, Self::Tree)
    }

    /// Is this a blob (file) entry?
    pub fn is_blob(&self) -> bool {
        matches!(self, Self::Regular | Self::Executable)
    }

    /// Is this a symlink?
    pub fn is_symlink(&self) -> bool {
        matches!(self, Self::Symlink)
    }

    /// Is this a gitlink (submodule)?
    pub fn is_gitlink(&self) -> bool {
        matches!(self, Self::Gitlink)
    }
}

/// Parse an octal ASCII string to u32.
fn parse_octal(s: &[u8]) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    let mut val: u32 = 0;
    for &b in s {
        if !(b'0'..=b'7').contains(&b) {
            return None;
        }
        val = val.checked_mul(8)?.checked_add(u32::from(b - b'0'))?;
    }
    Some(val)
}

/// A single entry in a git tree object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: FileMode,
    pub name: BString,
    pub oid: ObjectId,
}

impl PartialOrd for TreeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TreeEntry {
    /// Entries order byte-wise ascending by name.
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

/// A git tree object — a directory snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tree {
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Parse tree content from binary format.
    ///
    /// Each entry is: `<mode-ascii> <name>\0<oid-bytes>`. The parser is
    /// strict: a malformed entry fails the whole parse rather than
    /// returning a partial list. Entries are kept in file order.
    pub fn parse(content: &[u8]) -> Result<Self, ObjectError> {
        let mut entries = Vec::new();
        let mut pos = 0;

        while pos < content.len() {
            // Parse mode (octal ASCII until space).
            let space_pos = content[pos..]
                .iter()
                .position(|&b| b == b' ')
                .ok_or_else(|| ObjectError::InvalidTreeEntry {
                    offset: pos,
                    reason: "missing space after mode".into(),
                })?
                + pos;

            let mode = FileMode::from_bytes(&content[pos..space_pos]).map_err(|_| {
                ObjectError::InvalidTreeEntry {
                    offset: pos,
                    reason: "invalid mode".into(),
                }
            })?;

            // Parse name (until null byte).
            let name_start = space_pos + 1;
            let null_pos = content[name_start..]
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| ObjectError::InvalidTreeEntry {
                    offset: name_start,
                    reason: "missing null after name".into(),
                })?
                + name_start;

            let name = BString::from(&content[name_start..null_pos]);

            // Parse OID (raw bytes after null).
            let oid_start = null_pos + 1;
            if oid_start + ObjectId::RAW_LEN > content.len() {
                return Err(ObjectError::InvalidTreeEntry {
                    offset: oid_start,
                    reason: "truncated OID".into(),
                });
            }

            let oid = ObjectId::from_bytes(&content[oid_start..oid_start + ObjectId::RAW_LEN])?;

            entries.push(TreeEntry { mode, name, oid });
            pos = oid_start + ObjectId::RAW_LEN;
        }

        Ok(Self { entries })
    }

    /// Serialize tree content to binary format.
    ///
    /// Entries are written sorted byte-wise ascending by name.
    pub fn serialize_content(&self) -> Vec<u8> {
        let mut sorted = self.entries.clone();
        sorted.sort();

        let mut out = Vec::new();
        for entry in &sorted {
            out.extend_from_slice(&entry.mode.as_bytes());
            out.push(b' ');
            out.extend_from_slice(&entry.name);
            out.push(0);
            out.extend_from_slice(entry.oid.as_bytes());
        }
        out
    }

    /// Sort entries into serialization order.
    pub fn sort(&mut self) {
        self.entries.sort();
    }

    /// Lookup an entry by name.
    pub fn find(&self, name: &BStr) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name.as_bstr() == name)
    }

    /// Iterate entries.
    pub fn iter(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
