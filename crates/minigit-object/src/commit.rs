use bstr::{BStr, BString, ByteSlice};
use minigit_hash::ObjectId;
use minigit_utils::date::Signature;

use crate::ObjectError;

/// A git commit object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// OID of the root tree.
    pub tree: ObjectId,
    /// Parent commit OIDs (empty for root commit).
    pub parents: Vec<ObjectId>,
    /// Author identity and timestamp.
    pub author: Signature,
    /// Committer identity and timestamp.
    pub committer: Signature,
    /// Other headers (gpgsig, encoding, mergetag, ...) preserved for round-trip.
    pub extra_headers: Vec<(BString, BString)>,
    /// Commit message (everything after the blank line separator).
    pub message: BString,
}

impl Commit {
    /// Parse commit content from raw bytes (no object header).
    pub fn parse(content: &[u8]) -> Result<Self, ObjectError> {
        let mut tree: Option<ObjectId> = None;
        let mut parents = Vec::new();
        let mut author: Option<Signature> = None;
        let mut committer: Option<Signature> = None;
        let mut extra_headers: Vec<(BString, BString)> = Vec::new();

        let data = content;
        let mut pos = 0;

        // Parse headers (lines before the blank line).
        loop {
            if pos >= data.len() {
                // No message (unusual but possible).
                break;
            }

            // A blank line separates headers from message.
            if data[pos] == b'\n' {
                pos += 1;
                break;
            }

            let line_end = data[pos..]
                .iter()
                .position(|&b| b == b'\n')
                .map(|p| p + pos)
                .unwrap_or(data.len());

            let line = &data[pos..line_end];

            // Parse "key value" format.
            if let Some(space_pos) = line.iter().position(|&b| b == b' ') {
                let key = &line[..space_pos];
                let value = &line[space_pos + 1..];

                match key {
                    b"tree" => {
                        let hex = std::str::from_utf8(value)
                            .map_err(|_| ObjectError::InvalidHeader("non-UTF8 tree OID".into()))?;
                        tree = Some(ObjectId::from_hex(hex)?);
                    }
                    b"parent" => {
                        let hex = std::str::from_utf8(value).map_err(|_| {
                            ObjectError::InvalidHeader("non-UTF8 parent OID".into())
                        })?;
                        parents.push(ObjectId::from_hex(hex)?);
                    }
                    b"author" => {
                        author = Some(parse_signature(value)?);
                    }
                    b"committer" => {
                        committer = Some(parse_signature(value)?);
                    }
                    _ => {
                        // Other headers may be multi-line: continuation lines
                        // start with a space (e.g., gpgsig, mergetag).
                        let mut val = Vec::from(value);
                        let mut next = line_end + 1;
                        while next < data.len() && data[next] == b' ' {
                            val.push(b'\n');
                            let cont_end = data[next..]
                                .iter()
                                .position(|&b| b == b'\n')
                                .map(|p| p + next)
                                .unwrap_or(data.len());
                            val.extend_from_slice(&data[next + 1..cont_end]);
                            next = cont_end + 1;
                        }
                        extra_headers.push((BString::from(key), BString::from(val)));
                        pos = next;
                        continue;
                    }
                }
            }

            pos = line_end + 1;
        }

        let tree = tree.ok_or(ObjectError::MissingCommitField { field: "tree" })?;
        let author = author.ok_or(ObjectError::MissingCommitField { field: "author" })?;
        let committer = committer.ok_or(ObjectError::MissingCommitField { field: "committer" })?;

        let message = BString::from(&data[pos.min(data.len())..]);

        Ok(Self {
            tree,
            parents,
            author,
            committer,
            extra_headers,
            message,
        })
    }

    /// Serialize commit content to bytes (no object header).
    pub fn serialize_content(&self) -> Vec<u8> {
        let mut out = Vec::new();

        out.extend_from_slice(b"tree ");
        out.extend_from_slice(self.tree.to_hex().as_bytes());
        out.push(b'\n');

        for parent in &self.parents {
            out.extend_from_slice(b"parent ");
            out.extend_from_slice(parent.to_hex().as_bytes());
            out.push(b'\n');
        }

        out.extend_from_slice(b"author ");
        out.extend_from_slice(&self.author.to_bytes());
        out.push(b'\n');

        out.extend_from_slice(b"committer ");
        out.extend_from_slice(&self.committer.to_bytes());
        out.push(b'\n');

        // Extra headers (multi-line with continuation).
        for (key, val) in &self.extra_headers {
            out.extend_from_slice(key);
            out.push(b' ');
            for (i, line) in val.split(|&b| b == b'\n').enumerate() {
                if i > 0 {
                    out.push(b'\n');
                    out.push(b' ');
                }
                out.extend_from_slice(line);
            }
            out.push(b'\n');
        }

        // blank line + message
        out.push(b'\n');
        out.extend_from_slice(&self.message);

        out
    }

    /// Get the first parent (or None for root commits).
    pub fn first_parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    /// Is this a root commit? (no parents)
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Get just the summary (first line) of the message.
    pub fn summary(&self) -> &BStr {
        let msg: &[u8] = self.message.as_ref();
        match msg.find_byte(b'\n') {
            Some(pos) => BStr::new(&msg[..pos]),
            None => BStr::new(msg),
        }
    }
}

fn parse_signature(data: &[u8]) -> Result<Signature, ObjectError> {
    Signature::parse(BStr::new(data)).map_err(|e| ObjectError::InvalidSignature(e.to_string()))
}
