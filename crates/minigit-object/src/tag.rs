use bstr::{BStr, BString};
use minigit_hash::ObjectId;
use minigit_utils::date::Signature;

use crate::{ObjectError, ObjectType};

/// A git annotated tag object.
///
/// Tags are never created by this implementation, but they arrive in packs
/// and must round-trip through the object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// OID of the tagged object.
    pub target: ObjectId,
    /// Type of the tagged object.
    pub target_type: ObjectType,
    /// Tag name.
    pub tag_name: BString,
    /// Tagger identity and timestamp (optional for some old tags).
    pub tagger: Option<Signature>,
    /// Tag message (including any trailing signature block).
    pub message: BString,
}

impl Tag {
    /// Parse tag content from raw bytes (no object header).
    pub fn parse(content: &[u8]) -> Result<Self, ObjectError> {
        let mut target: Option<ObjectId> = None;
        let mut target_type: Option<ObjectType> = None;
        let mut tag_name: Option<BString> = None;
        let mut tagger: Option<Signature> = None;

        let data = content;
        let mut pos = 0;

        loop {
            if pos >= data.len() {
                break;
            }

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

            if let Some(space_pos) = line.iter().position(|&b| b == b' ') {
                let key = &line[..space_pos];
                let value = &line[space_pos + 1..];

                match key {
                    b"object" => {
                        let hex = std::str::from_utf8(value).map_err(|_| {
                            ObjectError::InvalidHeader("non-UTF8 target OID".into())
                        })?;
                        target = Some(ObjectId::from_hex(hex)?);
                    }
                    b"type" => {
                        target_type = Some(ObjectType::from_bytes(value)?);
                    }
                    b"tag" => {
                        tag_name = Some(BString::from(value));
                    }
                    b"tagger" => {
                        tagger = Some(
                            Signature::parse(BStr::new(value))
                                .map_err(|e| ObjectError::InvalidSignature(e.to_string()))?,
                        );
                    }
                    _ => {
                        // Skip unknown headers.
                    }
                }
            }

            pos = line_end + 1;
        }

        let target = target.ok_or(ObjectError::MissingTagField { field: "object" })?;
        let target_type = target_type.ok_or(ObjectError::MissingTagField { field: "type" })?;
        let tag_name = tag_name.ok_or(ObjectError::MissingTagField { field: "tag" })?;
        let message = BString::from(&data[pos.min(data.len())..]);

        Ok(Self {
            target,
            target_type,
            tag_name,
            tagger,
            message,
        })
    }

    /// Serialize tag content to bytes (no object header).
    pub fn serialize_content(&self) -> Vec<u8> {
        let mut out = Vec::new();

        out.extend_from_slice(b"object ");
        out.extend_from_slice(self.target.to_hex().as_bytes());
        out.push(b'\n');

        out.extend_from_slice(b"type ");
        out.extend_from_slice(self.target_type.as_bytes());
        out.push(b'\n');

        out.extend_from_slice(b"tag ");
        out.extend_from_slice(&self.tag_name);
        out.push(b'\n');

        if let Some(ref tagger) = self.tagger {
            out.extend_from_slice(b"tagger ");
            out.extend_from_slice(&tagger.to_bytes());
            out.push(b'\n');
        }

        out.push(b'\n');
        out.extend_from_slice(&self.message);

        out
    }
}
