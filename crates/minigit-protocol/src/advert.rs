//! Ref advertisement parsing (protocol v1).
//!
//! The info/refs response body is a pkt-line stream: an optional
//! `# service=git-upload-pack` header section terminated by a flush-pkt,
//! then one record per ref terminated by another flush-pkt. The first ref
//! record carries the server's capability list after a NUL byte.

use bstr::BString;
use minigit_hash::ObjectId;

use crate::capability::Capabilities;
use crate::pktline::{Pkt, PktLineReader};
use crate::ProtocolError;

/// Parse a v1 ref advertisement.
///
/// Returns the advertised refs in advertisement order and the server
/// capabilities from the first ref line.
pub fn parse_ref_advertisement<R: std::io::Read>(
    reader: &mut PktLineReader<R>,
) -> Result<(Vec<(ObjectId, BString)>, Capabilities), ProtocolError> {
    let mut refs = Vec::new();
    let mut capabilities = Capabilities::default();
    let mut seen_caps = false;
    let mut in_service_header = false;

    loop {
        match reader.read_pkt_opt()? {
            None => break,
            Some(Pkt::Flush) => {
                if in_service_header {
                    // End of the service header section; refs follow.
                    in_service_header = false;
                    continue;
                }
                break;
            }
            Some(Pkt::Data(data)) => {
                let line = strip_newline(&data);

                if line.starts_with(b"# service=") {
                    in_service_header = true;
                    continue;
                }
                if in_service_header || line.is_empty() {
                    continue;
                }

                // The first ref line carries capabilities after a NUL.
                if !seen_caps {
                    seen_caps = true;
                    if let Some(nul_pos) = line.iter().position(|&b| b == 0) {
                        let caps_str = String::from_utf8_lossy(&line[nul_pos + 1..]);
                        capabilities = Capabilities::parse(&caps_str);
                        parse_ref_line(&line[..nul_pos], &mut refs)?;
                        continue;
                    }
                }

                // Later lines may still carry a NUL from buggy servers;
                // everything after it is discarded.
                let ref_part = match line.iter().position(|&b| b == 0) {
                    Some(nul_pos) => &line[..nul_pos],
                    None => line,
                };
                parse_ref_line(ref_part, &mut refs)?;
            }
        }
    }

    Ok((refs, capabilities))
}

/// Parse a single ref advertisement line: `<40-hex-oid> <refname>`
fn parse_ref_line(line: &[u8], refs: &mut Vec<(ObjectId, BString)>) -> Result<(), ProtocolError> {
    let space_pos = line.iter().position(|&b| b == b' ').ok_or_else(|| {
        ProtocolError::Protocol(format!(
            "invalid ref line (no space): {}",
            String::from_utf8_lossy(line)
        ))
    })?;

    let oid_hex = &line[..space_pos];
    let refname = &line[space_pos + 1..];

    let oid_str = std::str::from_utf8(oid_hex)
        .map_err(|_| ProtocolError::Protocol("invalid UTF-8 in OID".into()))?;

    let oid = ObjectId::from_hex(oid_str).map_err(|e| {
        ProtocolError::Protocol(format!("invalid OID in ref advertisement: {}", e))
    })?;

    refs.push((oid, BString::from(refname)));
    Ok(())
}

pub(crate) fn strip_newline(data: &[u8]) -> &[u8] {
    if data.last() == Some(&b'\n') {
        &data[..data.len() - 1]
    } else {
        data
    }
}
