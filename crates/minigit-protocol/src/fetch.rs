//! Upload-pack negotiation and pack response reading.
//!
//! The client sends its wants in one shot (`want`*, flush, `done`) and the
//! server answers with an optional ACK/NAK prelude followed by the pack,
//! usually side-band multiplexed. Flush-pkts inside the response are
//! section separators; the response ends at transport EOF.

use std::io::Read;

use minigit_hash::ObjectId;
use minigit_transport::HttpClient;

use crate::advert::strip_newline;
use crate::pktline::{Pkt, PktLineReader, PktLineWriter};
use crate::sideband;
use crate::ProtocolError;

/// Build the upload-pack request body.
///
/// The first want line carries the client capability list; additional
/// wants are bare. The body is `want`*, flush, `done`.
pub fn build_upload_pack_request(
    wants: &[ObjectId],
    caps: &[String],
) -> Result<Vec<u8>, ProtocolError> {
    if wants.is_empty() {
        return Err(ProtocolError::Protocol(
            "nothing to fetch: no want lines".into(),
        ));
    }

    let mut buf = Vec::new();
    let mut writer = PktLineWriter::new(&mut buf);

    for (i, want) in wants.iter().enumerate() {
        if i == 0 && !caps.is_empty() {
            writer.write_text(&format!("want {} {}", want, caps.join(" ")))?;
        } else {
            writer.write_text(&format!("want {}", want))?;
        }
    }
    writer.write_flush()?;
    writer.write_text("done")?;

    Ok(buf)
}

/// Read the upload-pack response body into the raw packfile bytes.
///
/// Handles both response shapes: side-band multiplexed records (the normal
/// case), and a bare pack — either a record whose payload opens with
/// `PACK`, or an entirely unframed stream.
pub fn read_pack_response<R: Read>(
    mut body: R,
    progress: &mut dyn FnMut(&[u8]),
) -> Result<Vec<u8>, ProtocolError> {
    // An unframed response opens with literal "PACK" where a framed one
    // has a hex length prefix.
    let mut head = [0u8; 4];
    let mut filled = 0;
    while filled < 4 {
        let n = body.read(&mut head[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    if filled == 0 {
        return Err(ProtocolError::Protocol("empty upload-pack response".into()));
    }
    if &head[..filled] == b"PACK" {
        let mut pack = head.to_vec();
        body.read_to_end(&mut pack)?;
        return Ok(pack);
    }

    let mut reader = PktLineReader::new(std::io::Cursor::new(head[..filled].to_vec()).chain(body));
    let mut pack = Vec::new();
    let mut sideband_started = false;

    loop {
        match reader.read_pkt_opt()? {
            // The response ends on transport EOF, not on a flush.
            None => break,
            Some(Pkt::Flush) => continue,
            Some(Pkt::Data(payload)) => {
                if payload.is_empty() {
                    continue;
                }

                if !sideband_started {
                    // ACK/NAK prelude before the pack begins.
                    let line = strip_newline(&payload);
                    if line == b"NAK" || line.starts_with(b"ACK ") {
                        continue;
                    }
                    // Fallback: a bare pack inside pkt-lines. The rest of
                    // the body is the raw packfile, unframed.
                    if payload.starts_with(b"PACK") {
                        pack.extend_from_slice(&payload);
                        let mut rest = reader.into_inner();
                        rest.read_to_end(&mut pack)?;
                        return Ok(pack);
                    }
                }

                sideband::demux_record(&payload, &mut pack, progress)?;
                sideband_started = true;
            }
        }
    }

    Ok(pack)
}

/// Run the complete upload-pack exchange against a smart-HTTP remote.
pub fn fetch_pack(
    client: &HttpClient,
    wants: &[ObjectId],
    caps: &[String],
    progress: &mut dyn FnMut(&[u8]),
) -> Result<Vec<u8>, ProtocolError> {
    let request = build_upload_pack_request(wants, caps)?;
    let body = client.upload_pack(request)?;
    read_pack_response(body, progress)
}
