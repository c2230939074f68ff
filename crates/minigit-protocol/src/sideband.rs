//! Side-band demultiplexing.
//!
//! During fetch, the server multiplexes the upload-pack response over
//! side-band channels, one per pkt-line payload's first byte:
//! - Band 1: pack data
//! - Band 2: progress messages
//! - Band 3: fatal error from the remote

use crate::ProtocolError;

/// Side-band channel identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    /// Pack data (band 1).
    Data = 1,
    /// Progress messages (band 2).
    Progress = 2,
    /// Fatal error (band 3).
    Error = 3,
}

impl Band {
    /// Decode a payload's leading channel byte.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Data),
            2 => Some(Self::Progress),
            3 => Some(Self::Error),
            _ => None,
        }
    }
}

/// Demultiplex one side-band record.
///
/// Band 1 is appended to `pack`; band 2 goes to the progress sink; band 3
/// aborts with the server's message.
pub fn demux_record(
    payload: &[u8],
    pack: &mut Vec<u8>,
    progress: &mut dyn FnMut(&[u8]),
) -> Result<(), ProtocolError> {
    let Some((&band_byte, rest)) = payload.split_first() else {
        return Ok(());
    };

    match Band::from_byte(band_byte) {
        Some(Band::Data) => {
            pack.extend_from_slice(rest);
            Ok(())
        }
        Some(Band::Progress) => {
            progress(rest);
            Ok(())
        }
        Some(Band::Error) => Err(ProtocolError::ServerError(
            String::from_utf8_lossy(rest).trim_end().to_string(),
        )),
        None => Err(ProtocolError::Protocol(format!(
            "unknown side-band channel: {}",
            band_byte
        ))),
    }
}

/// Default progress sink: forward remote progress to stderr.
pub fn progress_to_stderr(msg: &[u8]) {
    eprint!("remote: {}", String::from_utf8_lossy(msg));
}
