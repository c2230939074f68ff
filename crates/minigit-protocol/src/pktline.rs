//! Pkt-line protocol framing.
//!
//! The pkt-line format is the foundation of the git wire protocol. Each
//! packet is prefixed with a 4-hex-digit length (including the 4 bytes of
//! the length field itself). The special packet `0000` is a flush-pkt,
//! used as a section separator or end marker. Lengths 1-3 cannot frame a
//! packet and are rejected. Payloads are arbitrary bytes and may contain
//! NULs (capability advertisements embed them).

use std::io::{Read, Write};

use crate::ProtocolError;

/// Maximum data per packet (65520 - 4 = 65516).
pub const MAX_PKT_DATA_LEN: usize = 65516;

/// One decoded pkt-line record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pkt {
    /// Normal data record.
    Data(Vec<u8>),
    /// Flush packet (0000).
    Flush,
}

/// Pkt-line reader.
pub struct PktLineReader<R> {
    reader: R,
}

impl<R: Read> PktLineReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Consume the reader and return the inner value.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Read one pkt-line record.
    pub fn read_pkt(&mut self) -> Result<Pkt, ProtocolError> {
        match self.read_pkt_opt()? {
            Some(pkt) => Ok(pkt),
            None => Err(ProtocolError::Protocol(
                "unexpected EOF reading pkt-line".into(),
            )),
        }
    }

    /// Read one pkt-line record, or `None` on clean EOF at a record
    /// boundary (the upload-pack response ends this way rather than with
    /// a flush).
    pub fn read_pkt_opt(&mut self) -> Result<Option<Pkt>, ProtocolError> {
        let mut len_buf = [0u8; 4];
        let mut filled = 0;
        while filled < 4 {
            let n = self.reader.read(&mut len_buf[filled..])?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(ProtocolError::InvalidPktLine(
                    "EOF inside pkt-line length prefix".into(),
                ));
            }
            filled += n;
        }

        let len_str = std::str::from_utf8(&len_buf).map_err(|_| {
            ProtocolError::InvalidPktLine(format!("invalid pkt-line length bytes: {:?}", len_buf))
        })?;

        let len = u16::from_str_radix(len_str, 16).map_err(|_| {
            ProtocolError::InvalidPktLine(format!("invalid pkt-line length: {:?}", len_str))
        })?;

        match len {
            0 => Ok(Some(Pkt::Flush)),
            1..=3 => Err(ProtocolError::InvalidPktLine(format!(
                "pkt-line length {} is invalid (minimum data packet is 4)",
                len
            ))),
            _ => {
                let data_len = (len as usize) - 4;
                if data_len > MAX_PKT_DATA_LEN {
                    return Err(ProtocolError::InvalidPktLine(format!(
                        "pkt-line too long: {} bytes",
                        data_len
                    )));
                }
                let mut data = vec![0u8; data_len];
                self.reader.read_exact(&mut data).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::UnexpectedEof {
                        ProtocolError::InvalidPktLine("EOF inside pkt-line payload".into())
                    } else {
                        ProtocolError::Io(e)
                    }
                })?;
                Ok(Some(Pkt::Data(data)))
            }
        }
    }

    /// Read all data records until a flush packet.
    pub fn read_until_flush(&mut self) -> Result<Vec<Vec<u8>>, ProtocolError> {
        let mut lines = Vec::new();
        while let Pkt::Data(data) = self.read_pkt()? {
            lines.push(data);
        }
        Ok(lines)
    }
}

/// Pkt-line writer.
pub struct PktLineWriter<W> {
    writer: W,
}

impl<W: Write> PktLineWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consume the writer and return the inner value.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Write a data packet.
    pub fn write_line(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        if data.len() > MAX_PKT_DATA_LEN {
            return Err(ProtocolError::InvalidPktLine(format!(
                "data too long for pkt-line: {} bytes (max {})",
                data.len(),
                MAX_PKT_DATA_LEN
            )));
        }

        let len = (data.len() + 4) as u16;
        write!(self.writer, "{:04x}", len)?;
        self.writer.write_all(data)?;
        Ok(())
    }

    /// Write a text line (appends \n if not present).
    pub fn write_text(&mut self, text: &str) -> Result<(), ProtocolError> {
        if text.ends_with('\n') {
            self.write_line(text.as_bytes())
        } else {
            let mut data = text.as_bytes().to_vec();
            data.push(b'\n');
            self.write_line(&data)
        }
    }

    /// Write a flush packet (0000).
    pub fn write_flush(&mut self) -> Result<(), ProtocolError> {
        self.writer.write_all(b"0000")?;
        Ok(())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<(), ProtocolError> {
        self.writer.flush()?;
        Ok(())
    }
}
