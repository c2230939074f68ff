//! Git wire protocol implementation (fetch side).
//!
//! This crate implements the client half of the v1 upload-pack exchange:
//! pkt-line framing, ref advertisement parsing, capability negotiation,
//! and the side-band demultiplexed pack response.

pub mod advert;
pub mod capability;
pub mod fetch;
pub mod pktline;
pub mod sideband;

use minigit_transport::TransportError;

/// Errors that can occur during protocol operations.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid pkt-line: {0}")]
    InvalidPktLine(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("remote error: {0}")]
    ServerError(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
