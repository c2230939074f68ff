//! Hash computation and object identity for the minigit git implementation.
//!
//! This crate provides the core `ObjectId` type, hash computation, and hex
//! encoding/decoding used throughout minigit. Object identity is SHA-1: the
//! hash of `"<kind> <len>\0<payload>"`.

mod error;
pub mod hasher;
pub mod hex;
mod oid;

pub use error::HashError;
pub use oid::ObjectId;
