//! # voxlink-core
//!
//! Shared types for the voice relay: the peer wire message schema and the
//! error taxonomy for link operations.

#![deny(unsafe_code)]

pub mod error;
pub mod message;

pub use error::LinkError;
pub use message::PeerMessage;
