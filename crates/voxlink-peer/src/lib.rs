//! # voxlink-peer
//!
//! The TCP link to the remote peer: length-prefixed frame codec, the
//! process-wide link session record, the background receiver task, and the
//! connect / disconnect / send controller the HTTP surface drives.

#![deny(unsafe_code)]

pub mod codec;
pub mod controller;
mod receiver;
pub mod session;

pub use controller::LinkController;
pub use session::{LinkSession, LinkSnapshot};
