//! # voxlink-server
//!
//! The browser-facing HTTP surface: the embedded control page, the
//! `/api/*` relay endpoints, a health check, and graceful shutdown
//! coordination. Handlers never block on the peer socket — reads happen
//! only in the receiver task owned by `voxlink-peer`.

#![deny(unsafe_code)]

pub mod api;
pub mod config;
pub mod health;
pub mod server;
pub mod shutdown;
