//! Croupier CLI Library
//!
//! Client side of the casino registry: key generation, signed
//! registration/heartbeat/update requests and discovery queries.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod client;
pub mod commands;
pub mod fmt;
