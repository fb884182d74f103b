//! Croupier Registry Library
//!
//! Core functionality for the casino registry:
//! - Signed registration, heartbeat and update protocols
//! - Discovery queries and network statistics
//! - `SQLite` and in-memory registry stores
//! - Inactivity sweeper
//! - axum HTTP API with a uniform JSON envelope

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod api;
pub mod discovery;
pub mod protocol;
pub mod storage;
pub mod sweeper;
pub mod types;
pub mod validation;
