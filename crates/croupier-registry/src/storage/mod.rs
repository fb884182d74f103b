//! Registry persistence.
//!
//! The protocols only see the [`RegistryStore`] trait. Two implementations
//! exist: [`RegistryDatabase`] on `SQLite`, and [`MemoryStore`] for tests and
//! throwaway deployments.

mod db;
mod memory;
mod models;
mod queries;
mod store;


pub use croupier_core::db::DatabaseError;
pub use db::RegistryDatabase;
pub use memory::MemoryStore;
pub use store::{
    CasinoFilter, CasinoPage, CasinoPatch, NewCasino, NewHeartbeat, RegistryStore, SharedStore,
};
