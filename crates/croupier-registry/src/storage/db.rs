//! `SQLite` database for the registry.

croupier_core::define_database!(RegistryDatabase, "Registry database migrations complete");
