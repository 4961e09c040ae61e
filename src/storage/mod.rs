// src/storage/mod.rs
//! Durable storage of the root chain state

mod state_store;

pub use state_store::{StateStore, SNAPSHOT_MAGIC, SNAPSHOT_VERSION};
