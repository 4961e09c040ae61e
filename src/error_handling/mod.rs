// src/error_handling/mod.rs
//! Error handling for the Plasma root chain
//!
//! This module provides the error types shared by the exit queue, the Merkle
//! validator and the exit state machine.

pub mod error_types;

// Re-export common types
pub use error_types::{QueueError, RootChainError, RootChainResult, ValidatorError};
