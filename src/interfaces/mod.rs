// src/interfaces/mod.rs
//! Interfaces module for the Plasma root chain
//!
//! This module provides the call context every operation receives, the
//! outbound value transfer seam used by withdrawals, and the interface for
//! sharing one root chain between threads.

mod context;
mod root_chain_interface;

pub use context::*;
pub use root_chain_interface::*;
