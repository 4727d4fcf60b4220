//! Common Infrastructure Module
//!
//! Shared error types for the staking core.

pub mod error;

// Re-exports for convenience
pub use error::{Result, StakeError};
