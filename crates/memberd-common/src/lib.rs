//! # Memberd Common
//!
//! Shared types and utilities used across memberd components.
//!
//! ## Modules
//! - `types` - Wire payload structures (HeartbeatPayload, HeartbeatEntry)
//! - `error` - Common error types
//! - `constants` - Protocol default constants

pub mod constants;
pub mod error;
pub mod types;

pub use error::MemberdError;
pub use types::*;

/// Convenience result alias used throughout memberd
pub type Result<T> = std::result::Result<T, MemberdError>;
