//! Common utilities module
//!
//! Shared error type used across the photometric core and its I/O seams.

pub mod error;

pub use error::{PhotometricError, Result};
