//! # Shared Types Crate
//!
//! Chain entities shared between the transaction pool, its validators and
//! the node runtime.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: cross-crate types are defined here.
//! - **Content Identity**: a `Transaction` is identified by the hash of its
//!   unsigned body, never by object identity.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
