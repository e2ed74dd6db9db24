//! # IPC Layer - Transaction Pool
//!
//! Mailboxes, message payloads and the endpoint loops that feed the pool
//! server.

pub mod endpoints;
pub mod mailbox;
pub mod payloads;

pub use endpoints::*;
pub use mailbox::*;
pub use payloads::*;
