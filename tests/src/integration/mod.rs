//! Integration flows.
//!
//! - `txn_pool_flow`: a node container with real validator actors

pub mod txn_pool_flow;
