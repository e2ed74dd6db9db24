//! Ports layer for the transaction pool.
//!
//! - Inbound (Driving) port: `TxPoolApi`, served by `TxPoolServer`
//! - Outbound (Driven) ports: ledger, genesis, time and flush sink

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
