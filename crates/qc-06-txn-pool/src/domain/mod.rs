//! # Domain Layer - Transaction Pool
//!
//! Synchronous state with no I/O. The service layer serializes access.
//!
//! ## Components
//!
//! - `entities`: Sender, ValidatorId, Verdict, ValidationRecord state machine
//! - `pool`: TransactionPool with disjoint pending/verified sets
//! - `coordinator`: ValidationCoordinator, fail-fast aggregation and deadlines
//! - `registry`: ValidatorRegistry with dispatch-time snapshots
//! - `dispatch`: WorkerDispatch, the bounded worker gate
//! - `value_objects`: TxOutcome, QueryReply, PoolStatus, PoolStats
//! - `errors`: TxPoolError enumeration

pub mod coordinator;
pub mod dispatch;
pub mod entities;
pub mod errors;
pub mod pool;
pub mod registry;
pub mod value_objects;

pub use coordinator::*;
pub use dispatch::*;
pub use entities::*;
pub use errors::*;
pub use pool::*;
pub use registry::*;
pub use value_objects::*;
