//! # Transaction Pool Subsystem
//!
//! Admission and validation pipeline in front of block assembly. Accepts
//! unconfirmed transactions from the network, the local API and consensus
//! queries, validates each one against every registered validator, and
//! keeps the ones that pass in a verified pool.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | A hash is absent, pending or verified, never two | `domain/pool.rs` - `admit()` |
//! | Pending → verified only, never back | `domain/pool.rs` - `promote()` / `discard()` |
//! | Dispatch snapshot fixed at dispatch time | `domain/coordinator.rs` - `dispatch()` |
//! | First failing verdict decides | `domain/coordinator.rs` - `on_verdict()` |
//! | At most `max_workers` validations in flight | `domain/dispatch.rs` - `try_acquire()` |
//! | Record destroyed on resolution | `domain/coordinator.rs` - `resolve()` |
//!
//! ## Validation Lifecycle
//!
//! ```text
//! [Received] ──worker slot──→ [Dispatched] ──verdict──→ [Aggregating]
//!      │ (queued while                │                        │
//!      │  gate saturated)             └───────────┬────────────┘
//!      │                                          ↓
//!      └──────────────────────────→ [Accepted | Rejected | Expired]
//!                                          │            │
//!                                   verified pool    dropped
//! ```
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      OUTER LAYER                                │
//! │  ipc/        - mailboxes, payloads, endpoint loops              │
//! │  adapters/   - InMemoryLedger, StaticGenesis                    │
//! │  validators/ - stateless / stateful validator actors            │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      MIDDLE LAYER                               │
//! │  ports/inbound.rs  - TxPoolApi trait                            │
//! │  ports/outbound.rs - Ledger, GenesisProvider, TimeSource        │
//! │  service.rs        - TxPoolServer                               │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      INNER LAYER                                │
//! │  domain/pool.rs        - pending / verified sets                │
//! │  domain/coordinator.rs - per-transaction state machine          │
//! │  domain/registry.rs    - validator registry                     │
//! │  domain/dispatch.rs    - worker gate                            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ipc;
pub mod ports;
pub mod service;
pub mod validators;

pub use adapters::*;
pub use config::*;
pub use domain::*;
pub use ipc::*;
pub use ports::*;
pub use service::*;
pub use validators::*;
