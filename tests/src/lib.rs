//! # Transaction Pool Test Suite
//!
//! Unified test crate for flows that cross module boundaries.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Criterion benchmarks for the hot domain paths
//! └── src/integration/  # End-to-end: ingress → validators → consensus query
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p qc-tests integration::
//! cargo bench -p qc-tests
//! ```

#![allow(dead_code)]

pub mod integration;
