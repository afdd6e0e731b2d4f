//! # Quantum-Chain Transaction Lifecycle Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── lifecycle_benchmarks.rs  # Classifier and tick throughput
//! └── src/
//!     ├── fixtures.rs              # Shared builders and wiring
//!     └── integration/             # Supervisor + monitor scenarios
//!         ├── scenarios.rs         # Outcome scenarios under real ticks
//!         └── supervision.rs       # Scheduling and error boundary
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p qc-tests
//!
//! # By category
//! cargo test -p qc-tests integration::scenarios::
//! cargo test -p qc-tests integration::supervision::
//!
//! # Benchmarks
//! cargo bench -p qc-tests
//! ```

#![allow(dead_code)]

pub mod fixtures;
pub mod integration;
