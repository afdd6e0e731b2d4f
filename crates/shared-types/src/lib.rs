//! # Shared Types Crate
//!
//! Chain primitives used across the transaction lifecycle workspace.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Hash`, `Address`, `U256` and the receipt
//!   model are defined once here and re-exported by the subsystem crates.
//! - **Chain-agnostic**: the types describe what the supervisor observes
//!   (receipts, balances, fee parameters), not how a chain produces them.

pub mod entities;

pub use entities::*;
