//! EIP-1559 Property-Based Invariant Tests
//!
//! Uses proptest to verify fee market invariants across:
//! - Base fee adjustment bounds and direction
//! - Fee payment, burn and supply accounting
//! - Validator and executor agreement

pub mod economic_invariants;
