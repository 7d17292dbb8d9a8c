//! End-to-End Test Framework for the AMM client
//!
//! Builds a complete client (session, cache, workflows) over the in-memory
//! chain and wallet from `dex-client`'s `test-utils` feature, with one
//! deployment on Base.

pub mod fixtures;

pub use fixtures::*;
