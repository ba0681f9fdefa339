//! Configuration types for guarded withdrawals.
//!
//! This crate provides:
//! - Per-chain confirmation policies
//! - Presets for the networks we withdraw from and to
//! - Overrides loaded from configuration files

pub mod chain;

pub use chain::{ChainConfig, ChainConfigBuilder, ConfirmationPolicy, PolicyOverrides};
