//! Contract bindings for the contracts a withdrawal touches.
//!
//! - ERC20 tokens held on the L2
//! - Bridge adapters that send those tokens back to L1
//!
//! All bindings are generated using alloy's `sol!` macro.

pub mod bridge;
pub mod token;
