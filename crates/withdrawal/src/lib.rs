//! Guarded L2→L1 token withdrawal.
//!
//! The [`Orchestrator`] moves an ERC20 balance from an L2 back to L1 through a
//! bridge adapter in four guarded steps:
//!
//! 1. check the account holds at least the requested amount
//! 2. approve the adapter for exactly that amount and wait for confirmation
//! 3. re-read the allowance to make sure the approval took effect
//! 4. submit the withdrawal through the adapter and wait for confirmation
//!
//! Any failure aborts the run with a [`WithdrawalError`]. Nothing is retried
//! and nothing is persisted.

pub mod error;
pub mod orchestrator;
pub mod request;

pub use error::{Step, WithdrawalError};
pub use orchestrator::{Account, Orchestrator, Preflight, WithdrawalReceipt};
pub use request::WithdrawalRequest;
