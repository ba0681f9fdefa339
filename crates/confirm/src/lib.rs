//! Blocking confirmation of submitted transactions.
//!
//! A [`Confirmer`] takes a [`PendingTransaction`] and suspends the caller
//! until the transaction is buried deep enough for its chain's
//! [`ConfirmationPolicy`](config::ConfirmationPolicy), it reverts, the policy
//! timeout elapses or the caller cancels.

pub mod cancel;
pub mod poll;

pub use cancel::{cancellation, CancelHandle, Cancellation};
pub use poll::{PollingConfirmer, ReceiptSource, ReceiptStatus, RpcReceipts};

use alloy_primitives::{ChainId, TxHash};
use capability::PendingTransaction;
use std::{future::Future, time::Duration};
use thiserror::Error;

/// A transaction that reached its chain's confirmation depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Chain the transaction was mined on
    pub chain_id: ChainId,
    /// Transaction hash
    pub tx_hash: TxHash,
    /// Block number where transaction was included
    pub block_number: u64,
    /// Gas used
    pub gas_used: u64,
}

/// Terminal failure of a confirmation wait.
#[derive(Error, Debug)]
pub enum ConfirmationError {
    /// The transaction was mined but execution failed.
    #[error("transaction {tx_hash} reverted in block {block_number}")]
    Reverted { tx_hash: TxHash, block_number: u64 },

    /// The caller gave up waiting.
    #[error("confirmation of transaction {tx_hash} was cancelled")]
    Cancelled { tx_hash: TxHash },

    /// The policy timeout elapsed first.
    #[error("transaction {tx_hash} not confirmed after {timeout:?}")]
    Timeout { tx_hash: TxHash, timeout: Duration },

    /// The transaction was handed to a confirmer serving another chain.
    #[error("transaction {tx_hash} was submitted on chain {submitted}, confirmer serves chain {served}")]
    ChainMismatch {
        tx_hash: TxHash,
        submitted: ChainId,
        served: ChainId,
    },

    /// The chain could not be polled, even after retrying.
    #[error("failed to poll chain {chain_id} for transaction {tx_hash}")]
    Rpc {
        chain_id: ChainId,
        tx_hash: TxHash,
        #[source]
        source: eyre::Report,
    },
}

impl ConfirmationError {
    /// Hash of the transaction the wait was for.
    pub const fn tx_hash(&self) -> TxHash {
        match self {
            Self::Reverted { tx_hash, .. }
            | Self::Cancelled { tx_hash }
            | Self::Timeout { tx_hash, .. }
            | Self::ChainMismatch { tx_hash, .. }
            | Self::Rpc { tx_hash, .. } => *tx_hash,
        }
    }

    /// Whether the wait ended because the caller cancelled it.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Waits for submitted transactions to be confirmed.
pub trait Confirmer: Send + Sync {
    /// Block until `pending` is confirmed or a terminal failure is observed.
    ///
    /// Consumes the pending transaction; the outcome is final.
    fn confirm(
        &self,
        pending: PendingTransaction,
        cancel: &Cancellation,
    ) -> impl Future<Output = Result<Receipt, ConfirmationError>> + Send;
}
