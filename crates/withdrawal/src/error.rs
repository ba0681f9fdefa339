use alloy_primitives::U256;
use confirm::ConfirmationError;
use std::fmt;
use thiserror::Error;

/// Step of the withdrawal sequence an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Token balance check
    Balance,
    /// Approval of the bridge adapter
    Approve,
    /// Allowance re-check after approval
    Allowance,
    /// Withdrawal through the bridge adapter
    Withdraw,
}

impl Step {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Balance => "balance",
            Self::Approve => "approve",
            Self::Allowance => "allowance",
            Self::Withdraw => "withdraw",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum WithdrawalError {
    /// The request cannot be executed by this orchestrator.
    #[error("invalid withdrawal request: {0}")]
    InvalidRequest(String),

    /// Not enough tokens to withdraw. Nothing was submitted.
    #[error(
        "not enough balance to withdraw, get more tokens or request less: balance {balance}, requested {requested}"
    )]
    InsufficientBalance { balance: U256, requested: U256 },

    /// The approval confirmed but the allowance is below the requested amount.
    #[error("approval did not take effect: allowance {allowance}, requested {requested}")]
    ApprovalMismatch { allowance: U256, requested: U256 },

    /// A submitted transaction did not confirm.
    #[error("{step} transaction failed: {source}")]
    TransactionFailed {
        step: Step,
        #[source]
        source: ConfirmationError,
    },

    /// A read-only chain query failed.
    #[error("{step} query failed: {source}")]
    QueryFailed {
        step: Step,
        #[source]
        source: eyre::Report,
    },

    /// The node refused a transaction, so there is nothing to confirm.
    #[error("{step} transaction was not accepted: {source}")]
    SubmissionFailed {
        step: Step,
        #[source]
        source: eyre::Report,
    },

    /// Cancellation was requested before the step's transaction was submitted.
    #[error("cancelled before the {step} transaction was submitted")]
    Cancelled { step: Step },
}

impl WithdrawalError {
    /// Stable label for metrics and structured logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::InsufficientBalance { .. } => "insufficient_balance",
            Self::ApprovalMismatch { .. } => "approval_mismatch",
            Self::TransactionFailed { .. } => "transaction_failed",
            Self::QueryFailed { .. } => "query_failed",
            Self::SubmissionFailed { .. } => "submission_failed",
            Self::Cancelled { .. } => "cancelled",
        }
    }

    /// Step the error happened in, if it happened inside the sequence.
    pub const fn step(&self) -> Option<Step> {
        match self {
            Self::InvalidRequest(_) => None,
            Self::InsufficientBalance { .. } => Some(Step::Balance),
            Self::ApprovalMismatch { .. } => Some(Step::Allowance),
            Self::TransactionFailed { step, .. }
            | Self::QueryFailed { step, .. }
            | Self::SubmissionFailed { step, .. }
            | Self::Cancelled { step } => Some(*step),
        }
    }

    /// Whether an approval may already be on chain.
    ///
    /// Callers must inspect the allowance before retrying when this is true.
    pub const fn approval_may_be_live(&self) -> bool {
        match self {
            Self::InvalidRequest(_) | Self::InsufficientBalance { .. } => false,
            Self::QueryFailed { step, .. } => !matches!(step, Step::Balance),
            Self::Cancelled { step } => matches!(step, Step::Allowance | Step::Withdraw),
            // A refused or unconfirmed submission may still have been broadcast.
            Self::ApprovalMismatch { .. }
            | Self::TransactionFailed { .. }
            | Self::SubmissionFailed { .. } => true,
        }
    }
}
