use crate::{Step, WithdrawalError, WithdrawalRequest};
use alloy_primitives::{Address, ChainId, U256};
use capability::{BridgeAdapterCapability, PendingTransaction, TokenCapability};
use confirm::{Cancellation, Confirmer, Receipt};
use tracing::{debug, info, warn};

/// The signing account on the L2. Its key lives in the injected capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Account {
    pub chain_id: ChainId,
    pub address: Address,
}

impl Account {
    pub const fn new(chain_id: ChainId, address: Address) -> Self {
        Self { chain_id, address }
    }
}

/// Confirmed transactions of a completed withdrawal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalReceipt {
    pub approval: Receipt,
    pub withdrawal: Receipt,
}

/// Read-only view of a request's preconditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preflight {
    pub balance: U256,
    pub allowance: U256,
    pub requested: U256,
}

impl Preflight {
    /// Whether the balance check would pass.
    pub fn has_sufficient_balance(&self) -> bool {
        self.balance >= self.requested
    }

    /// Whether the adapter already holds enough allowance. The orchestrator
    /// approves regardless.
    pub fn is_approved(&self) -> bool {
        self.allowance >= self.requested
    }
}

/// Executes guarded withdrawals for one account on one L2.
///
/// All handles are resolved by the caller and bound to the account's chain:
/// `token` and `bridge` sign with the account's key, `confirmer` reads the
/// same chain.
pub struct Orchestrator<T, B, C> {
    account: Account,
    token: T,
    bridge: B,
    confirmer: C,
}

impl<T, B, C> Orchestrator<T, B, C>
where
    T: TokenCapability,
    B: BridgeAdapterCapability,
    C: Confirmer,
{
    pub const fn new(account: Account, token: T, bridge: B, confirmer: C) -> Self {
        Self {
            account,
            token,
            bridge,
            confirmer,
        }
    }

    pub const fn account(&self) -> Account {
        self.account
    }

    /// Read balance and current allowance without submitting anything.
    pub async fn preflight(
        &self,
        request: &WithdrawalRequest,
    ) -> Result<Preflight, WithdrawalError> {
        request.validate(self.account.chain_id)?;

        let balance = self.balance(request).await?;
        let allowance = self.allowance(request).await?;

        Ok(Preflight {
            balance,
            allowance,
            requested: request.amount(),
        })
    }

    /// Run the guarded withdrawal.
    ///
    /// Steps run strictly in order and each transaction is confirmed before
    /// the next step begins. The first failure aborts the run. `cancel` is
    /// honored while waiting for confirmations and before each submission.
    pub async fn execute(
        &self,
        request: &WithdrawalRequest,
        cancel: &Cancellation,
    ) -> Result<WithdrawalReceipt, WithdrawalError> {
        request.validate(self.account.chain_id)?;

        let amount = request.amount();
        let token = request.token().address;
        let adapter = request.adapter().address;

        info!(
            chain_id = self.account.chain_id,
            account = %self.account.address,
            %token,
            %adapter,
            recipient = %request.recipient(),
            %amount,
            "Starting withdrawal"
        );

        let balance = self.balance(request).await?;
        if balance < amount {
            warn!(%balance, %amount, "Not enough balance to withdraw");
            return Err(WithdrawalError::InsufficientBalance {
                balance,
                requested: amount,
            });
        }

        ensure_not_cancelled(Step::Approve, cancel)?;
        let pending = self
            .token
            .approve(token, adapter, amount)
            .await
            .map_err(|source| WithdrawalError::SubmissionFailed {
                step: Step::Approve,
                source,
            })?;
        let approval = self.confirm(Step::Approve, pending, cancel).await?;

        let allowance = self.allowance(request).await?;
        if allowance < amount {
            warn!(%allowance, %amount, "Approval did not take effect");
            return Err(WithdrawalError::ApprovalMismatch {
                allowance,
                requested: amount,
            });
        }

        ensure_not_cancelled(Step::Withdraw, cancel)?;
        let pending = self
            .bridge
            .submit_withdrawal(request.withdrawal_call())
            .await
            .map_err(|source| WithdrawalError::SubmissionFailed {
                step: Step::Withdraw,
                source,
            })?;
        let withdrawal = self.confirm(Step::Withdraw, pending, cancel).await?;

        info!(
            approval_tx = %approval.tx_hash,
            withdrawal_tx = %withdrawal.tx_hash,
            block_number = withdrawal.block_number,
            %amount,
            "Withdrawal initiated."
        );

        Ok(WithdrawalReceipt {
            approval,
            withdrawal,
        })
    }

    async fn balance(&self, request: &WithdrawalRequest) -> Result<U256, WithdrawalError> {
        let balance = self
            .token
            .balance_of(request.token().address, self.account.address)
            .await
            .map_err(|source| WithdrawalError::QueryFailed {
                step: Step::Balance,
                source,
            })?;

        debug!(%balance, "Token balance");
        Ok(balance)
    }

    async fn allowance(&self, request: &WithdrawalRequest) -> Result<U256, WithdrawalError> {
        let allowance = self
            .token
            .allowance(
                request.token().address,
                self.account.address,
                request.adapter().address,
            )
            .await
            .map_err(|source| WithdrawalError::QueryFailed {
                step: Step::Allowance,
                source,
            })?;

        debug!(%allowance, "Adapter allowance");
        Ok(allowance)
    }

    async fn confirm(
        &self,
        step: Step,
        pending: PendingTransaction,
        cancel: &Cancellation,
    ) -> Result<Receipt, WithdrawalError> {
        info!(%step, tx_hash = %pending.tx_hash, "Waiting for confirmation");

        self.confirmer
            .confirm(pending, cancel)
            .await
            .map_err(|source| {
                warn!(%step, error = %source, "Transaction did not confirm");
                WithdrawalError::TransactionFailed { step, source }
            })
    }
}

fn ensure_not_cancelled(step: Step, cancel: &Cancellation) -> Result<(), WithdrawalError> {
    if cancel.is_cancelled() {
        warn!(%step, "Cancelled before submission");
        return Err(WithdrawalError::Cancelled { step });
    }
    Ok(())
}
