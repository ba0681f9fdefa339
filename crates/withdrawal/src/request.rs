use crate::WithdrawalError;
use alloy_primitives::{Address, Bytes, ChainId, U256};
use capability::{BridgeAdapterRef, TokenRef, WithdrawalCall};

/// Everything needed to withdraw a token from an L2.
///
/// Built once by the caller and never mutated; the same `amount` is used for
/// the balance check, the approval, the allowance check and the withdrawal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalRequest {
    chain_id: ChainId,
    adapter: BridgeAdapterRef,
    token: TokenRef,
    recipient: Address,
    amount: U256,
    remote_token: Address,
    extension_data: Bytes,
}

impl WithdrawalRequest {
    /// Withdraw `amount` of `token` on L2 `chain_id` to `recipient` on L1
    /// through `adapter`.
    pub fn new(
        chain_id: ChainId,
        adapter: Address,
        token: Address,
        recipient: Address,
        amount: U256,
    ) -> Self {
        Self::from_refs(
            chain_id,
            BridgeAdapterRef::new(chain_id, adapter),
            TokenRef::new(chain_id, token),
            recipient,
            amount,
        )
    }

    /// Same as [`Self::new`] with explicit contract references.
    pub fn from_refs(
        chain_id: ChainId,
        adapter: BridgeAdapterRef,
        token: TokenRef,
        recipient: Address,
        amount: U256,
    ) -> Self {
        Self {
            chain_id,
            adapter,
            token,
            recipient,
            amount,
            remote_token: Address::ZERO,
            extension_data: Bytes::new(),
        }
    }

    /// Set the token address on L1, for adapters that need it.
    pub fn with_remote_token(mut self, remote_token: Address) -> Self {
        self.remote_token = remote_token;
        self
    }

    /// Set the opaque adapter specific payload.
    pub fn with_extension_data(mut self, extension_data: Bytes) -> Self {
        self.extension_data = extension_data;
        self
    }

    pub const fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub const fn adapter(&self) -> BridgeAdapterRef {
        self.adapter
    }

    pub const fn token(&self) -> TokenRef {
        self.token
    }

    pub const fn recipient(&self) -> Address {
        self.recipient
    }

    pub const fn amount(&self) -> U256 {
        self.amount
    }

    pub const fn remote_token(&self) -> Address {
        self.remote_token
    }

    pub const fn extension_data(&self) -> &Bytes {
        &self.extension_data
    }

    /// Check the request can be executed on `chain_id`.
    pub(crate) fn validate(&self, chain_id: ChainId) -> Result<(), WithdrawalError> {
        let invalid = |reason: String| Err(WithdrawalError::InvalidRequest(reason));

        if self.chain_id != chain_id {
            return invalid(format!(
                "request targets chain {}, orchestrator is bound to chain {}",
                self.chain_id, chain_id
            ));
        }

        if self.token.chain_id != chain_id {
            return invalid(format!("token {} is not on chain {}", self.token, chain_id));
        }

        if self.adapter.chain_id != chain_id {
            return invalid(format!(
                "bridge adapter {} is not on chain {}",
                self.adapter, chain_id
            ));
        }

        if self.amount == U256::ZERO {
            return invalid("amount must not be zero".to_string());
        }

        if self.token.address == Address::ZERO {
            return invalid("token must not be zero".to_string());
        }

        if self.adapter.address == Address::ZERO {
            return invalid("bridge adapter must not be zero".to_string());
        }

        if self.recipient == Address::ZERO {
            return invalid("recipient must not be zero".to_string());
        }

        Ok(())
    }

    /// Adapter call sending exactly `amount` to `recipient`.
    pub(crate) fn withdrawal_call(&self) -> WithdrawalCall {
        WithdrawalCall {
            adapter: self.adapter.address,
            local_token: self.token.address,
            remote_token: self.remote_token,
            recipient: self.recipient,
            amount: self.amount,
            extension_data: self.extension_data.clone(),
        }
    }
}
