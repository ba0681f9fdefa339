//! On-chain capabilities a withdrawal is built from.
//!
//! This crate defines the two contract-facing interfaces the withdrawal
//! orchestrator drives, token access and bridge adapter submission, plus
//! provider-backed implementations of both. Every submission returns a
//! [`PendingTransaction`] that still has to be confirmed by the caller.

pub mod bridge;
pub mod token;

pub use bridge::BridgeAdapterClient;
pub use token::Erc20;

use alloy_primitives::{Address, Bytes, ChainId, TxHash, U256};
use std::{fmt, future::Future};

/// A transaction accepted by a chain's RPC but not yet confirmed.
///
/// Deliberately neither `Clone` nor `Copy`: it is handed to a confirmer
/// exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct PendingTransaction {
    /// Chain the transaction was submitted to
    pub chain_id: ChainId,
    /// Transaction hash
    pub tx_hash: TxHash,
}

impl PendingTransaction {
    pub const fn new(chain_id: ChainId, tx_hash: TxHash) -> Self {
        Self { chain_id, tx_hash }
    }
}

impl fmt::Display for PendingTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on chain {}", self.tx_hash, self.chain_id)
    }
}

/// A contract identified by chain and address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContractRef {
    pub chain_id: ChainId,
    pub address: Address,
}

impl ContractRef {
    pub const fn new(chain_id: ChainId, address: Address) -> Self {
        Self { chain_id, address }
    }
}

impl fmt::Display for ContractRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.address, self.chain_id)
    }
}

/// Fungible token being withdrawn.
pub type TokenRef = ContractRef;

/// Adapter contract accepting withdrawals.
pub type BridgeAdapterRef = ContractRef;

/// Read and approve access to ERC20 tokens on a single chain.
pub trait TokenCapability: Send + Sync {
    /// Balance of `owner`.
    fn balance_of(
        &self,
        token: Address,
        owner: Address,
    ) -> impl Future<Output = eyre::Result<U256>> + Send;

    /// Amount `spender` may move on behalf of `owner`.
    fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> impl Future<Output = eyre::Result<U256>> + Send;

    /// Submit an approval of `amount` for `spender`, signed by the account
    /// this capability is bound to.
    fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> impl Future<Output = eyre::Result<PendingTransaction>> + Send;
}

/// Everything a bridge adapter needs to send a token to the remote chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalCall {
    /// Adapter contract on the local chain
    pub adapter: Address,
    /// Token on the local chain
    pub local_token: Address,
    /// Token on the remote chain, adapter interpreted (zero if unused)
    pub remote_token: Address,
    /// Receiver on the remote chain
    pub recipient: Address,
    /// Amount in base units
    pub amount: U256,
    /// Opaque adapter specific payload
    pub extension_data: Bytes,
}

/// Withdrawal submission through a bridge adapter on a single chain.
pub trait BridgeAdapterCapability: Send + Sync {
    /// Submit the withdrawal, signed by the account this capability is bound to.
    fn submit_withdrawal(
        &self,
        call: WithdrawalCall,
    ) -> impl Future<Output = eyre::Result<PendingTransaction>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256};

    #[test]
    fn test_pending_transaction_display() {
        let pending = PendingTransaction::new(
            10,
            b256!("1111111111111111111111111111111111111111111111111111111111111111"),
        );

        let desc = pending.to_string();
        assert!(desc.contains("1111111111111111111111111111111111111111111111111111111111111111"));
        assert!(desc.ends_with("on chain 10"));
    }

    #[test]
    fn test_contract_ref_display() {
        let token = TokenRef::new(
            11155420,
            address!("5CFFA347b0aE99cc01E5c01714cA5658e54a23D1"),
        );

        assert_eq!(
            token.to_string().to_lowercase(),
            "0x5cffa347b0ae99cc01e5c01714ca5658e54a23d1@11155420"
        );
    }
}
