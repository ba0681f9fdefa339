use crate::{PendingTransaction, TokenCapability};
use alloy_primitives::{Address, ChainId, U256};
use alloy_provider::Provider;
use binding::token::IERC20;
use eyre::Result;
use tracing::debug;

/// ERC20 access through a provider bound to one chain.
///
/// Approvals are sent through the provider, so it must carry a wallet.
#[derive(Debug, Clone)]
pub struct Erc20<P> {
    provider: P,
    chain_id: ChainId,
}

impl<P> Erc20<P>
where
    P: Provider + Clone,
{
    pub const fn new(provider: P, chain_id: ChainId) -> Self {
        Self { provider, chain_id }
    }

    pub const fn chain_id(&self) -> ChainId {
        self.chain_id
    }
}

impl<P> TokenCapability for Erc20<P>
where
    P: Provider + Clone,
{
    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256> {
        debug!(chain_id = self.chain_id, %token, %owner, "Querying token balance");

        let contract = IERC20::new(token, &self.provider);
        let balance = contract.balanceOf(owner).call().await?;
        Ok(balance)
    }

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        debug!(chain_id = self.chain_id, %token, %owner, %spender, "Querying token allowance");

        let contract = IERC20::new(token, &self.provider);
        let allowance = contract.allowance(owner, spender).call().await?;
        Ok(allowance)
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<PendingTransaction> {
        let contract = IERC20::new(token, &self.provider);
        let tx = contract.approve(spender, amount).send().await?;
        let tx_hash = *tx.tx_hash();

        debug!(
            chain_id = self.chain_id,
            %token,
            %spender,
            %amount,
            %tx_hash,
            "Approval submitted"
        );

        Ok(PendingTransaction::new(self.chain_id, tx_hash))
    }
}
