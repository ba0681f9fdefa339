use crate::{BridgeAdapterCapability, PendingTransaction, WithdrawalCall};
use alloy_primitives::ChainId;
use alloy_provider::Provider;
use binding::bridge::IBridgeAdapter;
use tracing::debug;

/// Bridge adapter access through a provider bound to one chain.
///
/// The provider must carry the wallet of the account whose tokens are sent.
#[derive(Debug, Clone)]
pub struct BridgeAdapterClient<P> {
    provider: P,
    chain_id: ChainId,
}

impl<P> BridgeAdapterClient<P>
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

impl<P> BridgeAdapterCapability for BridgeAdapterClient<P>
where
    P: Provider + Clone,
{
    async fn submit_withdrawal(&self, call: WithdrawalCall) -> eyre::Result<PendingTransaction> {
        let adapter = IBridgeAdapter::new(call.adapter, &self.provider);

        // No value attached: ERC20 adapters reject native value.
        let tx = adapter
            .sendERC20(
                call.local_token,
                call.remote_token,
                call.recipient,
                call.amount,
                call.extension_data,
            )
            .send()
            .await?;
        let tx_hash = *tx.tx_hash();

        debug!(
            chain_id = self.chain_id,
            adapter = %call.adapter,
            token = %call.local_token,
            recipient = %call.recipient,
            amount = %call.amount,
            %tx_hash,
            "Withdrawal submitted"
        );

        Ok(PendingTransaction::new(self.chain_id, tx_hash))
    }
}
