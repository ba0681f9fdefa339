use alloy_network::EthereumWallet;
use alloy_primitives::{Address, ChainId};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_signer_local::PrivateKeySigner;
use std::{collections::HashMap, fmt};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Error parsing or validating URLs
    #[error("Invalid RPC URL: {0}")]
    InvalidUrl(String),

    /// Error connecting to the RPC endpoint
    #[error("Connection error: {0}")]
    Connection(String),

    /// Error with private key
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// The endpoint serves a different chain than configured
    #[error("RPC endpoint serves chain {served}, expected chain {expected}")]
    ChainMismatch { expected: ChainId, served: ChainId },

    /// No client was registered for the chain
    #[error("No client configured for chain {0}")]
    UnknownChain(ChainId),
}

/// Convenience function to create an ethereum rpc provider from url.
pub async fn create_provider(rpc_url: &str) -> Result<DynProvider, ClientError> {
    let url = rpc_url
        .parse()
        .map_err(|e| ClientError::InvalidUrl(format!("{}", e)))?;
    let provider = ProviderBuilder::new().connect_http(url);

    Ok(provider.erased())
}

/// Parse a hex private key, with or without `0x` prefix.
pub fn parse_signer(private_key: &str) -> Result<PrivateKeySigner, ClientError> {
    private_key
        .trim()
        .parse()
        .map_err(|e| ClientError::InvalidPrivateKey(format!("{}", e)))
}

/// Create a provider with wallet signing capability.
pub fn create_wallet_provider(
    rpc_url: &str,
    signer: PrivateKeySigner,
) -> Result<DynProvider, ClientError> {
    let url = rpc_url
        .parse()
        .map_err(|e| ClientError::InvalidUrl(format!("{}", e)))?;

    let wallet = EthereumWallet::from(signer);

    let provider = ProviderBuilder::new().wallet(wallet).connect_http(url);

    Ok(provider.erased())
}

/// Signing access to one chain.
///
/// The provider carries the account's wallet, so it both reads state and
/// sends transactions as [`ChainClient::signer`].
#[derive(Clone)]
pub struct ChainClient {
    chain_id: ChainId,
    provider: DynProvider,
    signer: Address,
}

impl ChainClient {
    /// Connect to `rpc_url` and check it serves `chain_id`.
    pub async fn connect(
        chain_id: ChainId,
        rpc_url: &str,
        signer: PrivateKeySigner,
    ) -> Result<Self, ClientError> {
        let address = signer.address();
        let provider = create_wallet_provider(rpc_url, signer)?;
        let client = Self::new(chain_id, provider, address);
        client.verify_chain_id().await?;

        info!(chain_id, signer = %address, "Connected to chain");
        Ok(client)
    }

    /// Wrap an existing provider without contacting the endpoint.
    pub const fn new(chain_id: ChainId, provider: DynProvider, signer: Address) -> Self {
        Self {
            chain_id,
            provider,
            signer,
        }
    }

    pub const fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub const fn provider(&self) -> &DynProvider {
        &self.provider
    }

    pub const fn signer(&self) -> Address {
        self.signer
    }

    /// Ask the endpoint for its chain id and compare with the configured one.
    pub async fn verify_chain_id(&self) -> Result<(), ClientError> {
        let served = self
            .provider
            .get_chain_id()
            .await
            .map_err(|e| ClientError::Connection(format!("{}", e)))?;

        if served != self.chain_id {
            return Err(ClientError::ChainMismatch {
                expected: self.chain_id,
                served,
            });
        }

        Ok(())
    }
}

impl fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainClient")
            .field("chain_id", &self.chain_id)
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

/// Connected chains, keyed by chain id.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    chains: HashMap<ChainId, ChainClient>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client, replacing any previous one for the same chain.
    pub fn insert(&mut self, client: ChainClient) -> Option<ChainClient> {
        self.chains.insert(client.chain_id(), client)
    }

    pub fn chain(&self, chain_id: ChainId) -> Result<&ChainClient, ClientError> {
        self.chains
            .get(&chain_id)
            .ok_or(ClientError::UnknownChain(chain_id))
    }
}
