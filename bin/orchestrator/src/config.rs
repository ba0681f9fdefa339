use ::config::{ChainConfigBuilder, ConfirmationPolicy, PolicyOverrides};
use alloy_primitives::ChainId;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level withdrawal configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Chains we can connect to
    pub chains: Vec<ChainEntry>,
}

/// One `[[chains]]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainEntry {
    /// Chain ID the endpoint must serve
    pub chain_id: ChainId,

    /// RPC endpoint url
    pub rpc_url: String,

    /// Confirmation policy overrides on top of the chain preset
    #[serde(flatten)]
    pub overrides: PolicyOverrides,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;

        Ok(config)
    }

    pub fn chain(&self, chain_id: ChainId) -> eyre::Result<&ChainEntry> {
        self.chains
            .iter()
            .find(|entry| entry.chain_id == chain_id)
            .ok_or_else(|| eyre::eyre!("chain {} is not configured", chain_id))
    }

    /// Preset policy for `chain_id` with the configured overrides applied.
    pub fn policy(&self, chain_id: ChainId) -> ConfirmationPolicy {
        let builder = ChainConfigBuilder::for_chain(chain_id);
        let builder = match self.chains.iter().find(|entry| entry.chain_id == chain_id) {
            Some(entry) => builder.overrides(&entry.overrides),
            None => builder,
        };

        builder.build().policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::config::ChainConfig;
    use std::time::Duration;

    const CONFIG: &str = r#"
        [[chains]]
        chain_id = 11155420
        rpc_url = "https://sepolia.optimism.io"
        confirmations = 5

        [[chains]]
        chain_id = 11155111
        rpc_url = "https://ethereum-sepolia-rpc.publicnode.com"
    "#;

    #[test]
    fn test_parse_chains() {
        let config: Config = toml::from_str(CONFIG).unwrap();

        assert_eq!(config.chains.len(), 2);
        let entry = config.chain(11155420).unwrap();
        assert_eq!(entry.rpc_url, "https://sepolia.optimism.io");
        assert_eq!(entry.overrides.confirmations, Some(5));
        assert_eq!(entry.overrides.timeout_secs, None);
        assert!(config.chain(10).is_err());
    }

    #[test]
    fn test_policy_applies_overrides() {
        let config: Config = toml::from_str(CONFIG).unwrap();
        let preset = ChainConfig::optimism_sepolia().policy;

        let policy = config.policy(11155420);
        assert_eq!(policy.confirmations, 5);
        assert_eq!(policy.poll_interval, preset.poll_interval);
        assert_eq!(policy.timeout, preset.timeout);
    }

    #[test]
    fn test_policy_without_overrides_is_preset() {
        let config: Config = toml::from_str(CONFIG).unwrap();
        assert_eq!(config.policy(11155111), ChainConfig::sepolia().policy);
    }

    #[test]
    fn test_unconfigured_chain_is_conservative() {
        let config = Config { chains: Vec::new() };
        let policy = config.policy(424242);
        assert_eq!(policy, ConfirmationPolicy::conservative());
        assert_eq!(policy.timeout, Duration::from_secs(15 * 60));
    }
}
