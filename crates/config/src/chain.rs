//! Chain configuration for guarded withdrawals.
//!
//! Provides chain-specific confirmation policies for the networks we withdraw
//! from (OP Stack L2s) and to (Ethereum), plus a conservative fallback for
//! anything else.

use alloy_primitives::ChainId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long to wait for a submitted transaction and how deep it must be
/// buried before it counts as confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    /// Blocks including the one the transaction was mined in. Never below 1.
    pub confirmations: u64,
    /// Delay between receipt polls
    pub poll_interval: Duration,
    /// Upper bound on the whole wait
    pub timeout: Duration,
}

impl ConfirmationPolicy {
    /// Fallback policy for chains without a preset.
    pub const fn conservative() -> Self {
        Self {
            confirmations: 3,
            poll_interval: Duration::from_secs(4),
            timeout: Duration::from_secs(15 * 60),
        }
    }

    /// Apply optional overrides from a config file or the command line.
    pub fn with_overrides(mut self, overrides: &PolicyOverrides) -> Self {
        if let Some(confirmations) = overrides.confirmations {
            self.confirmations = confirmations.max(1);
        }
        if let Some(ms) = overrides.poll_interval_ms {
            self.poll_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = overrides.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        self
    }
}

/// Optional policy fields as they appear in configuration files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyOverrides {
    pub confirmations: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
}

/// Chain-level parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainConfig {
    /// Chain ID
    pub chain_id: ChainId,
    /// Confirmation policy for transactions submitted on this chain
    pub policy: ConfirmationPolicy,
}

impl ChainConfig {
    /// Ethereum mainnet configuration.
    pub const fn ethereum() -> Self {
        Self {
            chain_id: 1,
            policy: ConfirmationPolicy {
                confirmations: 3,
                poll_interval: Duration::from_secs(6),
                timeout: Duration::from_secs(15 * 60),
            },
        }
    }

    /// Ethereum Sepolia testnet configuration.
    pub const fn sepolia() -> Self {
        Self {
            chain_id: 11155111,
            policy: ConfirmationPolicy {
                confirmations: 2,
                poll_interval: Duration::from_secs(6),
                timeout: Duration::from_secs(15 * 60),
            },
        }
    }

    /// OP Mainnet configuration.
    pub const fn optimism() -> Self {
        Self {
            chain_id: 10,
            policy: Self::op_stack_policy(),
        }
    }

    /// OP Sepolia testnet configuration.
    pub const fn optimism_sepolia() -> Self {
        Self {
            chain_id: 11155420,
            policy: Self::op_stack_policy(),
        }
    }

    /// Unichain mainnet configuration.
    pub const fn unichain() -> Self {
        Self {
            chain_id: 130,
            policy: Self::op_stack_policy(),
        }
    }

    /// Unichain Sepolia testnet configuration.
    pub const fn unichain_sepolia() -> Self {
        Self {
            chain_id: 1301,
            policy: Self::op_stack_policy(),
        }
    }

    // Sequencer-ordered L2 blocks only reorg on sequencer faults.
    const fn op_stack_policy() -> ConfirmationPolicy {
        ConfirmationPolicy {
            confirmations: 2,
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(5 * 60),
        }
    }

    /// Preset for a known chain, or the conservative fallback.
    pub const fn for_chain(chain_id: ChainId) -> Self {
        match chain_id {
            1 => Self::ethereum(),
            11155111 => Self::sepolia(),
            10 => Self::optimism(),
            11155420 => Self::optimism_sepolia(),
            130 => Self::unichain(),
            1301 => Self::unichain_sepolia(),
            _ => Self {
                chain_id,
                policy: ConfirmationPolicy::conservative(),
            },
        }
    }
}

/// Builder for custom chain configurations.
#[derive(Debug, Clone)]
pub struct ChainConfigBuilder {
    config: ChainConfig,
}

impl ChainConfigBuilder {
    /// Start from the preset of the given chain.
    pub const fn for_chain(chain_id: ChainId) -> Self {
        Self {
            config: ChainConfig::for_chain(chain_id),
        }
    }

    /// Override required confirmations (at least 1).
    pub fn confirmations(mut self, confirmations: u64) -> Self {
        self.config.policy.confirmations = confirmations.max(1);
        self
    }

    /// Override receipt poll interval.
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.policy.poll_interval = interval;
        self
    }

    /// Override confirmation timeout.
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.config.policy.timeout = timeout;
        self
    }

    /// Apply file overrides on top of the current values.
    pub fn overrides(mut self, overrides: &PolicyOverrides) -> Self {
        self.config.policy = self.config.policy.with_overrides(overrides);
        self
    }

    /// Build the chain configuration.
    pub const fn build(self) -> ChainConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(ChainConfig::optimism().chain_id, 10);
        assert_eq!(ChainConfig::optimism_sepolia().chain_id, 11155420);
        assert_eq!(ChainConfig::ethereum().policy.confirmations, 3);
        assert_eq!(ChainConfig::for_chain(11155111), ChainConfig::sepolia());
        assert_eq!(ChainConfig::for_chain(130), ChainConfig::unichain());
    }

    #[test]
    fn test_unknown_chain_falls_back() {
        let config = ChainConfig::for_chain(424242);
        assert_eq!(config.chain_id, 424242);
        assert_eq!(config.policy, ConfirmationPolicy::conservative());
    }

    #[test]
    fn test_builder_overrides() {
        let config = ChainConfigBuilder::for_chain(10)
            .confirmations(0)
            .timeout(Duration::from_secs(30))
            .build();

        assert_eq!(config.policy.confirmations, 1);
        assert_eq!(config.policy.timeout, Duration::from_secs(30));
        assert_eq!(
            config.policy.poll_interval,
            ChainConfig::optimism().policy.poll_interval
        );
    }

    #[test]
    fn test_overrides_from_toml() {
        let overrides: PolicyOverrides = toml::from_str(
            r#"
            confirmations = 6
            poll_interval_ms = 250
            "#,
        )
        .unwrap();

        let policy = ChainConfig::sepolia().policy.with_overrides(&overrides);
        assert_eq!(policy.confirmations, 6);
        assert_eq!(policy.poll_interval, Duration::from_millis(250));
        assert_eq!(policy.timeout, ChainConfig::sepolia().policy.timeout);
    }
}
