//! Configuration management for tallychain

use serde::Deserialize;
use std::fs;

use crate::miner;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub mining: MiningConfig,
}

#[derive(Debug, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default)]
    pub bootstrap_peers: Vec<String>,
    #[serde(default = "default_peer_timeout_secs")]
    pub peer_timeout_secs: u64,
    /// Seconds between background reconciliation sweeps; 0 disables them.
    #[serde(default)]
    pub reconcile_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MiningConfig {
    #[serde(default = "default_difficulty")]
    pub difficulty: usize,
    #[serde(default = "default_reward_amount")]
    pub reward_amount: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            bootstrap_peers: Vec::new(),
            peer_timeout_secs: default_peer_timeout_secs(),
            reconcile_interval_secs: 0,
        }
    }
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            reward_amount: default_reward_amount(),
        }
    }
}

fn default_api_port() -> u16 {
    5000
}

fn default_peer_timeout_secs() -> u64 {
    3
}

fn default_difficulty() -> usize {
    miner::DEFAULT_DIFFICULTY
}

fn default_reward_amount() -> f64 {
    1.0
}

pub fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    let config_str = fs::read_to_string("config.toml").unwrap_or_default();
    let config: Config = if config_str.is_empty() {
        // Provide sane defaults when config.toml is absent
        Config {
            network: NetworkConfig::default(),
            mining: MiningConfig::default(),
        }
    } else {
        toml::from_str(&config_str)?
    };

    // Validate critical values
    if config.mining.difficulty == 0 || config.mining.difficulty > 64 {
        return Err("mining.difficulty must be between 1 and 64".into());
    }

    if config.network.peer_timeout_secs == 0 {
        return Err("network.peer_timeout_secs must be at least 1".into());
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.network.api_port, 5000);
        assert_eq!(config.network.peer_timeout_secs, 3);
        assert_eq!(config.network.reconcile_interval_secs, 0);
        assert!(config.network.bootstrap_peers.is_empty());
        assert_eq!(config.mining.difficulty, miner::DEFAULT_DIFFICULTY);
        assert_eq!(config.mining.reward_amount, 1.0);
    }

    #[test]
    fn test_partial_override() {
        let config: Config = toml::from_str(
            r#"
            [network]
            api_port = 5001
            bootstrap_peers = ["127.0.0.1:5000"]

            [mining]
            difficulty = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.network.api_port, 5001);
        assert_eq!(config.network.bootstrap_peers, vec!["127.0.0.1:5000"]);
        assert_eq!(config.network.peer_timeout_secs, 3);
        assert_eq!(config.mining.difficulty, 2);
        assert_eq!(config.mining.reward_amount, 1.0);
    }
}
