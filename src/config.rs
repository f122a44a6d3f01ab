use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use crate::shared::errors::ConfigError;

pub const DEFAULT_NODE_URL: &str = "https://api.chainweb.com";
pub const DEFAULT_NETWORK_ID: &str = "mainnet01";
pub const DEFAULT_CHAIN_ID: &str = "2";
pub const DEFAULT_NAMESPACE: &str = "kaddex";
pub const GAS_STATION_ACCOUNT: &str = "kaddex-free-gas";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkCfg {
    pub node_url: String,
    pub network_id: String,
    pub chain_id: String,
    pub namespace: String,
    #[serde(default = "default_gas_station_account")]
    pub gas_station_account: String,
    /// Seconds subtracted from "now" for command creation time
    #[serde(default = "default_creation_time_offset")]
    pub creation_time_offset_secs: i64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_gas_station_account() -> String {
    GAS_STATION_ACCOUNT.to_string()
}

fn default_creation_time_offset() -> i64 {
    15
}

fn default_request_timeout() -> u64 {
    30_000
}

impl NetworkCfg {
    /// Pact API base for a chain, e.g. `https://api.chainweb.com/chainweb/0.0/mainnet01/chain/2/pact`
    pub fn pact_url(&self, chain_id: &str) -> String {
        format!(
            "{}/chainweb/0.0/{}/chain/{}/pact",
            self.node_url.trim_end_matches('/'),
            self.network_id,
            chain_id
        )
    }

    /// Fully qualified module or capability name inside the DEX namespace
    pub fn qualified(&self, name: &str) -> String {
        format!("{}.{}", self.namespace, name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasCfg {
    pub limit: u64,
    pub price: f64,
    pub gas_station: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsCfg {
    pub base_url: Option<String>,
    #[serde(default = "default_apr_fee")]
    pub apr_fee: f64,
    #[serde(default = "default_staking_rewards_percent")]
    pub staking_rewards_percent: f64,
}

fn default_apr_fee() -> f64 {
    0.0025
}

fn default_staking_rewards_percent() -> f64 {
    0.05
}

impl Default for AnalyticsCfg {
    fn default() -> Self {
        Self {
            base_url: None,
            apr_fee: default_apr_fee(),
            staking_rewards_percent: default_staking_rewards_percent(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenCfg {
    pub name: String,
    pub code: String,
    pub precision: u32,
    /// Token id used by the analytics service, e.g. `kaddex.kdx`
    #[serde(default)]
    pub stats_id: Option<String>,
}

impl TokenCfg {
    pub fn stats_id(&self) -> &str {
        self.stats_id.as_deref().unwrap_or(&self.code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairCfg {
    /// `token0:token1` using token codes
    pub name: String,
    pub token0: String,
    pub token1: String,
    #[serde(default)]
    pub is_boosted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub network: NetworkCfg,
    pub gas: GasCfg,
    #[serde(default)]
    pub analytics: AnalyticsCfg,
    #[serde(default)]
    pub tokens: Vec<TokenCfg>,
    #[serde(default)]
    pub pairs: Vec<PairCfg>,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path.as_ref())
            .with_context(|| format!("read {}", path.as_ref().display()))?;
        Self::from_toml(&s)
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(s).context("parse Config.toml")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.chain_id.parse::<u32>().is_err() {
            return Err(ConfigError::InvalidNetwork(format!(
                "chain_id must be numeric, got {:?}",
                self.network.chain_id
            )));
        }
        if self.network.namespace.is_empty() {
            return Err(ConfigError::InvalidNetwork("namespace is empty".to_string()));
        }
        for pair in &self.pairs {
            let expected = format!("{}:{}", pair.token0, pair.token1);
            if pair.name != expected {
                return Err(ConfigError::InvalidPair(pair.name.clone()));
            }
            for code in [&pair.token0, &pair.token1] {
                if self.token_by_code(code).is_none() {
                    return Err(ConfigError::UnknownToken(code.clone()));
                }
            }
        }
        Ok(())
    }

    pub fn token(&self, name: &str) -> Result<&TokenCfg, ConfigError> {
        self.tokens
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ConfigError::UnknownToken(name.to_string()))
    }

    pub fn token_by_code(&self, code: &str) -> Option<&TokenCfg> {
        self.tokens.iter().find(|t| t.code == code)
    }
}

impl Default for Config {
    fn default() -> Self {
        let token = |name: &str, code: &str, precision: u32| TokenCfg {
            name: name.to_string(),
            code: code.to_string(),
            precision,
            stats_id: None,
        };
        Self {
            network: NetworkCfg {
                node_url: DEFAULT_NODE_URL.to_string(),
                network_id: DEFAULT_NETWORK_ID.to_string(),
                chain_id: DEFAULT_CHAIN_ID.to_string(),
                namespace: DEFAULT_NAMESPACE.to_string(),
                gas_station_account: default_gas_station_account(),
                creation_time_offset_secs: default_creation_time_offset(),
                request_timeout_ms: default_request_timeout(),
            },
            gas: GasCfg {
                limit: 10_000,
                price: 0.0000001,
                gas_station: false,
            },
            analytics: AnalyticsCfg::default(),
            tokens: vec![
                token("KDA", "coin", 12),
                token("KDX", "kaddex.kdx", 12),
                token("FLUX", "runonflux.flux", 8),
            ],
            pairs: vec![
                PairCfg {
                    name: "coin:kaddex.kdx".to_string(),
                    token0: "coin".to_string(),
                    token1: "kaddex.kdx".to_string(),
                    is_boosted: true,
                },
                PairCfg {
                    name: "coin:runonflux.flux".to_string(),
                    token0: "coin".to_string(),
                    token1: "runonflux.flux".to_string(),
                    is_boosted: false,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[network]
node_url = "https://api.testnet.chainweb.com/"
network_id = "testnet04"
chain_id = "1"
namespace = "kaddex"

[gas]
limit = 6000
price = 0.00000001
gas_station = true

[[tokens]]
name = "KDA"
code = "coin"
precision = 12

[[tokens]]
name = "KDX"
code = "kaddex.kdx"
precision = 12

[[pairs]]
name = "coin:kaddex.kdx"
token0 = "coin"
token1 = "kaddex.kdx"
is_boosted = true
"#;

    #[test]
    fn test_parse_config() {
        let cfg = Config::from_toml(SAMPLE).unwrap();
        assert_eq!(cfg.network.gas_station_account, GAS_STATION_ACCOUNT);
        assert_eq!(cfg.network.creation_time_offset_secs, 15);
        assert!(cfg.gas.gas_station);
        assert_eq!(cfg.tokens.len(), 2);
        assert_eq!(cfg.token("kdx").unwrap().code, "kaddex.kdx");
        assert!(cfg.analytics.base_url.is_none());
        assert_eq!(cfg.analytics.apr_fee, 0.0025);
    }

    #[test]
    fn test_pact_url() {
        let cfg = Config::from_toml(SAMPLE).unwrap();
        assert_eq!(
            cfg.network.pact_url("1"),
            "https://api.testnet.chainweb.com/chainweb/0.0/testnet04/chain/1/pact"
        );
        assert_eq!(cfg.network.qualified("staking.stake"), "kaddex.staking.stake");
    }

    #[test]
    fn test_rejects_pair_with_unknown_token() {
        let broken = SAMPLE.replace("token1 = \"kaddex.kdx\"", "token1 = \"free.nope\"");
        assert!(Config::from_toml(&broken).is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.token("KDX").unwrap().precision, 12);
    }
}
