//! Transaction descriptors handed to the wallet for signing

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::{GasCfg, NetworkCfg};
use crate::domain::balance::{clamp_to_precision, float_precision, parse_number};
use crate::domain::precision::PrecisionTable;
use crate::infrastructure::chain::ChainClient;
use crate::shared::types::Account;
use super::capability::{gas_capability, Capability};
use super::local::token_details;

/// Time-to-live of every user transaction, in seconds
pub const TX_TTL: u64 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasSettings {
    pub gas_station: bool,
    pub gas_limit: u64,
    pub gas_price: f64,
}

impl From<&GasCfg> for GasSettings {
    fn from(cfg: &GasCfg) -> Self {
        Self {
            gas_station: cfg.gas_station,
            gas_limit: cfg.limit,
            gas_price: cfg.price,
        }
    }
}

/// Unsigned transaction: code, capabilities and metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDescriptor {
    pub pact_code: String,
    pub caps: Vec<Capability>,
    pub sender: String,
    pub gas_limit: u64,
    pub gas_price: f64,
    pub chain_id: String,
    pub ttl: u64,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub env_data: Map<String, Value>,
    pub signing_pub_key: String,
    pub network_id: String,
}

impl TransactionDescriptor {
    pub fn capability_names(&self) -> Vec<&str> {
        self.caps.iter().map(Capability::name).collect()
    }
}

/// Amount clamped to a token's precision: the literal goes into Pact code,
/// the value into capability arguments
#[derive(Debug, Clone, PartialEq)]
pub struct ClampedAmount {
    pub literal: String,
    pub value: f64,
}

/// Everything a builder needs besides the user's input
#[derive(Clone, Copy)]
pub struct CommandContext<'a> {
    pub chain: &'a dyn ChainClient,
    pub network: &'a NetworkCfg,
    pub precision: &'a PrecisionTable,
}

impl<'a> CommandContext<'a> {
    pub fn new(chain: &'a dyn ChainClient, network: &'a NetworkCfg, precision: &'a PrecisionTable) -> Self {
        Self {
            chain,
            network,
            precision,
        }
    }

    /// Use the caller's key material when present, otherwise look the
    /// account up on `token_code`. `None` when the lookup does not succeed.
    pub async fn resolve_account(&self, token_code: &str, account: &Account) -> Option<Account> {
        if account.guard.is_some() {
            return Some(account.clone());
        }
        match token_details(self.chain, token_code, &account.account).await.data() {
            Some(resolved) if resolved.guard.is_some() => Some(resolved),
            Some(_) => {
                warn!("⚠️ Account {} has no guard on {}", account.account, token_code);
                None
            }
            None => {
                warn!("⚠️ Could not resolve account {} on {}", account.account, token_code);
                None
            }
        }
    }

    /// Clamp `amount`'s fractional digits to the precision configured for
    /// `token_code`. Unknown tokens are not clamped.
    pub fn clamp_amount(&self, token_code: &str, amount: f64) -> ClampedAmount {
        let max_places = self
            .precision
            .by_code(token_code)
            .unwrap_or(float_precision(amount) as u32);
        let literal = clamp_to_precision(amount, max_places);
        ClampedAmount {
            value: parse_number(&literal),
            literal,
        }
    }

    pub fn sender(&self, account: &Account, gas: &GasSettings) -> String {
        if gas.gas_station {
            self.network.gas_station_account.clone()
        } else {
            account.account.clone()
        }
    }

    /// Assemble the descriptor: gas capability first, then `domain_caps`
    pub fn descriptor(
        &self,
        account: &Account,
        pact_code: String,
        domain_caps: Vec<Capability>,
        env_data: Map<String, Value>,
        gas: &GasSettings,
    ) -> Option<TransactionDescriptor> {
        let Some(signing_pub_key) = account.signing_key() else {
            warn!("⚠️ Account {} has no signing key", account.account);
            return None;
        };

        let mut caps = Vec::with_capacity(domain_caps.len() + 1);
        caps.push(gas_capability(self.network, gas.gas_station));
        caps.extend(domain_caps);

        let descriptor = TransactionDescriptor {
            pact_code,
            caps,
            sender: self.sender(account, gas),
            gas_limit: gas.gas_limit,
            gas_price: gas.gas_price,
            chain_id: self.network.chain_id.clone(),
            ttl: TX_TTL,
            env_data,
            signing_pub_key: signing_pub_key.to_string(),
            network_id: self.network.network_id.clone(),
        };
        debug!("built descriptor with caps {:?}", descriptor.capability_names());
        Some(descriptor)
    }
}

/// `envData` carrying the account keyset as `user-ks`
pub fn keyset_env(account: &Account) -> Map<String, Value> {
    let mut env = Map::new();
    if let Some(guard) = &account.guard {
        env.insert(
            "user-ks".to_string(),
            serde_json::to_value(guard).unwrap_or(Value::Null),
        );
    }
    env
}
