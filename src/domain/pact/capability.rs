use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::NetworkCfg;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityRef {
    pub name: String,
    pub args: Vec<Value>,
}

/// Capability request shown to the wallet for approval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    pub role: String,
    pub description: String,
    pub cap: CapabilityRef,
}

impl Capability {
    pub fn new(role: &str, description: &str, name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            role: role.to_string(),
            description: description.to_string(),
            cap: CapabilityRef {
                name: name.into(),
                args,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.cap.name
    }
}

/// The single gas capability of a transaction: sponsored by the gas
/// station or paid by the sender
pub fn gas_capability(network: &NetworkCfg, gas_station: bool) -> Capability {
    if gas_station {
        Capability::new(
            "Gas Station",
            "free gas",
            network.qualified("gas-station.GAS_PAYER"),
            vec![json!(network.gas_station_account), json!({ "int": 1 }), json!(1.0)],
        )
    } else {
        Capability::new("gas", "pay gas", "coin.GAS", Vec::new())
    }
}
