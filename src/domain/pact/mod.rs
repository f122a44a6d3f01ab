//! Pact transaction primitives: capabilities, descriptors, local queries

mod capability;
pub(crate) mod command;
mod local;

pub use capability::{gas_capability, Capability, CapabilityRef};
pub use command::{keyset_env, ClampedAmount, CommandContext, GasSettings, TransactionDescriptor, TX_TTL};
pub use local::{get_current_kda_usd_price, pact_fetch_local, pact_fetch_request, token_details, LocalOutcome};

/// Quote a value as a Pact string literal
pub fn pact_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}
