//! Per-token precision table
//!
//! The table is immutable. [`refresh_precision`] asks the chain for every
//! token's `precision` in a single local call and returns a new table.

use std::collections::BTreeMap;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::TokenCfg;
use crate::domain::balance::extract_decimal;
use crate::domain::pact::pact_fetch_local;
use crate::infrastructure::chain::ChainClient;
use crate::shared::types::Amount;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenPrecision {
    pub name: String,
    pub code: String,
    pub precision: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PrecisionTable {
    tokens: BTreeMap<String, TokenPrecision>,
}

impl PrecisionTable {
    pub fn from_tokens(tokens: &[TokenCfg]) -> Self {
        let tokens = tokens
            .iter()
            .map(|t| {
                (
                    t.name.clone(),
                    TokenPrecision {
                        name: t.name.clone(),
                        code: t.code.clone(),
                        precision: t.precision,
                    },
                )
            })
            .collect();
        Self { tokens }
    }

    pub fn by_name(&self, name: &str) -> Option<u32> {
        self.tokens.get(name).map(|t| t.precision)
    }

    pub fn by_code(&self, code: &str) -> Option<u32> {
        self.tokens
            .values()
            .find(|t| t.code == code)
            .map(|t| t.precision)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenPrecision> {
        self.tokens.values()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Copy of the table with `updates` applied; negative or unparsable
    /// precisions keep the current value
    fn with_updates(&self, updates: &serde_json::Map<String, serde_json::Value>) -> Self {
        let mut next = self.clone();
        for (name, token) in next.tokens.iter_mut() {
            let Some(raw) = updates.get(name) else { continue };
            let value = extract_decimal(&Amount::from_value(raw));
            if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
                token.precision = value as u32;
            } else {
                warn!("⚠️ Chain reported no precision for {} ({}), keeping {}", name, raw, token.precision);
            }
        }
        next
    }
}

/// Nested `let` bindings, one `try` per token, ending in an object keyed by
/// token name: `(let ((KDA (try -1 (coin.precision)))) ... {"KDA": KDA})`
pub fn precision_query_code(table: &PrecisionTable) -> String {
    let mut code = String::new();
    let mut closing = String::new();
    for token in table.iter() {
        code.push_str(&format!("(let (({} (try -1 ({}.precision)))) ", token.name, token.code));
        closing.push(')');
    }
    let fields: Vec<String> = table
        .iter()
        .map(|t| format!("\"{}\": {}", t.name, t.name))
        .collect();
    code.push_str(&format!("{{{}}}", fields.join(",")));
    code.push_str(&closing);
    code
}

/// Query the chain once and return a refreshed table. The current table is
/// returned unchanged when the query fails.
pub async fn refresh_precision(chain: &dyn ChainClient, current: &PrecisionTable) -> PrecisionTable {
    if current.is_empty() {
        return current.clone();
    }
    let outcome = pact_fetch_local(chain, precision_query_code(current)).await;
    match outcome.data() {
        Some(serde_json::Value::Object(updates)) => {
            info!("🔄 Refreshed precision for {} tokens", current.len());
            current.with_updates(&updates)
        }
        _ => {
            warn!("⚠️ Precision refresh failed, keeping configured values");
            current.clone()
        }
    }
}
