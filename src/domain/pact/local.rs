//! Read-only local execution with error-tagged results

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::NetworkCfg;
use crate::domain::balance::extract_decimal;
use crate::infrastructure::chain::{ChainClient, LocalRequest};
use crate::shared::types::{Account, Amount};
use super::pact_string;

const UNKNOWN_FAILURE: &str = "local execution failed";

/// Outcome of a local query: the inner `data` or an error message.
/// Local queries never return `Err`.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalOutcome<T = Value> {
    Data(T),
    Failed { error_message: String },
}

impl<T> LocalOutcome<T> {
    pub fn failed(message: impl Into<String>) -> Self {
        LocalOutcome::Failed {
            error_message: message.into(),
        }
    }

    pub fn data(self) -> Option<T> {
        match self {
            LocalOutcome::Data(d) => Some(d),
            LocalOutcome::Failed { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            LocalOutcome::Data(_) => None,
            LocalOutcome::Failed { error_message } => Some(error_message),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LocalOutcome::Data(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LocalOutcome<U> {
        match self {
            LocalOutcome::Data(d) => LocalOutcome::Data(f(d)),
            LocalOutcome::Failed { error_message } => LocalOutcome::Failed { error_message },
        }
    }
}

impl LocalOutcome<Value> {
    /// Decode the data into a typed value; decode errors become `Failed`
    pub fn parse<T: DeserializeOwned>(self) -> LocalOutcome<T> {
        match self {
            LocalOutcome::Data(value) => match serde_json::from_value(value) {
                Ok(parsed) => LocalOutcome::Data(parsed),
                Err(e) => LocalOutcome::failed(format!("unexpected local result: {}", e)),
            },
            LocalOutcome::Failed { error_message } => LocalOutcome::Failed { error_message },
        }
    }

    /// JSON shape handed to callers that branch on `errorMessage`
    pub fn into_json(self) -> Value {
        match self {
            LocalOutcome::Data(value) => value,
            LocalOutcome::Failed { error_message } => serde_json::json!({ "errorMessage": error_message }),
        }
    }
}

/// Run `code` locally on the configured chain
pub async fn pact_fetch_local(chain: &dyn ChainClient, code: impl Into<String>) -> LocalOutcome {
    pact_fetch_request(chain, &LocalRequest::new(code)).await
}

pub async fn pact_fetch_request(chain: &dyn ChainClient, request: &LocalRequest) -> LocalOutcome {
    debug!("local: {}", request.code.trim());
    match chain.local(request).await {
        Ok(response) if response.result.is_success() => {
            LocalOutcome::Data(response.result.data.unwrap_or(Value::Null))
        }
        Ok(response) => {
            let message = response
                .result
                .error
                .and_then(|e| e.message)
                .unwrap_or_else(|| UNKNOWN_FAILURE.to_string());
            debug!("local failure: {}", message);
            LocalOutcome::failed(message)
        }
        Err(e) => {
            warn!("⚠️ Local execution request failed: {}", e);
            LocalOutcome::failed(e.to_string())
        }
    }
}

/// `(<token>.details "<account>")`, used to recover an account's guard
pub async fn token_details(chain: &dyn ChainClient, token_code: &str, account: &str) -> LocalOutcome<Account> {
    if account.is_empty() {
        return LocalOutcome::failed("no account");
    }
    let code = format!("({}.details {})", token_code, pact_string(account));
    pact_fetch_local(chain, code).await.parse()
}

/// KDA price from the public-sale oracle, which lives on chain 0
pub async fn get_current_kda_usd_price(chain: &dyn ChainClient, network: &NetworkCfg) -> Option<f64> {
    let code = format!("({})", network.qualified("public-sale.kda-current-usd-price"));
    let request = LocalRequest::new(code).on_chain("0");
    pact_fetch_request(chain, &request)
        .await
        .data()
        .map(|v| extract_decimal(&Amount::from_value(&v)))
        .filter(|price| !price.is_nan())
}
