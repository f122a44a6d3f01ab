//! Common types used across the application

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};

/// Token quantity as it arrives from the chain or from user input.
///
/// Pact encodes integers as `{"int": ..}` and decimals as `{"decimal": ..}`;
/// everything else is a bare number or a numeric string. The tagged payload
/// is kept as text so no precision is lost before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum Amount {
    Int(String),
    Decimal(String),
    Number(f64),
    Text(String),
}

impl Amount {
    pub fn int(value: impl Into<String>) -> Self {
        Amount::Int(value.into())
    }

    pub fn decimal(value: impl Into<String>) -> Self {
        Amount::Decimal(value.into())
    }

    /// Amount built from an arbitrary JSON value. Objects without an `int`
    /// or `decimal` tag, booleans and nulls become `NaN`.
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or(Amount::Number(f64::NAN))
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Amount::Number(value)
    }
}

impl From<&str> for Amount {
    fn from(value: &str) -> Self {
        Amount::Text(value.to_string())
    }
}

impl From<String> for Amount {
    fn from(value: String) -> Self {
        Amount::Text(value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TagPayload {
    Number(serde_json::Number),
    Text(String),
}

impl TagPayload {
    fn into_text(self) -> String {
        match self {
            TagPayload::Number(n) => n.to_string(),
            TagPayload::Text(s) => s,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Int { int: TagPayload },
    Decimal { decimal: TagPayload },
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawAmount::deserialize(deserializer)? {
            RawAmount::Int { int } => Amount::Int(int.into_text()),
            RawAmount::Decimal { decimal } => Amount::Decimal(decimal.into_text()),
            RawAmount::Number(n) => Amount::Number(n),
            RawAmount::Text(s) => Amount::Text(s),
        })
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Amount::Int(s) => json!({ "int": s }).serialize(serializer),
            Amount::Decimal(s) => json!({ "decimal": s }).serialize(serializer),
            Amount::Number(n) => n.serialize(serializer),
            Amount::Text(s) => s.serialize(serializer),
        }
    }
}

/// Keyset guarding an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guard {
    pub keys: Vec<String>,
    pub pred: String,
}

/// Chain account as returned by `<token>.details`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub account: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<Guard>,
}

impl Account {
    pub fn named(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            guard: None,
        }
    }

    pub fn with_guard(account: impl Into<String>, guard: Guard) -> Self {
        Self {
            account: account.into(),
            guard: Some(guard),
        }
    }

    /// First key of the guard, used as the signing key
    pub fn signing_key(&self) -> Option<&str> {
        self.guard
            .as_ref()
            .and_then(|g| g.keys.first())
            .map(String::as_str)
    }
}
