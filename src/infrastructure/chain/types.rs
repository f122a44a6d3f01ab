use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unsigned code submitted for local execution
#[derive(Debug, Clone, PartialEq)]
pub struct LocalRequest {
    pub code: String,
    pub data: Map<String, Value>,
    /// Chain override, the configured chain is used when `None`
    pub chain_id: Option<String>,
}

impl LocalRequest {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            data: Map::new(),
            chain_id: None,
        }
    }

    pub fn on_chain(mut self, chain_id: impl Into<String>) -> Self {
        self.chain_id = Some(chain_id.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PactErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
}

/// `result` object of local/listen responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PactResult {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<PactErrorDetail>,
}

impl PactResult {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    pub fn success(data: Value) -> Self {
        Self {
            status: "success".to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: Option<&str>) -> Self {
        Self {
            status: "failure".to_string(),
            data: None,
            error: Some(PactErrorDetail {
                message: message.map(str::to_string),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalResponse {
    pub result: PactResult,
}

/// Final outcome returned by `listen`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    pub req_key: String,
    pub result: PactResult,
    #[serde(default)]
    pub gas: Option<u64>,
    #[serde(default)]
    pub tx_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSig {
    pub sig: Option<String>,
}

/// Command as produced by a wallet: `cmd` is the JSON payload string and
/// `hash` its Blake2b-256 digest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedCommand {
    pub hash: String,
    pub sigs: Vec<UserSig>,
    pub cmd: String,
}

impl SignedCommand {
    pub fn is_fully_signed(&self) -> bool {
        !self.sigs.is_empty() && self.sigs.iter().all(|s| s.sig.is_some())
    }
}
