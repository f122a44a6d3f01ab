//! Chainweb Pact API client

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{Config, NetworkCfg};
use crate::shared::errors::ChainError;
use super::command::local_command;
use super::types::{CommandResult, LocalRequest, LocalResponse, SignedCommand};
use super::ChainClient;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendResponse {
    request_keys: Vec<String>,
}

/// Pact HTTP client for one network
pub struct PactHttpClient {
    http: Client,
    network: NetworkCfg,
    gas_price: f64,
}

impl PactHttpClient {
    /// Create new client
    pub fn new(network: NetworkCfg, gas_price: f64) -> Result<Self, ChainError> {
        let http = Client::builder()
            .timeout(Duration::from_millis(network.request_timeout_ms))
            .build()?;
        Ok(Self {
            http,
            network,
            gas_price,
        })
    }

    /// Create client from application config
    pub fn from_config(cfg: &Config) -> Result<Self, ChainError> {
        Self::new(cfg.network.clone(), cfg.gas.price)
    }

    pub fn network(&self) -> &NetworkCfg {
        &self.network
    }

    fn endpoint(&self, chain_id: &str, path: &str) -> String {
        format!("{}/api/v1/{}", self.network.pact_url(chain_id), path)
    }

    async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(&self, url: &str, body: &B) -> Result<R, ChainError> {
        debug!("POST {}", url);
        let response = self.http.post(url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!("⚠️ Pact API returned status {}: {}", status, text);
            return Err(ChainError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl ChainClient for PactHttpClient {
    async fn local(&self, request: &LocalRequest) -> Result<LocalResponse, ChainError> {
        let chain_id = request
            .chain_id
            .as_deref()
            .unwrap_or(&self.network.chain_id);
        let command = local_command(&self.network, request, self.gas_price, Utc::now())?;
        self.post(&self.endpoint(chain_id, "local"), &command).await
    }

    async fn local_signed(&self, command: &SignedCommand) -> Result<LocalResponse, ChainError> {
        self.post(&self.endpoint(&self.network.chain_id, "local"), command).await
    }

    async fn send(&self, command: &SignedCommand) -> Result<String, ChainError> {
        let body = json!({ "cmds": [command] });
        let response: SendResponse = self
            .post(&self.endpoint(&self.network.chain_id, "send"), &body)
            .await?;

        let request_key = response
            .request_keys
            .into_iter()
            .next()
            .ok_or(ChainError::MissingRequestKey)?;
        info!("📤 Transaction sent, request key {}", request_key);
        Ok(request_key)
    }

    async fn listen(&self, request_key: &str) -> Result<CommandResult, ChainError> {
        info!("👂 Listening for {}", request_key);
        let body = json!({ "listen": request_key });
        self.post(&self.endpoint(&self.network.chain_id, "listen"), &body).await
    }
}
