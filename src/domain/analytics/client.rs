use chrono::NaiveDate;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::shared::errors::ChainError;
use super::DailyVolume;

/// Client for the DEX stats REST service
pub struct AnalyticsClient {
    http: Client,
    base_url: String,
}

impl AnalyticsClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ChainError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// `None` when no analytics URL is configured
    pub fn from_config(cfg: &Config) -> Result<Option<Self>, ChainError> {
        match &cfg.analytics.base_url {
            Some(url) => Ok(Some(Self::new(
                url.clone(),
                Duration::from_millis(cfg.network.request_timeout_ms),
            )?)),
            None => Ok(None),
        }
    }

    fn daily_volume_url(&self, from: NaiveDate, to: NaiveDate) -> String {
        format!(
            "{}/volume/daily?dateStart={}&dateEnd={}",
            self.base_url,
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        )
    }

    /// Daily volume buckets between `from` and `to`, inclusive, oldest first
    pub async fn daily_volumes(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailyVolume>, ChainError> {
        let url = self.daily_volume_url(from, to);
        debug!("GET {}", url);
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!("⚠️ Stats service returned status {}: {}", status, text);
            return Err(ChainError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let volumes: Vec<DailyVolume> = serde_json::from_str(&text)?;
        info!("📊 Loaded {} daily volume buckets", volumes.len());
        Ok(volumes)
    }
}
