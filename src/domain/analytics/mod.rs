//! Pool APR, staking APR and volume aggregation over the stats service

mod client;

pub use client::AnalyticsClient;

use serde::{Deserialize, Serialize};

use crate::domain::balance::{parse_number, to_fixed};

/// Volume traded between two tokens on one chain during a day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenVolume {
    pub chain: u32,
    #[serde(default)]
    pub token_from_namespace: Option<String>,
    pub token_from_name: String,
    #[serde(default)]
    pub token_to_namespace: Option<String>,
    pub token_to_name: String,
    pub token_from_volume: f64,
    pub token_to_volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyVolume {
    #[serde(default, alias = "_id")]
    pub day: Option<String>,
    #[serde(default)]
    pub volumes: Vec<TokenVolume>,
}

/// Liquidity provider APR in percent. Zero liquidity yields 0.
pub fn get_apr(volume: f64, liquidity: f64, fee: f64) -> f64 {
    let yearly_fees = volume * fee * 365.0;
    if liquidity == 0.0 || liquidity.is_nan() {
        return 0.0;
    }
    yearly_fees * 100.0 / liquidity
}

pub fn get_daily_usd_rewards(daily_volume_usd: f64, rewards_percent: f64) -> f64 {
    daily_volume_usd * rewards_percent / 100.0
}

/// Staking APR in percent, `None` when either input is not a number
pub fn get_staking_apr(daily_volume_usd: f64, staked_usd: f64, rewards_percent: f64) -> Option<f64> {
    if daily_volume_usd.is_nan() || staked_usd.is_nan() {
        return None;
    }
    let yearly_rewards = get_daily_usd_rewards(daily_volume_usd, rewards_percent) * 365.0;
    Some(100.0 * yearly_rewards / staked_usd)
}

/// USD price of a token priced through a pool's reserve ratio, rounded
/// half-up to `precision` digits
pub fn get_token_usd_price_by_liquidity(liquidity0: f64, liquidity1: f64, usd_price: f64, precision: usize) -> f64 {
    let price = liquidity0 / liquidity1 * usd_price;
    if !price.is_finite() {
        return price;
    }
    parse_number(&to_fixed(price, precision))
}

/// Whether a stats-service token (`namespace`, `name`) is the token with
/// module `code`. Un-namespaced modules such as `coin` have no namespace on
/// the stats side.
pub fn is_matching_stat_token(stat_namespace: Option<&str>, stat_name: &str, code: &str) -> bool {
    match code.split_once('.') {
        Some((namespace, name)) => stat_namespace == Some(namespace) && stat_name == name,
        None => stat_namespace.map_or(true, str::is_empty) && stat_name == code,
    }
}

fn volume_for(volume: &TokenVolume, token: &str) -> f64 {
    if is_matching_stat_token(volume.token_from_namespace.as_deref(), &volume.token_from_name, token) {
        volume.token_from_volume
    } else {
        volume.token_to_volume
    }
}

fn is_from(volume: &TokenVolume, token: &str) -> bool {
    is_matching_stat_token(volume.token_from_namespace.as_deref(), &volume.token_from_name, token)
}

fn is_to(volume: &TokenVolume, token: &str) -> bool {
    is_matching_stat_token(volume.token_to_namespace.as_deref(), &volume.token_to_name, token)
}

/// Volume of `token` in the last daily bucket, on `chain_id`, across every
/// pair that trades it. `None` when there is no bucket.
pub fn get_24h_volume_single_sided(volumes: &[DailyVolume], token: &str, chain_id: u32) -> Option<f64> {
    let last = volumes.last()?;
    Some(
        last.volumes
            .iter()
            .filter(|v| v.chain == chain_id && (is_from(v, token) || is_to(v, token)))
            .map(|v| volume_for(v, token))
            .sum(),
    )
}

/// Volume of `token` in the last daily bucket, restricted to trades
/// between `token0` and `token1` in either direction
pub fn get_24h_volume_double_sided(
    volumes: &[DailyVolume],
    token0: &str,
    token1: &str,
    token: &str,
    chain_id: u32,
) -> Option<f64> {
    let last = volumes.last()?;
    Some(
        last.volumes
            .iter()
            .filter(|v| {
                v.chain == chain_id
                    && ((is_from(v, token0) && is_to(v, token1)) || (is_from(v, token1) && is_to(v, token0)))
            })
            .map(|v| volume_for(v, token))
            .sum(),
    )
}

/// Render a duration: `"D days H hours"` above a day, `"H hours"` above an
/// hour, `"M minutes"` otherwise
pub fn time_render(seconds: u64) -> String {
    if seconds > 86_400 {
        format!("{} days {} hours", seconds / 86_400, seconds % 86_400 / 3_600)
    } else if seconds > 3_600 {
        format!("{} hours", seconds / 3_600)
    } else {
        format!("{} minutes", seconds / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volume(chain: u32, from: (Option<&str>, &str, f64), to: (Option<&str>, &str, f64)) -> TokenVolume {
        TokenVolume {
            chain,
            token_from_namespace: from.0.map(str::to_string),
            token_from_name: from.1.to_string(),
            token_to_namespace: to.0.map(str::to_string),
            token_to_name: to.1.to_string(),
            token_from_volume: from.2,
            token_to_volume: to.2,
        }
    }

    fn buckets() -> Vec<DailyVolume> {
        vec![
            DailyVolume {
                day: Some("2024-01-01".to_string()),
                volumes: vec![volume(2, (None, "coin", 999.0), (Some("kaddex"), "kdx", 999.0))],
            },
            DailyVolume {
                day: Some("2024-01-02".to_string()),
                volumes: vec![
                    volume(2, (None, "coin", 100.0), (Some("kaddex"), "kdx", 400.0)),
                    volume(2, (Some("kaddex"), "kdx", 40.0), (None, "coin", 10.0)),
                    volume(2, (Some("runonflux"), "flux", 30.0), (None, "coin", 5.0)),
                    volume(1, (None, "coin", 1000.0), (Some("kaddex"), "kdx", 1000.0)),
                ],
            },
        ]
    }

    #[test]
    fn test_get_apr() {
        assert_eq!(get_apr(1000.0, 0.0, 0.0025), 0.0);
        let apr = get_apr(1000.0, 365_000.0, 0.0025);
        assert!((apr - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_staking_apr() {
        assert_eq!(get_daily_usd_rewards(10_000.0, 0.05), 5.0);
        assert_eq!(get_staking_apr(f64::NAN, 100.0, 0.05), None);
        assert_eq!(get_staking_apr(100.0, f64::NAN, 0.05), None);
        let apr = get_staking_apr(10_000.0, 1825.0, 0.05).unwrap();
        assert!((apr - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_token_usd_price_by_liquidity() {
        assert_eq!(get_token_usd_price_by_liquidity(1.0, 3.0, 1.0, 8), 0.33333333);
        assert_eq!(get_token_usd_price_by_liquidity(2.0, 3.0, 1.0, 4), 0.6667);
        assert!(get_token_usd_price_by_liquidity(1.0, 0.0, 1.0, 8).is_infinite());
    }

    #[test]
    fn test_matching_stat_token() {
        assert!(is_matching_stat_token(Some("kaddex"), "kdx", "kaddex.kdx"));
        assert!(!is_matching_stat_token(Some("kaddex"), "skdx", "kaddex.kdx"));
        assert!(is_matching_stat_token(None, "coin", "coin"));
        assert!(!is_matching_stat_token(Some("kaddex"), "kdx", "coin"));
        assert!(!is_matching_stat_token(None, "coin", "kaddex.kdx"));
        assert!(!is_matching_stat_token(Some("runonflux"), "flux", "kaddex.kdx"));
    }

    #[test]
    fn test_single_sided_volume_uses_last_bucket() {
        let volumes = buckets();
        assert_eq!(get_24h_volume_single_sided(&volumes, "coin", 2), Some(115.0));
        assert_eq!(get_24h_volume_single_sided(&volumes, "kaddex.kdx", 2), Some(440.0));
        assert_eq!(get_24h_volume_single_sided(&[], "coin", 2), None);
    }

    #[test]
    fn test_double_sided_volume() {
        let volumes = buckets();
        assert_eq!(
            get_24h_volume_double_sided(&volumes, "coin", "kaddex.kdx", "coin", 2),
            Some(110.0)
        );
        assert_eq!(
            get_24h_volume_double_sided(&volumes, "coin", "kaddex.kdx", "kaddex.kdx", 2),
            Some(440.0)
        );
    }

    #[test]
    fn test_time_render() {
        assert_eq!(time_render(90_000), "1 days 1 hours");
        assert_eq!(time_render(7_200 + 59), "2 hours");
        assert_eq!(time_render(3_600), "60 minutes");
        assert_eq!(time_render(125), "2 minutes");
    }

    #[test]
    fn test_daily_volume_from_service_json() {
        let raw = serde_json::json!([{
            "_id": "2024-01-02",
            "volumes": [{
                "chain": 2,
                "tokenFromNamespace": null,
                "tokenFromName": "coin",
                "tokenToNamespace": "kaddex",
                "tokenToName": "kdx",
                "tokenFromVolume": 1.5,
                "tokenToVolume": 6.0
            }]
        }]);
        let parsed: Vec<DailyVolume> = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed[0].day.as_deref(), Some("2024-01-02"));
        assert_eq!(parsed[0].volumes[0].token_to_namespace.as_deref(), Some("kaddex"));
    }
}
