//! KDX staking: stake, unstake, reward rollup and claim
//!
//! Composite commands run their calls top to bottom in the fixed order
//! rollup, claim, unstake and carry the union of the calls' capabilities.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;
use tracing::{info, warn};

use crate::config::NetworkCfg;
use crate::domain::balance::{format_number, keep_decimal};
use crate::domain::pact::{
    keyset_env, pact_fetch_local, pact_string, Capability, ClampedAmount, CommandContext, GasSettings, LocalOutcome,
    TransactionDescriptor,
};
use crate::infrastructure::chain::ChainClient;
use crate::shared::types::Account;

/// Account receiving the early-unstake penalty
pub const STAKING_PENALTY_ACCOUNT: &str = "kdx-staking";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakingStep {
    Stake,
    Unstake,
    Rollup,
    Claim,
}

pub struct StakingCommands<'a> {
    ctx: CommandContext<'a>,
}

impl<'a> StakingCommands<'a> {
    pub fn new(ctx: CommandContext<'a>) -> Self {
        Self { ctx }
    }

    fn kdx_code(&self) -> String {
        self.ctx.network.qualified("kdx")
    }

    pub async fn add_stake(&self, account: &Account, amount: f64, gas: &GasSettings) -> Option<TransactionDescriptor> {
        self.build(account, &[StakingStep::Stake], Some(amount), gas).await
    }

    pub async fn unstake(&self, account: &Account, amount: f64, gas: &GasSettings) -> Option<TransactionDescriptor> {
        self.build(account, &[StakingStep::Unstake], Some(amount), gas).await
    }

    pub async fn rollup(&self, account: &Account, gas: &GasSettings) -> Option<TransactionDescriptor> {
        self.build(account, &[StakingStep::Rollup], None, gas).await
    }

    pub async fn claim(&self, account: &Account, gas: &GasSettings) -> Option<TransactionDescriptor> {
        self.build(account, &[StakingStep::Claim], None, gas).await
    }

    pub async fn rollup_and_unstake(
        &self,
        account: &Account,
        amount: f64,
        gas: &GasSettings,
    ) -> Option<TransactionDescriptor> {
        self.build(account, &[StakingStep::Rollup, StakingStep::Unstake], Some(amount), gas)
            .await
    }

    pub async fn rollup_and_claim(&self, account: &Account, gas: &GasSettings) -> Option<TransactionDescriptor> {
        self.build(account, &[StakingStep::Rollup, StakingStep::Claim], None, gas).await
    }

    pub async fn rollup_claim_and_unstake(
        &self,
        account: &Account,
        amount: f64,
        gas: &GasSettings,
    ) -> Option<TransactionDescriptor> {
        self.build(
            account,
            &[StakingStep::Rollup, StakingStep::Claim, StakingStep::Unstake],
            Some(amount),
            gas,
        )
        .await
    }

    async fn build(
        &self,
        account: &Account,
        steps: &[StakingStep],
        amount: Option<f64>,
        gas: &GasSettings,
    ) -> Option<TransactionDescriptor> {
        if let Some(a) = amount {
            if !a.is_finite() {
                warn!("⚠️ Invalid staking amount {}", a);
                return None;
            }
        }

        let kdx = self.kdx_code();
        let account = self.ctx.resolve_account(&kdx, account).await?;
        let amount = amount.map(|a| self.ctx.clamp_amount(&kdx, a));

        let mut calls = Vec::with_capacity(steps.len());
        let mut caps = Vec::new();
        for step in steps {
            calls.push(self.step_code(*step, &account.account, amount.as_ref())?);
            caps.extend(self.step_caps(*step, &account.account, amount.as_ref())?);
        }

        info!(
            "🔨 Building staking command {:?} for {}{}",
            steps,
            account.account,
            amount.as_ref().map(|a| format!(" ({} KDX)", a.literal)).unwrap_or_default()
        );
        self.ctx
            .descriptor(&account, calls.join("\n"), caps, keyset_env(&account), gas)
    }

    fn step_code(&self, step: StakingStep, account: &str, amount: Option<&ClampedAmount>) -> Option<String> {
        let network = self.ctx.network;
        let account = pact_string(account);
        let code = match step {
            StakingStep::Stake => format!("({} {} {})", network.qualified("staking.stake"), account, amount?.literal),
            StakingStep::Unstake => {
                format!("({} {} {})", network.qualified("staking.unstake"), account, amount?.literal)
            }
            StakingStep::Rollup => format!("({} {})", network.qualified("staking.rollup"), account),
            StakingStep::Claim => format!("({} {})", network.qualified("staking.claim"), account),
        };
        Some(code)
    }

    fn step_caps(&self, step: StakingStep, account: &str, amount: Option<&ClampedAmount>) -> Option<Vec<Capability>> {
        let network = self.ctx.network;
        let skdx = network.qualified("skdx");
        let caps = match step {
            StakingStep::Stake => {
                let value = amount?.value;
                vec![
                    Capability::new(
                        "wrap capability",
                        "wrapping skdx",
                        network.qualified("kdx.WRAP"),
                        vec![json!(skdx), json!(account), json!(account), json!(value)],
                    ),
                    Capability::new(
                        "stake capability",
                        "staking",
                        network.qualified("staking.STAKE"),
                        vec![json!(account), json!(value)],
                    ),
                ]
            }
            StakingStep::Unstake => {
                let value = amount?.value;
                vec![
                    Capability::new(
                        "unwrap capability for rewards",
                        "unwrapping skdx for user",
                        network.qualified("kdx.UNWRAP"),
                        vec![json!(skdx), json!(account), json!(account), json!(value)],
                    ),
                    Capability::new(
                        "unwrap capability for penalty",
                        "unwrapping skdx for penalty",
                        network.qualified("kdx.UNWRAP"),
                        vec![json!(skdx), json!(account), json!(STAKING_PENALTY_ACCOUNT), json!(value)],
                    ),
                    Capability::new(
                        "unstake capability",
                        "unstaking",
                        network.qualified("staking.UNSTAKE"),
                        vec![json!(account)],
                    ),
                ]
            }
            StakingStep::Rollup => vec![Capability::new(
                "rollup capability",
                "rollup",
                network.qualified("staking.ROLLUP"),
                vec![json!(account)],
            )],
            StakingStep::Claim => vec![Capability::new(
                "claim capability",
                "claim",
                network.qualified("staking.CLAIM"),
                vec![json!(account)],
            )],
        };
        Some(caps)
    }
}

pub async fn get_pool_state(chain: &dyn ChainClient, network: &NetworkCfg) -> LocalOutcome {
    pact_fetch_local(chain, format!("({})", network.qualified("staking.get-pool-state"))).await
}

/// Stake position of `account`, including the penalty an unstake would pay
pub async fn estimate_unstake(chain: &dyn ChainClient, network: &NetworkCfg, account: &str) -> LocalOutcome {
    let code = format!("({} {})", network.qualified("staking.inspect-staker"), pact_string(account));
    pact_fetch_local(chain, code).await
}

/// Effective start date after adding `added` to an existing stake; the
/// reward penalty lasts for the maturation period after this date
pub async fn calculate_new_start(
    chain: &dyn ChainClient,
    network: &NetworkCfg,
    effective_start: &str,
    already_staked: f64,
    added: f64,
    now: DateTime<Utc>,
) -> LocalOutcome {
    let code = format!(
        "({} (time {}) (time {}) {} {})",
        network.qualified("staking.calculate-new-start"),
        pact_string(&now.to_rfc3339_opts(SecondsFormat::Secs, true)),
        pact_string(effective_start),
        keep_decimal(&format_number(already_staked)),
        keep_decimal(&format_number(added)),
    );
    pact_fetch_local(chain, code).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::domain::pact::command::tests::{gas, guarded_account};
    use crate::domain::precision::PrecisionTable;
    use crate::infrastructure::chain::mock::MockChain;
    use chrono::TimeZone;

    fn setup() -> (MockChain, Config, PrecisionTable) {
        let cfg = Config::default();
        let table = PrecisionTable::from_tokens(&cfg.tokens);
        (MockChain::failure("not found"), cfg, table)
    }

    #[tokio::test]
    async fn test_stake_with_gas_station() {
        let (chain, cfg, table) = setup();
        let staking = StakingCommands::new(CommandContext::new(&chain, &cfg.network, &table));

        let cmd = staking.add_stake(&guarded_account(), 10.5, &gas(true)).await.unwrap();
        let names = cmd.capability_names();
        assert_eq!(names.iter().filter(|n| **n == "kaddex.gas-station.GAS_PAYER").count(), 1);
        assert!(!names.contains(&"coin.GAS"));
        assert_eq!(names[1..], ["kaddex.kdx.WRAP", "kaddex.staking.STAKE"]);
        assert_eq!(cmd.sender, "kaddex-free-gas");
        assert_eq!(cmd.pact_code, "(kaddex.staking.stake \"k:alice\" 10.5)");
        assert_eq!(cmd.caps[2].cap.args, vec![json!("k:alice"), json!(10.5)]);
    }

    #[tokio::test]
    async fn test_stake_self_pay() {
        let (chain, cfg, table) = setup();
        let staking = StakingCommands::new(CommandContext::new(&chain, &cfg.network, &table));

        let cmd = staking.add_stake(&guarded_account(), 3.0, &gas(false)).await.unwrap();
        let names = cmd.capability_names();
        assert_eq!(names.iter().filter(|n| **n == "coin.GAS").count(), 1);
        assert!(!names.contains(&"kaddex.gas-station.GAS_PAYER"));
        assert_eq!(cmd.sender, "k:alice");
        assert_eq!(cmd.pact_code, "(kaddex.staking.stake \"k:alice\" 3.00)");
    }

    #[tokio::test]
    async fn test_stake_amount_clamped_to_precision() {
        let (chain, mut cfg, _) = setup();
        cfg.tokens[1].precision = 4;
        let table = PrecisionTable::from_tokens(&cfg.tokens);
        let staking = StakingCommands::new(CommandContext::new(&chain, &cfg.network, &table));

        let cmd = staking.add_stake(&guarded_account(), 1.123456789, &gas(false)).await.unwrap();
        assert_eq!(cmd.pact_code, "(kaddex.staking.stake \"k:alice\" 1.1234)");
        assert_eq!(cmd.caps[1].cap.args[3], json!(1.1234));
    }

    #[tokio::test]
    async fn test_rollup_claim_and_unstake_order() {
        let (chain, cfg, table) = setup();
        let staking = StakingCommands::new(CommandContext::new(&chain, &cfg.network, &table));

        let cmd = staking
            .rollup_claim_and_unstake(&guarded_account(), 2.5, &gas(false))
            .await
            .unwrap();

        let rollup = cmd.pact_code.find("staking.rollup").unwrap();
        let claim = cmd.pact_code.find("staking.claim").unwrap();
        let unstake = cmd.pact_code.find("staking.unstake").unwrap();
        assert!(rollup < claim && claim < unstake);
        assert_eq!(
            cmd.capability_names(),
            vec![
                "coin.GAS",
                "kaddex.staking.ROLLUP",
                "kaddex.staking.CLAIM",
                "kaddex.kdx.UNWRAP",
                "kaddex.kdx.UNWRAP",
                "kaddex.staking.UNSTAKE",
            ]
        );
        assert_eq!(cmd.caps[4].cap.args[2], json!(STAKING_PENALTY_ACCOUNT));
    }

    #[tokio::test]
    async fn test_rollup_and_claim() {
        let (chain, cfg, table) = setup();
        let staking = StakingCommands::new(CommandContext::new(&chain, &cfg.network, &table));

        let cmd = staking.rollup_and_claim(&guarded_account(), &gas(true)).await.unwrap();
        assert_eq!(
            cmd.pact_code,
            "(kaddex.staking.rollup \"k:alice\")\n(kaddex.staking.claim \"k:alice\")"
        );
        assert_eq!(cmd.caps.len(), 3);
    }

    #[tokio::test]
    async fn test_rollup_and_unstake() {
        let (chain, cfg, table) = setup();
        let staking = StakingCommands::new(CommandContext::new(&chain, &cfg.network, &table));

        let cmd = staking.rollup_and_unstake(&guarded_account(), 1.0, &gas(false)).await.unwrap();
        assert_eq!(
            cmd.pact_code,
            "(kaddex.staking.rollup \"k:alice\")\n(kaddex.staking.unstake \"k:alice\" 1.00)"
        );
        assert_eq!(cmd.env_data["user-ks"]["pred"], "keys-all");
    }

    #[tokio::test]
    async fn test_single_step_commands() {
        let (chain, cfg, table) = setup();
        let staking = StakingCommands::new(CommandContext::new(&chain, &cfg.network, &table));
        let account = guarded_account();

        let rollup = staking.rollup(&account, &gas(false)).await.unwrap();
        assert_eq!(rollup.capability_names(), vec!["coin.GAS", "kaddex.staking.ROLLUP"]);

        let claim = staking.claim(&account, &gas(false)).await.unwrap();
        assert_eq!(claim.pact_code, "(kaddex.staking.claim \"k:alice\")");

        let unstake = staking.unstake(&account, 0.5, &gas(false)).await.unwrap();
        assert_eq!(unstake.pact_code, "(kaddex.staking.unstake \"k:alice\" 0.5)");
    }

    #[tokio::test]
    async fn test_unresolved_account_yields_none() {
        let (chain, cfg, table) = setup();
        let staking = StakingCommands::new(CommandContext::new(&chain, &cfg.network, &table));

        let cmd = staking.add_stake(&Account::named("k:bob"), 1.0, &gas(false)).await;
        assert!(cmd.is_none());
        assert_eq!(chain.codes(), vec!["(kaddex.kdx.details \"k:bob\")".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_amount_yields_none() {
        let (chain, cfg, table) = setup();
        let staking = StakingCommands::new(CommandContext::new(&chain, &cfg.network, &table));
        assert!(staking.add_stake(&guarded_account(), f64::NAN, &gas(false)).await.is_none());
    }

    #[tokio::test]
    async fn test_calculate_new_start_code() {
        let chain = MockChain::success(json!({ "time": "2024-01-10T00:00:00Z" }));
        let cfg = Config::default();
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

        let outcome = calculate_new_start(&chain, &cfg.network, "2023-12-01T00:00:00Z", 100.0, 50.5, now).await;
        assert!(outcome.is_success());
        assert_eq!(
            chain.codes()[0],
            "(kaddex.staking.calculate-new-start (time \"2024-01-02T00:00:00Z\") (time \"2023-12-01T00:00:00Z\") 100.0 50.5)"
        );
    }

    #[tokio::test]
    async fn test_pool_queries() {
        let chain = MockChain::success(json!({ "stake-record": 1 }));
        let cfg = Config::default();
        assert!(get_pool_state(&chain, &cfg.network).await.is_success());
        assert!(estimate_unstake(&chain, &cfg.network, "k:alice").await.is_success());
        assert_eq!(
            chain.codes(),
            vec![
                "(kaddex.staking.get-pool-state)".to_string(),
                "(kaddex.staking.inspect-staker \"k:alice\")".to_string(),
            ]
        );
    }
}
