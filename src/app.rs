// src/app.rs
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::Subcommand;
use serde::Serialize;
use serde_json::{json, Value};
use std::{fs, path::PathBuf};
use tracing::{info, warn};

use crate::config::Config;
use crate::domain::analytics::{
    get_24h_volume_double_sided, get_24h_volume_single_sided, get_apr, get_daily_usd_rewards, get_staking_apr,
    get_token_usd_price_by_liquidity, time_render, AnalyticsClient,
};
use crate::domain::balance::{
    extract_decimal, get_decimal_places, human_readable_number, pair_unit, reduce_balance, DEFAULT_DISPLAY_DECIMALS,
    DEFAULT_REDUCE_PRECISION,
};
use crate::domain::dao::{self, DaoCommands, VoteKind};
use crate::domain::pact::{get_current_kda_usd_price, CommandContext, GasSettings, LocalOutcome, TransactionDescriptor};
use crate::domain::precision::{refresh_precision, PrecisionTable};
use crate::domain::staking::{self, StakingCommands};
use crate::domain::swap::{
    get_one_side_liquidity_pair_info, get_pair_list, get_pair_list_account_balance, PairReserves, SwapCommands,
    SwapDirection, SwapRequest, SwapToken,
};
use crate::infrastructure::chain::{hash_command, ChainClient, PactHttpClient, SignedCommand};
use crate::shared::errors::{ConfigError, SigningError};
use crate::shared::types::{Account, Amount, Guard};

#[derive(Debug, Clone)]
pub struct AppCfg {
    pub config: Config,
    /// Query token precisions from the chain before building commands
    pub refresh_precision: bool,
}

impl AppCfg {
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            refresh_precision: true,
        })
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Normalize an amount given as chain JSON (`{"decimal":"1.5"}`) or text
    Format {
        value: String,
        #[arg(long, default_value_t = DEFAULT_DISPLAY_DECIMALS)]
        decimals: usize,
    },
    /// Render a duration in seconds as days, hours or minutes
    RenderTime { seconds: u64 },
    /// Token precisions as reported by the chain
    Precision,
    /// All governance proposals, or one with --id
    Proposals {
        #[arg(long)]
        id: Option<String>,
    },
    AccountData { account: String },
    Voted { account: String, proposal: String },
    /// Staking pool state, plus the staker position with --account
    PoolState {
        #[arg(long)]
        account: Option<String>,
    },
    /// Effective stake start after adding to an existing position
    NewStart {
        effective_start: String,
        already_staked: f64,
        added: f64,
    },
    /// Reserves of every configured pair
    Pairs,
    /// Liquidity positions of an account in every configured pair
    Positions { account: String },
    /// Quote adding liquidity to a pair from one token only
    OneSideQuote {
        token0: String,
        token1: String,
        amount: f64,
        #[arg(long, default_value_t = 0.005)]
        slippage: f64,
    },
    KdaPrice,
    /// 24h volumes and pool APR from the stats service
    Volume {
        #[arg(long, default_value_t = 1)]
        days: i64,
    },
    StakingApr { daily_volume_usd: f64, staked_usd: f64 },
    /// Build an unsigned transaction for the wallet
    Build {
        #[arg(long)]
        account: String,
        /// Signing key; the account guard is looked up on chain when omitted
        #[arg(long)]
        public_key: Option<String>,
        #[arg(long, default_value = "keys-all")]
        pred: String,
        #[command(subcommand)]
        action: BuildAction,
    },
    /// Submit a wallet-signed command and wait for the result
    Submit {
        signed: PathBuf,
        /// Run the signed command locally instead of sending it
        #[arg(long)]
        preview: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum BuildAction {
    Vote { kind: VoteKind, proposal: String },
    Stake { amount: f64 },
    Unstake { amount: f64 },
    Rollup,
    Claim,
    RollupUnstake { amount: f64 },
    RollupClaim,
    RollupClaimUnstake { amount: f64 },
    Swap {
        from: String,
        to: String,
        amount_in: f64,
        amount_out: f64,
        #[arg(long)]
        exact_out: bool,
        #[arg(long, default_value_t = 0.005)]
        slippage: f64,
    },
}

pub async fn run(app_cfg: AppCfg, command: Command) -> Result<()> {
    info!(
        "🚀 Kaddex CLI on {} chain {}",
        app_cfg.config.network.network_id, app_cfg.config.network.chain_id
    );
    let client = PactHttpClient::from_config(&app_cfg.config).context("create Pact client")?;
    let output = execute(&app_cfg, &client, &command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn outcome_json<T: Serialize>(outcome: LocalOutcome<T>) -> Value {
    match outcome {
        LocalOutcome::Data(data) => serde_json::to_value(data).unwrap_or(Value::Null),
        LocalOutcome::Failed { error_message } => json!({ "errorMessage": error_message }),
    }
}

fn liquidity(pair: &PairReserves) -> Option<(f64, f64)> {
    let (r0, r1) = pair.reserves.as_ref()?;
    let l0 = reduce_balance(r0, DEFAULT_REDUCE_PRECISION).as_f64()?;
    let l1 = reduce_balance(r1, DEFAULT_REDUCE_PRECISION).as_f64()?;
    Some((l0, l1))
}

/// Run one command against `chain` and return its JSON output
pub async fn execute(app_cfg: &AppCfg, chain: &dyn ChainClient, command: &Command) -> Result<Value> {
    let cfg = &app_cfg.config;
    let network = &cfg.network;

    let output = match command {
        Command::Format { value, decimals } => {
            let amount = serde_json::from_str::<Amount>(value).unwrap_or_else(|_| Amount::from(value.as_str()));
            json!({
                "extracted": extract_decimal(&amount),
                "reduced": reduce_balance(&amount, DEFAULT_REDUCE_PRECISION),
                "humanReadable": human_readable_number(&amount, *decimals),
                "decimalPlaces": get_decimal_places(&amount),
                "pairUnit": pair_unit(&amount, 14),
            })
        }
        Command::RenderTime { seconds } => json!(time_render(*seconds)),
        Command::Precision => serde_json::to_value(load_precision(app_cfg, chain).await)?,
        Command::Proposals { id: Some(id) } => dao::read_single_proposal(chain, network, id).await.into_json(),
        Command::Proposals { id: None } => dao::read_all_proposals(chain, network).await.into_json(),
        Command::AccountData { account } => dao::get_account_data(chain, network, account).await.into_json(),
        Command::Voted { account, proposal } => {
            dao::has_account_voted(chain, network, account, proposal).await.into_json()
        }
        Command::PoolState { account } => {
            let staker = async {
                match account {
                    Some(account) => Some(staking::estimate_unstake(chain, network, account).await.into_json()),
                    None => None,
                }
            };
            let (pool, staker) = futures::join!(staking::get_pool_state(chain, network), staker);
            json!({ "pool": pool.into_json(), "staker": staker })
        }
        Command::NewStart {
            effective_start,
            already_staked,
            added,
        } => staking::calculate_new_start(chain, network, effective_start, *already_staked, *added, Utc::now())
            .await
            .into_json(),
        Command::Pairs => {
            let (pairs, kda_usd) = futures::join!(
                get_pair_list(chain, network, &cfg.pairs),
                get_current_kda_usd_price(chain, network)
            );
            match pairs {
                LocalOutcome::Data(pairs) => {
                    let mut rows = Vec::with_capacity(pairs.len());
                    for pair in &pairs {
                        let mut row = serde_json::to_value(pair)?;
                        if let (Some(usd), Some((l0, l1)), "coin") = (kda_usd, liquidity(pair), pair.token0.as_str()) {
                            let precision = cfg.token_by_code(&pair.token1).map_or(8, |t| t.precision as usize);
                            row["token1UsdPrice"] = json!(get_token_usd_price_by_liquidity(l0, l1, usd, precision));
                        }
                        rows.push(row);
                    }
                    Value::Array(rows)
                }
                failed => outcome_json(failed),
            }
        }
        Command::Positions { account } => {
            outcome_json(get_pair_list_account_balance(chain, network, &cfg.pairs, account).await)
        }
        Command::OneSideQuote {
            token0,
            token1,
            amount,
            slippage,
        } => {
            let token0 = &cfg.token(token0)?.code;
            let token1 = &cfg.token(token1)?.code;
            outcome_json(get_one_side_liquidity_pair_info(chain, network, *amount, *slippage, token0, token1).await)
        }
        Command::KdaPrice => json!(get_current_kda_usd_price(chain, network).await),
        Command::Volume { days } => volume_report(cfg, chain, *days).await?,
        Command::StakingApr {
            daily_volume_usd,
            staked_usd,
        } => {
            let percent = cfg.analytics.staking_rewards_percent;
            json!({
                "dailyUsdRewards": get_daily_usd_rewards(*daily_volume_usd, percent),
                "apr": get_staking_apr(*daily_volume_usd, *staked_usd, percent),
            })
        }
        Command::Build {
            account,
            public_key,
            pred,
            action,
        } => {
            let account = match public_key {
                Some(key) => Account::with_guard(
                    account.clone(),
                    Guard {
                        keys: vec![key.clone()],
                        pred: pred.clone(),
                    },
                ),
                None => Account::named(account.clone()),
            };
            serde_json::to_value(build(app_cfg, chain, &account, action).await?)?
        }
        Command::Submit { signed, preview } => {
            let raw = fs::read_to_string(signed).with_context(|| format!("read {}", signed.display()))?;
            let command = parse_signed(&raw)?;
            submit(chain, &command, *preview).await?
        }
    };
    Ok(output)
}

async fn load_precision(app_cfg: &AppCfg, chain: &dyn ChainClient) -> PrecisionTable {
    let configured = PrecisionTable::from_tokens(&app_cfg.config.tokens);
    if app_cfg.refresh_precision {
        refresh_precision(chain, &configured).await
    } else {
        configured
    }
}

async fn build(
    app_cfg: &AppCfg,
    chain: &dyn ChainClient,
    account: &Account,
    action: &BuildAction,
) -> Result<TransactionDescriptor> {
    let cfg = &app_cfg.config;
    let precision = load_precision(app_cfg, chain).await;
    let ctx = CommandContext::new(chain, &cfg.network, &precision);
    let gas = GasSettings::from(&cfg.gas);
    let staking = StakingCommands::new(ctx);

    let descriptor = match action {
        BuildAction::Vote { kind, proposal } => DaoCommands::new(ctx).vote(*kind, proposal, account, &gas).await,
        BuildAction::Stake { amount } => staking.add_stake(account, *amount, &gas).await,
        BuildAction::Unstake { amount } => staking.unstake(account, *amount, &gas).await,
        BuildAction::Rollup => staking.rollup(account, &gas).await,
        BuildAction::Claim => staking.claim(account, &gas).await,
        BuildAction::RollupUnstake { amount } => staking.rollup_and_unstake(account, *amount, &gas).await,
        BuildAction::RollupClaim => staking.rollup_and_claim(account, &gas).await,
        BuildAction::RollupClaimUnstake { amount } => {
            staking.rollup_claim_and_unstake(account, *amount, &gas).await
        }
        BuildAction::Swap {
            from,
            to,
            amount_in,
            amount_out,
            exact_out,
            slippage,
        } => {
            let request = SwapRequest {
                token0: SwapToken::new(cfg.token(from)?.code.clone(), *amount_in),
                token1: SwapToken::new(cfg.token(to)?.code.clone(), *amount_out),
                direction: if *exact_out {
                    SwapDirection::ExactOut
                } else {
                    SwapDirection::ExactIn
                },
                slippage: *slippage,
            };
            SwapCommands::new(ctx).swap(&request, account, &gas).await
        }
    };

    descriptor.ok_or_else(|| anyhow!("could not build command: account {} was not resolved", account.account))
}

/// Decode a wallet-signed command and check it is complete
pub fn parse_signed(raw: &str) -> Result<SignedCommand, SigningError> {
    let command: SignedCommand =
        serde_json::from_str(raw).map_err(|e| SigningError::SigningFailure(e.to_string()))?;
    if !command.is_fully_signed() {
        return Err(SigningError::SigningFailure("command is missing signatures".to_string()));
    }
    if hash_command(&command.cmd) != command.hash {
        return Err(SigningError::SigningFailure("hash does not match command".to_string()));
    }
    Ok(command)
}

async fn submit(chain: &dyn ChainClient, command: &SignedCommand, preview: bool) -> Result<Value> {
    if preview {
        let response = chain.local_signed(command).await?;
        return Ok(serde_json::to_value(response.result)?);
    }
    let request_key = chain.send(command).await?;
    let result = chain.listen(&request_key).await?;
    if !result.result.is_success() {
        warn!("⚠️ Transaction {} failed", request_key);
    }
    Ok(json!({ "requestKey": request_key, "result": result }))
}

async fn volume_report(cfg: &Config, chain: &dyn ChainClient, days: i64) -> Result<Value> {
    let client = AnalyticsClient::from_config(cfg)?
        .ok_or_else(|| ConfigError::InvalidNetwork("analytics.base_url is not set".to_string()))?;
    let chain_id: u32 = cfg.network.chain_id.parse().context("chain_id")?;

    let to = Utc::now().date_naive();
    let from = to - chrono::Duration::days(days);
    let (volumes, pairs) = futures::join!(
        client.daily_volumes(from, to),
        get_pair_list(chain, &cfg.network, &cfg.pairs)
    );
    let volumes = volumes?;
    let pairs = pairs.data().unwrap_or_default();

    let tokens: Vec<Value> = cfg
        .tokens
        .iter()
        .map(|t| {
            json!({
                "token": t.name,
                "volume24h": get_24h_volume_single_sided(&volumes, t.stats_id(), chain_id),
            })
        })
        .collect();

    let pools: Vec<Value> = pairs
        .iter()
        .map(|p| {
            let volume = get_24h_volume_double_sided(&volumes, &p.token0, &p.token1, &p.token0, chain_id);
            let liquidity = liquidity(p).map_or(0.0, |(l0, l1)| l0 + l1);
            json!({
                "pair": p.name,
                "volume24h": volume,
                "liquidity": liquidity,
                "apr": get_apr(volume.unwrap_or(0.0), liquidity, cfg.analytics.apr_fee),
            })
        })
        .collect();

    Ok(json!({ "tokens": tokens, "pools": pools }))
}
