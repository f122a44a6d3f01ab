//! Token swaps through the exchange contract and pair reserve queries

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::config::{NetworkCfg, PairCfg};
use crate::domain::balance::{
    extract_decimal, format_number, keep_decimal, reduce_balance, ReducedBalance, DEFAULT_REDUCE_PRECISION,
};
use crate::domain::pact::{
    keyset_env, pact_fetch_local, pact_string, Capability, CommandContext, GasSettings, LocalOutcome,
    TransactionDescriptor,
};
use crate::infrastructure::chain::ChainClient;
use crate::shared::types::{Account, Amount};

/// One side of a swap: token module code and amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapToken {
    pub code: String,
    pub amount: f64,
}

impl SwapToken {
    pub fn new(code: impl Into<String>, amount: f64) -> Self {
        Self {
            code: code.into(),
            amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapDirection {
    /// Exact `token0` in, at least `token1 × (1 − slippage)` out
    ExactIn,
    /// Exact `token1` out, at most `token0 × (1 + slippage)` in
    ExactOut,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwapRequest {
    pub token0: SwapToken,
    pub token1: SwapToken,
    pub direction: SwapDirection,
    /// Fraction, e.g. `0.005` for 0.5%
    pub slippage: f64,
}

pub struct SwapCommands<'a> {
    ctx: CommandContext<'a>,
}

impl<'a> SwapCommands<'a> {
    pub fn new(ctx: CommandContext<'a>) -> Self {
        Self { ctx }
    }

    fn reduce(&self, code: &str, amount: f64) -> ReducedBalance {
        let precision = self.ctx.precision.by_code(code).unwrap_or(DEFAULT_REDUCE_PRECISION);
        reduce_balance(&Amount::Number(amount), precision)
    }

    pub async fn swap(
        &self,
        request: &SwapRequest,
        account: &Account,
        gas: &GasSettings,
    ) -> Option<TransactionDescriptor> {
        let SwapRequest {
            token0,
            token1,
            direction,
            slippage,
        } = request;
        let invalid_amount = |amount: f64| !amount.is_finite() || amount < 0.0;
        if invalid_amount(token0.amount) || invalid_amount(token1.amount) || !slippage.is_finite() {
            warn!(
                "⚠️ Invalid swap amounts {} {} -> {} {} (slippage {})",
                token0.amount, token0.code, token1.amount, token1.code, slippage
            );
            return None;
        }
        let account = self.ctx.resolve_account(&token0.code, account).await?;

        let pair_account = match get_pair_account(self.ctx.chain, self.ctx.network, &token0.code, &token1.code).await
        {
            LocalOutcome::Data(pair_account) => pair_account,
            LocalOutcome::Failed { error_message } => {
                warn!("⚠️ No pair for {}:{}: {}", token0.code, token1.code, error_message);
                return None;
            }
        };

        let token0_amount = self.reduce(&token0.code, token0.amount);
        let token1_amount = self.reduce(&token1.code, token1.amount);
        let token0_with_slippage = self.reduce(&token0.code, token0.amount * (1.0 + slippage));
        let token1_with_slippage = self.reduce(&token1.code, token1.amount * (1.0 - slippage));

        let (function, amount_key, limit_key, transfer_amount) = match direction {
            SwapDirection::ExactIn => ("exchange.swap-exact-in", "token0Amount", "token1AmountWithSlippage", token0_amount),
            SwapDirection::ExactOut => (
                "exchange.swap-exact-out",
                "token1Amount",
                "token0AmountWithSlippage",
                token0_with_slippage,
            ),
        };
        let account_literal = pact_string(&account.account);
        let code = format!(
            "({}\n  (read-decimal '{})\n  (read-decimal '{})\n  [{} {}]\n  {}\n  {}\n  (read-keyset 'user-ks)\n)",
            self.ctx.network.qualified(function),
            amount_key,
            limit_key,
            token0.code,
            token1.code,
            account_literal,
            account_literal,
        );

        let transfer = Capability::new(
            "transfer capability",
            "transfer token in",
            format!("{}.TRANSFER", token0.code),
            vec![json!(account.account), json!(pair_account), json!(transfer_amount)],
        );

        let mut env = keyset_env(&account);
        env.insert("token0Amount".to_string(), json!(token0_amount));
        env.insert("token1Amount".to_string(), json!(token1_amount));
        env.insert("token0AmountWithSlippage".to_string(), json!(token0_with_slippage));
        env.insert("token1AmountWithSlippage".to_string(), json!(token1_with_slippage));

        info!(
            "🔁 Building {:?} swap {} {} -> {} {} for {}",
            direction, token0.amount, token0.code, token1.amount, token1.code, account.account
        );
        self.ctx.descriptor(&account, code, vec![transfer], env, gas)
    }
}

pub async fn get_pair(chain: &dyn ChainClient, network: &NetworkCfg, token0: &str, token1: &str) -> LocalOutcome {
    let code = format!("({} {} {})", network.qualified("exchange.get-pair"), token0, token1);
    pact_fetch_local(chain, code).await
}

/// Account holding the pair's reserves
pub async fn get_pair_account(
    chain: &dyn ChainClient,
    network: &NetworkCfg,
    token0: &str,
    token1: &str,
) -> LocalOutcome<String> {
    let code = format!(
        "(at 'account ({} {} {}))",
        network.qualified("exchange.get-pair"),
        token0,
        token1
    );
    pact_fetch_local(chain, code).await.parse()
}

/// Reserves and liquidity token supply of a configured pair. Pairs the
/// chain did not report keep `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairReserves {
    pub name: String,
    pub token0: String,
    pub token1: String,
    pub is_boosted: bool,
    pub reserves: Option<(Amount, Amount)>,
    pub supply: Option<Amount>,
}

fn pair_tokens_list<'p>(pairs: impl IntoIterator<Item = &'p PairCfg>) -> String {
    pairs
        .into_iter()
        .map(|p| format!("[{} {}] ", p.token0, p.token1))
        .collect()
}

fn pair_list_code(network: &NetworkCfg, pairs: &[PairCfg]) -> String {
    let exchange = network.qualified("exchange");
    let tokens = network.qualified("tokens");
    let list = pair_tokens_list(pairs);
    format!(
        r#"(namespace 'free)
(module {ns}-read G
  (defcap G () true)
  (defun pair-info (pairList:list)
    (let* (
      (token0 (at 0 pairList))
      (token1 (at 1 pairList))
      (p ({exchange}.get-pair token0 token1))
      (reserveA ({exchange}.reserve-for p token0))
      (reserveB ({exchange}.reserve-for p token1))
      (totalBal ({tokens}.total-supply ({exchange}.get-pair-key token0 token1)))
    )
    [({exchange}.get-pair-key token0 token1) reserveA reserveB totalBal]
  ))
)
(map ({ns}-read.pair-info) [{list}])"#,
        ns = network.namespace,
        exchange = exchange,
        tokens = tokens,
        list = list,
    )
}

/// Reserves of every configured pair in one local call, in config order
pub async fn get_pair_list(
    chain: &dyn ChainClient,
    network: &NetworkCfg,
    pairs: &[PairCfg],
) -> LocalOutcome<Vec<PairReserves>> {
    let rows: LocalOutcome<Vec<(String, Amount, Amount, Amount)>> =
        pact_fetch_local(chain, pair_list_code(network, pairs)).await.parse();

    rows.map(|rows| {
        pairs
            .iter()
            .map(|pair| {
                let row = rows.iter().find(|(key, ..)| *key == pair.name);
                PairReserves {
                    name: pair.name.clone(),
                    token0: pair.token0.clone(),
                    token1: pair.token1.clone(),
                    is_boosted: pair.is_boosted,
                    reserves: row.map(|(_, a, b, _)| (a.clone(), b.clone())),
                    supply: row.map(|(.., supply)| supply.clone()),
                }
            })
            .collect()
    })
}

/// An account's liquidity position in one configured pair.
///
/// Boosted pairs report the position through the wrapper contract and carry
/// no `supply`; plain pairs read the liquidity token balance directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairPosition {
    pub name: String,
    pub token0: String,
    pub token1: String,
    pub is_boosted: bool,
    pub balance: Option<Amount>,
    pub supply: Option<Amount>,
    pub reserves: Option<(Amount, Amount)>,
    pub pooled_amount: Option<(Amount, Amount)>,
    pub pool_share: Option<f64>,
}

impl PairPosition {
    fn empty(pair: &PairCfg) -> Self {
        Self {
            name: pair.name.clone(),
            token0: pair.token0.clone(),
            token1: pair.token1.clone(),
            is_boosted: pair.is_boosted,
            balance: None,
            supply: None,
            reserves: None,
            pooled_amount: None,
            pool_share: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct BoostedPosition {
    liquidity: Amount,
    #[serde(rename = "user-pool-share")]
    user_pool_share: Amount,
    #[serde(rename = "totalA")]
    total_a: Amount,
    #[serde(rename = "totalB")]
    total_b: Amount,
    #[serde(rename = "reserveA")]
    reserve_a: Amount,
    #[serde(rename = "reserveB")]
    reserve_b: Amount,
}

/// Key, reserveA, reserveB, supply, balance, pooledA, pooledB
type PlainPositionRow = (String, Amount, Amount, Amount, Amount, Amount, Amount);

fn boosted_positions_code(network: &NetworkCfg, pairs: &[&PairCfg], account: &str) -> String {
    let exchange = network.qualified("exchange");
    let wrapper = network.qualified("wrapper");
    format!(
        r#"(namespace 'free)
(module {ns}-read G
  (defcap G () true)
  (defun pair-info (pairList:list)
    (let* (
      (token0 (at 0 pairList))
      (token1 (at 1 pairList))
      (p ({exchange}.get-pair token0 token1))
      (reserveA ({exchange}.reserve-for p token0))
      (reserveB ({exchange}.reserve-for p token1))
      (result (try {{
        "initialA": 0.0, "feesB": 0.0, "totalB": 0.0, "initialB": 0.0, "feesA": 0.0,
        "liquidity": 0.0, "user-pool-share": 0.0, "totalA": 0.0, "reserveA": 0.0, "reserveB": 0.0
        }} ({wrapper}.get-user-position-stats token0 token1 {account})))
    )
    [{{"initialA": (at 'initialA result),
      "feesB": (at 'feesB result),
      "totalB": (at 'totalB result),
      "initialB": (at 'initialB result),
      "feesA": (at 'feesA result),
      "liquidity": (at 'liquidity result),
      "user-pool-share": (at 'user-pool-share result),
      "totalA": (at 'totalA result),
      "reserveA": reserveA,
      "reserveB": reserveB}}]
  ))
)
(map ({ns}-read.pair-info) [{list}])"#,
        ns = network.namespace,
        exchange = exchange,
        wrapper = wrapper,
        account = pact_string(account),
        list = pair_tokens_list(pairs.iter().copied()),
    )
}

fn plain_positions_code(network: &NetworkCfg, pairs: &[&PairCfg], account: &str) -> String {
    let exchange = network.qualified("exchange");
    let tokens = network.qualified("tokens");
    format!(
        r#"(namespace 'free)
(module {ns}-read G
  (defcap G () true)
  (defun pair-info (pairList:list)
    (let* (
      (token0 (at 0 pairList))
      (token1 (at 1 pairList))
      (p ({exchange}.get-pair token0 token1))
      (reserveA ({exchange}.reserve-for p token0))
      (reserveB ({exchange}.reserve-for p token1))
      (totalBal ({tokens}.total-supply ({exchange}.get-pair-key token0 token1)))
      (acctBal (try 0.0 ({tokens}.get-balance ({exchange}.get-pair-key token0 token1) {account})))
    )
    [({exchange}.get-pair-key token0 token1)
     reserveA
     reserveB
     totalBal
     acctBal
     (* reserveA (/ acctBal totalBal))
     (* reserveB (/ acctBal totalBal))]
  ))
)
(map ({ns}-read.pair-info) [{list}])"#,
        ns = network.namespace,
        exchange = exchange,
        tokens = tokens,
        account = pact_string(account),
        list = pair_tokens_list(pairs.iter().copied()),
    )
}

async fn boosted_positions(
    chain: &dyn ChainClient,
    network: &NetworkCfg,
    pairs: &[&PairCfg],
    account: &str,
) -> LocalOutcome<Vec<PairPosition>> {
    if pairs.is_empty() {
        return LocalOutcome::Data(Vec::new());
    }
    let rows: LocalOutcome<Vec<Vec<BoostedPosition>>> =
        pact_fetch_local(chain, boosted_positions_code(network, pairs, account)).await.parse();

    // rows come back in request order
    rows.map(|rows| {
        pairs
            .iter()
            .enumerate()
            .map(|(i, pair)| {
                let mut position = PairPosition::empty(pair);
                if let Some(stats) = rows.get(i).and_then(|row| row.first()) {
                    position.balance = Some(stats.liquidity.clone());
                    position.reserves = Some((stats.reserve_a.clone(), stats.reserve_b.clone()));
                    position.pooled_amount = Some((stats.total_a.clone(), stats.total_b.clone()));
                    position.pool_share = Some(extract_decimal(&stats.user_pool_share));
                }
                position
            })
            .collect()
    })
}

async fn plain_positions(
    chain: &dyn ChainClient,
    network: &NetworkCfg,
    pairs: &[&PairCfg],
    account: &str,
) -> LocalOutcome<Vec<PairPosition>> {
    if pairs.is_empty() {
        return LocalOutcome::Data(Vec::new());
    }
    let rows: LocalOutcome<Vec<PlainPositionRow>> =
        pact_fetch_local(chain, plain_positions_code(network, pairs, account)).await.parse();

    rows.map(|rows| {
        pairs
            .iter()
            .map(|pair| {
                let mut position = PairPosition::empty(pair);
                if let Some((_, reserve_a, reserve_b, supply, balance, pooled_a, pooled_b)) =
                    rows.iter().find(|row| row.0 == pair.name)
                {
                    position.pool_share = Some(extract_decimal(balance) / extract_decimal(supply));
                    position.balance = Some(balance.clone());
                    position.supply = Some(supply.clone());
                    position.reserves = Some((reserve_a.clone(), reserve_b.clone()));
                    position.pooled_amount = Some((pooled_a.clone(), pooled_b.clone()));
                }
                position
            })
            .collect()
    })
}

/// Liquidity positions of `account` in every configured pair: boosted pairs
/// first, then plain pairs, each group in config order. Fails when either
/// group's query fails.
pub async fn get_pair_list_account_balance(
    chain: &dyn ChainClient,
    network: &NetworkCfg,
    pairs: &[PairCfg],
    account: &str,
) -> LocalOutcome<Vec<PairPosition>> {
    let (boosted, plain): (Vec<&PairCfg>, Vec<&PairCfg>) = pairs.iter().partition(|p| p.is_boosted);
    let (boosted, plain) = futures::join!(
        boosted_positions(chain, network, &boosted, account),
        plain_positions(chain, network, &plain, account)
    );

    match (boosted, plain) {
        (LocalOutcome::Data(mut positions), LocalOutcome::Data(rest)) => {
            positions.extend(rest);
            info!("💧 {} has {} pair positions", account, positions.len());
            LocalOutcome::Data(positions)
        }
        (LocalOutcome::Failed { error_message }, _) | (_, LocalOutcome::Failed { error_message }) => {
            LocalOutcome::Failed { error_message }
        }
    }
}

/// Quote for adding liquidity from a single token: the other side's amount
/// and both slippage-bounded minimums
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneSideLiquidity {
    pub account: String,
    #[serde(rename = "amountB")]
    pub amount_b: Amount,
    #[serde(rename = "amountA-min")]
    pub amount_a_min: Amount,
    #[serde(rename = "amountB-min")]
    pub amount_b_min: Amount,
}

fn one_side_liquidity_code(network: &NetworkCfg, amount_a: f64, slippage: f64, token0: &str, token1: &str) -> String {
    let exchange = network.qualified("exchange");
    let wrapper = network.qualified("wrapper");
    let amount_a = keep_decimal(&format_number(amount_a));
    let slippage = keep_decimal(&format_number(slippage));
    format!(
        r#"(namespace 'free)
(module {ns}-read G
  (defcap G () true)
  (defun pair-info ()
    (let* (
      (p ({exchange}.get-pair {token0} {token1}))
      (pair-account (at 'account p))
      (amountB ({wrapper}.get-other-side-token-amount-after-swap {amount_a} {token0} {token1} (+ 1.0 {slippage})))
      (reserveA ({exchange}.reserve-for p {token0}))
      (amountA-after-swap (- {amount_a} ({wrapper}.get-one-sided-liquidity-swap-amount reserveA {amount_a})))
      (amountA-min ({exchange}.truncate {token0} (* amountA-after-swap (- 1.0 {slippage}))))
      (amountB-min ({exchange}.truncate {token1} (* (/ amountB (+ 1.0 {slippage})) (- 1.0 {slippage}))))
    )
    {{ 'account: pair-account, 'amountB: amountB, 'amountA-min: amountA-min, 'amountB-min: amountB-min }}
  ))
)
({ns}-read.pair-info)"#,
        ns = network.namespace,
        exchange = exchange,
        wrapper = wrapper,
        token0 = token0,
        token1 = token1,
        amount_a = amount_a,
        slippage = slippage,
    )
}

/// Quote a one-sided liquidity deposit of `amount_a` of `token0` into the
/// `token0`/`token1` pair
pub async fn get_one_side_liquidity_pair_info(
    chain: &dyn ChainClient,
    network: &NetworkCfg,
    amount_a: f64,
    slippage: f64,
    token0: &str,
    token1: &str,
) -> LocalOutcome<OneSideLiquidity> {
    if !amount_a.is_finite() || amount_a < 0.0 || !slippage.is_finite() {
        return LocalOutcome::failed(format!("invalid one-sided amount {} (slippage {})", amount_a, slippage));
    }
    let code = one_side_liquidity_code(network, amount_a, slippage, token0, token1);
    pact_fetch_local(chain, code).await.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::domain::pact::command::tests::{gas, guarded_account};
    use crate::domain::precision::PrecisionTable;
    use crate::infrastructure::chain::mock::{failed, ok, MockChain};

    fn request(direction: SwapDirection) -> SwapRequest {
        SwapRequest {
            token0: SwapToken::new("coin", 8.0),
            token1: SwapToken::new("kaddex.kdx", 4.0),
            direction,
            slippage: 0.25,
        }
    }

    fn pair_chain() -> MockChain {
        MockChain::new(|req| {
            if req.code.starts_with("(at 'account") {
                Ok(ok(json!("pair-account")))
            } else {
                Ok(failed("unexpected"))
            }
        })
    }

    #[tokio::test]
    async fn test_swap_exact_in() {
        let chain = pair_chain();
        let cfg = Config::default();
        let table = PrecisionTable::from_tokens(&cfg.tokens);
        let swap = SwapCommands::new(CommandContext::new(&chain, &cfg.network, &table));

        let cmd = swap
            .swap(&request(SwapDirection::ExactIn), &guarded_account(), &gas(false))
            .await
            .unwrap();

        assert!(cmd.pact_code.starts_with("(kaddex.exchange.swap-exact-in"));
        assert!(cmd.pact_code.contains("(read-decimal 'token0Amount)\n  (read-decimal 'token1AmountWithSlippage)"));
        assert!(cmd.pact_code.contains("[coin kaddex.kdx]"));
        assert!(cmd.pact_code.contains("(read-keyset 'user-ks)"));
        assert_eq!(cmd.capability_names(), vec!["coin.GAS", "coin.TRANSFER"]);
        assert_eq!(
            cmd.caps[1].cap.args,
            vec![json!("k:alice"), json!("pair-account"), json!(8.0)]
        );
        assert_eq!(cmd.env_data["token0Amount"], json!(8.0));
        assert_eq!(cmd.env_data["token1Amount"], json!(4.0));
        assert_eq!(cmd.env_data["token0AmountWithSlippage"], json!(10.0));
        assert_eq!(cmd.env_data["token1AmountWithSlippage"], json!(3.0));
        assert_eq!(cmd.env_data["user-ks"]["keys"][0], "alice-key");
    }

    #[tokio::test]
    async fn test_swap_exact_out_transfers_padded_input() {
        let chain = pair_chain();
        let cfg = Config::default();
        let table = PrecisionTable::from_tokens(&cfg.tokens);
        let swap = SwapCommands::new(CommandContext::new(&chain, &cfg.network, &table));

        let cmd = swap
            .swap(&request(SwapDirection::ExactOut), &guarded_account(), &gas(true))
            .await
            .unwrap();

        assert!(cmd.pact_code.starts_with("(kaddex.exchange.swap-exact-out"));
        assert!(cmd.pact_code.contains("(read-decimal 'token1Amount)\n  (read-decimal 'token0AmountWithSlippage)"));
        assert_eq!(cmd.caps[1].cap.args[2], json!(10.0));
        assert_eq!(cmd.capability_names()[0], "kaddex.gas-station.GAS_PAYER");
    }

    #[tokio::test]
    async fn test_swap_amounts_truncated_to_precision() {
        let chain = pair_chain();
        let mut cfg = Config::default();
        cfg.tokens[1].precision = 2;
        let table = PrecisionTable::from_tokens(&cfg.tokens);
        let swap = SwapCommands::new(CommandContext::new(&chain, &cfg.network, &table));

        let mut req = request(SwapDirection::ExactIn);
        req.token1.amount = 1.23456;
        let cmd = swap.swap(&req, &guarded_account(), &gas(false)).await.unwrap();
        assert_eq!(cmd.env_data["token1Amount"], json!(1.23));
    }

    #[tokio::test]
    async fn test_swap_without_pair_is_none() {
        let chain = MockChain::failure("pair not found");
        let cfg = Config::default();
        let table = PrecisionTable::from_tokens(&cfg.tokens);
        let swap = SwapCommands::new(CommandContext::new(&chain, &cfg.network, &table));

        let cmd = swap
            .swap(&request(SwapDirection::ExactIn), &guarded_account(), &gas(false))
            .await;
        assert!(cmd.is_none());
    }

    #[tokio::test]
    async fn test_swap_resolves_on_input_token() {
        let chain = MockChain::failure("row not found");
        let cfg = Config::default();
        let table = PrecisionTable::from_tokens(&cfg.tokens);
        let swap = SwapCommands::new(CommandContext::new(&chain, &cfg.network, &table));

        let cmd = swap
            .swap(&request(SwapDirection::ExactIn), &Account::named("k:bob"), &gas(false))
            .await;
        assert!(cmd.is_none());
        assert_eq!(chain.codes(), vec!["(coin.details \"k:bob\")".to_string()]);
    }

    #[tokio::test]
    async fn test_get_pair_list() {
        let chain = MockChain::success(json!([
            ["coin:kaddex.kdx", { "decimal": "1000.5" }, { "decimal": "250.25" }, { "decimal": "500.0" }]
        ]));
        let cfg = Config::default();

        let pairs = get_pair_list(&chain, &cfg.network, &cfg.pairs).await.data().unwrap();
        assert_eq!(pairs.len(), cfg.pairs.len());
        assert_eq!(
            pairs[0].reserves,
            Some((Amount::decimal("1000.5"), Amount::decimal("250.25")))
        );
        assert_eq!(pairs[0].supply, Some(Amount::decimal("500.0")));
        assert!(pairs[0].is_boosted);
        assert_eq!(pairs[1].reserves, None);

        let code = &chain.codes()[0];
        assert!(code.contains("[coin kaddex.kdx] [coin runonflux.flux] "));
        assert!(code.contains("(module kaddex-read G"));
    }

    #[tokio::test]
    async fn test_get_pair_list_failure() {
        let chain = MockChain::failure("module not found");
        let cfg = Config::default();
        let outcome = get_pair_list(&chain, &cfg.network, &cfg.pairs).await;
        assert_eq!(outcome.error_message(), Some("module not found"));
    }

    #[tokio::test]
    async fn test_get_pair_code() {
        let chain = MockChain::success(json!({ "account": "pair-account" }));
        let cfg = Config::default();
        assert!(get_pair(&chain, &cfg.network, "coin", "kaddex.kdx").await.is_success());
        assert_eq!(chain.codes()[0], "(kaddex.exchange.get-pair coin kaddex.kdx)");
    }

    #[tokio::test]
    async fn test_swap_invalid_amount_yields_none() {
        let chain = pair_chain();
        let cfg = Config::default();
        let table = PrecisionTable::from_tokens(&cfg.tokens);
        let swap = SwapCommands::new(CommandContext::new(&chain, &cfg.network, &table));

        let mut req = request(SwapDirection::ExactIn);
        req.token0.amount = f64::NAN;
        assert!(swap.swap(&req, &guarded_account(), &gas(false)).await.is_none());

        let mut req = request(SwapDirection::ExactOut);
        req.token1.amount = -4.0;
        assert!(swap.swap(&req, &guarded_account(), &gas(false)).await.is_none());

        let mut req = request(SwapDirection::ExactIn);
        req.slippage = f64::INFINITY;
        assert!(swap.swap(&req, &guarded_account(), &gas(false)).await.is_none());

        // rejected before any chain lookup
        assert!(chain.codes().is_empty());
    }

    #[tokio::test]
    async fn test_pair_list_account_balance() {
        let chain = MockChain::new(|req| {
            if req.code.contains("get-user-position-stats") {
                Ok(ok(json!([[{
                    "initialA": 1.0, "feesB": 0.0, "totalB": 20.0, "initialB": 2.0, "feesA": 0.0,
                    "liquidity": { "decimal": "5.5" }, "user-pool-share": 0.25, "totalA": 10.0,
                    "reserveA": 1000.0, "reserveB": 250.0
                }]])))
            } else if req.code.contains("get-balance") {
                Ok(ok(json!([["coin:runonflux.flux", 400.0, 100.0, 50.0, 5.0, 40.0, 10.0]])))
            } else {
                Ok(failed("unexpected"))
            }
        });
        let cfg = Config::default();

        let positions = get_pair_list_account_balance(&chain, &cfg.network, &cfg.pairs, "k:alice")
            .await
            .data()
            .unwrap();
        assert_eq!(positions.len(), 2);

        let boosted = &positions[0];
        assert_eq!(boosted.name, "coin:kaddex.kdx");
        assert!(boosted.is_boosted);
        assert_eq!(boosted.balance, Some(Amount::decimal("5.5")));
        assert_eq!(boosted.pool_share, Some(0.25));
        assert_eq!(boosted.pooled_amount, Some((Amount::Number(10.0), Amount::Number(20.0))));
        assert_eq!(boosted.supply, None);

        let plain = &positions[1];
        assert_eq!(plain.name, "coin:runonflux.flux");
        assert_eq!(plain.supply, Some(Amount::Number(50.0)));
        assert_eq!(plain.balance, Some(Amount::Number(5.0)));
        assert_eq!(plain.pool_share, Some(0.1));
        assert_eq!(plain.reserves, Some((Amount::Number(400.0), Amount::Number(100.0))));

        let codes = chain.codes();
        assert_eq!(codes.len(), 2);
        let boosted_code = codes.iter().find(|c| c.contains("get-user-position-stats")).unwrap();
        assert!(boosted_code.contains("(kaddex.wrapper.get-user-position-stats token0 token1 \"k:alice\")"));
        assert!(boosted_code.contains("[coin kaddex.kdx] ]"));
        let plain_code = codes.iter().find(|c| c.contains("get-balance")).unwrap();
        assert!(plain_code.contains("[coin runonflux.flux] ]"));
        assert!(plain_code.contains("(try 0.0 (kaddex.tokens.get-balance"));
    }

    #[tokio::test]
    async fn test_pair_list_account_balance_failure() {
        let chain = MockChain::new(|req| {
            if req.code.contains("get-balance") {
                Ok(failed("tokens module missing"))
            } else {
                Ok(ok(json!([])))
            }
        });
        let cfg = Config::default();
        let outcome = get_pair_list_account_balance(&chain, &cfg.network, &cfg.pairs, "k:alice").await;
        assert_eq!(outcome.error_message(), Some("tokens module missing"));
    }

    #[tokio::test]
    async fn test_one_side_liquidity_pair_info() {
        let chain = MockChain::success(json!({
            "account": "pair-account",
            "amountB": { "decimal": "2.5" },
            "amountA-min": 4.9,
            "amountB-min": 2.4
        }));
        let cfg = Config::default();

        let quote = get_one_side_liquidity_pair_info(&chain, &cfg.network, 10.0, 0.01, "coin", "kaddex.kdx")
            .await
            .data()
            .unwrap();
        assert_eq!(quote.account, "pair-account");
        assert_eq!(quote.amount_b, Amount::decimal("2.5"));
        assert_eq!(quote.amount_a_min, Amount::Number(4.9));

        let code = &chain.codes()[0];
        assert!(code.contains("(kaddex.wrapper.get-other-side-token-amount-after-swap 10.0 coin kaddex.kdx (+ 1.0 0.01))"));
        assert!(code.contains("(kaddex.exchange.truncate coin (* amountA-after-swap (- 1.0 0.01)))"));
        assert!(code.trim_end().ends_with("(kaddex-read.pair-info)"));
    }

    #[tokio::test]
    async fn test_one_side_liquidity_rejects_invalid_amount() {
        let chain = MockChain::failure("unused");
        let cfg = Config::default();
        let outcome = get_one_side_liquidity_pair_info(&chain, &cfg.network, f64::NAN, 0.01, "coin", "kaddex.kdx").await;
        assert!(!outcome.is_success());
        assert!(chain.codes().is_empty());
    }
}
