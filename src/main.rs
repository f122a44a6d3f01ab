use anyhow::Result;
use clap::Parser;
use kaddex_core::app::{self, AppCfg, Command};
use kaddex_core::config::Config;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Kaddex DEX transaction builder and chain query CLI")]
struct Args {
    /// Path to config file (optional)
    #[arg(long)]
    config: Option<String>,

    /// Chainweb node URL (overrides config)
    #[arg(long)]
    node_url: Option<String>,

    /// Network id, e.g. mainnet01 or testnet04
    #[arg(long)]
    network_id: Option<String>,

    #[arg(long)]
    chain_id: Option<String>,

    /// Let the gas station pay for built transactions
    #[arg(long)]
    gas_station: bool,

    #[arg(long)]
    gas_limit: Option<u64>,

    #[arg(long)]
    gas_price: Option<f64>,

    /// Stats service base URL (overrides config)
    #[arg(long)]
    analytics_url: Option<String>,

    /// Use configured token precisions without querying the chain
    #[arg(long)]
    no_refresh: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    // Priority: CLI args > Config file > Defaults
    let mut cfg = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(node_url) = args.node_url {
        cfg.network.node_url = node_url;
    }
    if let Some(network_id) = args.network_id {
        cfg.network.network_id = network_id;
    }
    if let Some(chain_id) = args.chain_id {
        cfg.network.chain_id = chain_id;
    }
    if args.gas_station {
        cfg.gas.gas_station = true;
    }
    if let Some(gas_limit) = args.gas_limit {
        cfg.gas.limit = gas_limit;
    }
    if let Some(gas_price) = args.gas_price {
        cfg.gas.price = gas_price;
    }
    if let Some(url) = args.analytics_url {
        cfg.analytics.base_url = Some(url);
    }

    let mut app_cfg = AppCfg::from_config(cfg)?;
    app_cfg.refresh_precision = !args.no_refresh;

    app::run(app_cfg, args.command).await
}
