//! Kaddex DEX core
//!
//! Numeric normalization for Pact amounts, unsigned transaction builders
//! for staking, governance and swaps, and read-only chain queries.

pub mod app;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod shared;

// Re-export main types for convenience
pub use config::Config;
pub use domain::pact::{CommandContext, GasSettings, LocalOutcome, TransactionDescriptor};
pub use domain::precision::PrecisionTable;
pub use infrastructure::chain::{ChainClient, PactHttpClient};
pub use shared::types::{Account, Amount};
