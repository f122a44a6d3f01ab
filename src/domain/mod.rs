//! Domain layer - DEX numeric rules, command builders and chain queries

pub mod analytics;
pub mod balance;
pub mod dao;
pub mod pact;
pub mod precision;
pub mod staking;
pub mod swap;
