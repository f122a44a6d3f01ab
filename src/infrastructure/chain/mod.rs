//! Pact API access for Kadena chainweb nodes

mod command;
mod pact_client;
mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use command::{hash_command, local_command, LOCAL_GAS_LIMIT, LOCAL_TTL};
pub use pact_client::PactHttpClient;
pub use types::{CommandResult, LocalRequest, LocalResponse, PactErrorDetail, PactResult, SignedCommand, UserSig};

use async_trait::async_trait;
use crate::shared::errors::ChainError;

/// Chain RPC boundary consumed by queries and builders
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Read-only execution of unsigned Pact code
    async fn local(&self, request: &LocalRequest) -> Result<LocalResponse, ChainError>;

    /// Read-only execution of a wallet-signed command (preview before send)
    async fn local_signed(&self, command: &SignedCommand) -> Result<LocalResponse, ChainError>;

    /// Submit a signed command, returns its request key
    async fn send(&self, command: &SignedCommand) -> Result<String, ChainError>;

    /// Block until the command identified by `request_key` is mined
    async fn listen(&self, request_key: &str) -> Result<CommandResult, ChainError>;
}
