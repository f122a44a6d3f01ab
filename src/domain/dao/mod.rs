//! Governance proposals and votes

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map};
use tracing::info;

use crate::config::NetworkCfg;
use crate::domain::pact::{
    pact_fetch_local, pact_string, Capability, CommandContext, GasSettings, LocalOutcome, TransactionDescriptor,
};
use crate::infrastructure::chain::ChainClient;
use crate::shared::errors::ConfigError;
use crate::shared::types::Account;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    Approved,
    Refused,
}

impl VoteKind {
    fn function(self) -> &'static str {
        match self {
            VoteKind::Approved => "dao.approved-vote",
            VoteKind::Refused => "dao.refused-vote",
        }
    }
}

impl fmt::Display for VoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteKind::Approved => write!(f, "approved"),
            VoteKind::Refused => write!(f, "refused"),
        }
    }
}

impl FromStr for VoteKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "approved" | "approve" | "yes" => Ok(VoteKind::Approved),
            "refused" | "refuse" | "no" => Ok(VoteKind::Refused),
            other => Err(ConfigError::InvalidVote(other.to_string())),
        }
    }
}

pub struct DaoCommands<'a> {
    ctx: CommandContext<'a>,
}

impl<'a> DaoCommands<'a> {
    pub fn new(ctx: CommandContext<'a>) -> Self {
        Self { ctx }
    }

    /// Vote on `proposal_id`. The account is resolved against the KDX token.
    pub async fn vote(
        &self,
        kind: VoteKind,
        proposal_id: &str,
        account: &Account,
        gas: &GasSettings,
    ) -> Option<TransactionDescriptor> {
        let network = self.ctx.network;
        let account = self.ctx.resolve_account(&network.qualified("kdx"), account).await?;

        let code = format!(
            "({} {} {} )",
            network.qualified(kind.function()),
            pact_string(proposal_id),
            pact_string(&account.account)
        );
        let guard = Capability::new(
            "guard",
            "account GUARD",
            network.qualified("dao.ACCOUNT_GUARD"),
            vec![json!(account.account)],
        );

        info!("🗳️ Building {} vote on {} for {}", kind, proposal_id, account.account);
        self.ctx.descriptor(&account, code, vec![guard], Map::new(), gas)
    }
}

pub async fn get_account_data(chain: &dyn ChainClient, network: &NetworkCfg, account: &str) -> LocalOutcome {
    let code = format!("({} {})", network.qualified("dao.get-account-data"), pact_string(account));
    pact_fetch_local(chain, code).await
}

pub async fn has_account_voted(
    chain: &dyn ChainClient,
    network: &NetworkCfg,
    account: &str,
    proposal_id: &str,
) -> LocalOutcome {
    let code = format!(
        "({} {} {})",
        network.qualified("dao.read-account-vote-proposal"),
        pact_string(account),
        pact_string(proposal_id)
    );
    pact_fetch_local(chain, code).await
}

pub async fn read_all_proposals(chain: &dyn ChainClient, network: &NetworkCfg) -> LocalOutcome {
    pact_fetch_local(chain, format!("({})", network.qualified("dao.read-all-proposals"))).await
}

pub async fn read_single_proposal(chain: &dyn ChainClient, network: &NetworkCfg, proposal_id: &str) -> LocalOutcome {
    let code = format!("({} {})", network.qualified("dao.read-proposal"), pact_string(proposal_id));
    pact_fetch_local(chain, code).await
}
