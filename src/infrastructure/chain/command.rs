//! Pact command envelope construction

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use blake2::{digest::consts::U32, Blake2b, Digest};
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::config::NetworkCfg;
use super::types::{LocalRequest, SignedCommand};

type Blake2b256 = Blake2b<U32>;

pub const LOCAL_GAS_LIMIT: u64 = 150_000;
pub const LOCAL_TTL: u64 = 600;

/// Pact request hash: url-safe unpadded base64 of Blake2b-256
pub fn hash_command(cmd: &str) -> String {
    URL_SAFE_NO_PAD.encode(Blake2b256::digest(cmd.as_bytes()))
}

/// Build an unsigned exec command for `/local`
pub fn local_command(
    network: &NetworkCfg,
    request: &LocalRequest,
    gas_price: f64,
    now: DateTime<Utc>,
) -> Result<SignedCommand, serde_json::Error> {
    let chain_id = request
        .chain_id
        .clone()
        .unwrap_or_else(|| network.chain_id.clone());

    let payload = json!({
        "networkId": network.network_id,
        "payload": {
            "exec": {
                "data": request.data,
                "code": request.code,
            }
        },
        "signers": [],
        "meta": {
            "creationTime": now.timestamp() - network.creation_time_offset_secs,
            "ttl": LOCAL_TTL,
            "gasLimit": LOCAL_GAS_LIMIT,
            "chainId": chain_id,
            "gasPrice": gas_price,
            "sender": "",
        },
        "nonce": now.to_rfc3339(),
    });

    let cmd = serde_json::to_string(&payload)?;
    Ok(SignedCommand {
        hash: hash_command(&cmd),
        sigs: Vec::new(),
        cmd,
    })
}
