//! Read-only query result types
//!
//! Forwarded queries are single calls against one peer; these are the shapes
//! they return.

use crate::{ChannelId, TxId, ValidationCode};
use serde::{Deserialize, Serialize};

/// Summary of one block on a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub channel: ChannelId,
    pub number: u64,
    pub hash: String,
    pub previous_hash: String,
    pub tx_ids: Vec<TxId>,
    pub committed_at: chrono::DateTime<chrono::Utc>,
}

/// Height and head hashes of a channel's chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    pub channel: ChannelId,
    pub height: u64,
    pub current_block_hash: String,
    pub previous_block_hash: String,
}

/// A committed transaction as seen by a peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInfo {
    pub tx_id: TxId,
    pub channel: ChannelId,
    pub block_number: u64,
    pub validation_code: ValidationCode,
}

/// An installed or instantiated chaincode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeInfo {
    pub name: String,
    pub version: String,
    pub path: String,
}

impl std::fmt::Display for ChaincodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "name: {}, version: {}, path: {}",
            self.name, self.version, self.path
        )
    }
}

/// Which chaincode registry a query targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChaincodeScope {
    /// Packages installed on the peer's filesystem.
    Installed,
    /// Chaincodes instantiated on a channel.
    Instantiated,
}
