//! Ordering and commit-notification types

use crate::{ChannelId, NodeResponse, Proposal, TxId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Artifact handed to the ordering authority.
///
/// Signing is the node client's concern; the gateway only assembles the
/// request from the endorsed proposal (or the raw channel config).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderRequest {
    /// An endorsed transaction together with its endorsements.
    Transaction {
        tx_id: TxId,
        proposal: Proposal,
        endorsements: Vec<NodeResponse>,
    },

    /// A channel configuration update creating a new channel.
    CreateChannel {
        tx_id: TxId,
        channel: ChannelId,
        /// Config envelope bytes, passed through opaquely.
        config: Vec<u8>,
    },
}

impl OrderRequest {
    pub fn tx_id(&self) -> &TxId {
        match self {
            Self::Transaction { tx_id, .. } | Self::CreateChannel { tx_id, .. } => tx_id,
        }
    }
}

/// Status reported by the ordering authority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Success,
    Failure(String),
}

/// Outcome of one submission to the ordering authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSubmissionResult {
    pub status: OrderStatus,
}

impl OrderSubmissionResult {
    pub fn success() -> Self {
        Self {
            status: OrderStatus::Success,
        }
    }

    pub fn failure(code: impl Into<String>) -> Self {
        Self {
            status: OrderStatus::Failure(code.into()),
        }
    }

    /// Parse the orderer's status string ("SUCCESS" or an error code).
    pub fn from_status(status: &str) -> Self {
        if status == "SUCCESS" {
            Self::success()
        } else {
            Self::failure(status)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, OrderStatus::Success)
    }

    /// Error code carried by a failed submission.
    pub fn failure_code(&self) -> Option<&str> {
        match &self.status {
            OrderStatus::Success => None,
            OrderStatus::Failure(code) => Some(code),
        }
    }
}

/// Transaction validation code reported in a commit notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationCode(String);

impl ValidationCode {
    /// The canonical code for a transaction committed as valid.
    pub const VALID: &'static str = "VALID";

    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn valid() -> Self {
        Self(Self::VALID.to_string())
    }

    pub fn is_valid(&self) -> bool {
        self.0 == Self::VALID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A notification delivered on a node's event stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CommitEvent {
    /// A transaction reached a terminal state on the node's ledger.
    Transaction {
        tx_id: TxId,
        code: ValidationCode,
        block_number: u64,
    },

    /// A block was appended to one of the node's channels.
    Block {
        channel: ChannelId,
        block_number: u64,
        /// Number of transactions in the block (config blocks carry one).
        tx_count: usize,
    },
}

/// What a commit listener is waiting for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "watch", content = "id", rename_all = "snake_case")]
pub enum CommitFilter {
    /// Commit notification for a transaction id.
    Transaction(TxId),
    /// Arrival of a channel's config block (channel join).
    ChannelBlock(ChannelId),
}

impl fmt::Display for CommitFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitFilter::Transaction(tx_id) => write!(f, "tx:{}", tx_id),
            CommitFilter::ChannelBlock(channel) => write!(f, "block:{}", channel),
        }
    }
}
