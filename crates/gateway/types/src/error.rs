//! Error taxonomy for gateway operations.
//!
//! Per-node proposal and listener failures are folded into the aggregate
//! outcome by the coordinator; these variants are what it folds them into.

use crate::{ChannelId, NodeId, OrgName};
use thiserror::Error;

/// Errors raised by the gateway and its collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Missing or malformed driver input.
    #[error("{0}")]
    Validation(String),

    /// The requested user has no enrolled identity in the organization.
    #[error("User was not found: {user} ({org})")]
    IdentityNotFound { org: OrgName, user: String },

    /// The organization's network view does not define the channel.
    #[error("Channel {0} was not defined in the connection profile")]
    ChannelNotFound(ChannelId),

    /// Channel configuration bytes could not be read.
    #[error("Failed to read channel config {path}: {reason}")]
    ChannelConfig { path: String, reason: String },

    /// Sending a proposal (or join request) to a node failed.
    #[error("Proposal transport error on {node}: {reason}")]
    ProposalTransport { node: NodeId, reason: String },

    /// Some node disagreed or failed to respond.
    #[error("Failed to send Proposal and receive all good ProposalResponse: {0}")]
    QuorumRejected(String),

    /// The ordering authority returned a non-success status.
    #[error("Failed to order the transaction. Error code: {0}")]
    OrderRejected(String),

    /// A listener observed a non-valid commit code.
    #[error("The {operation} transaction was invalid, code:{code}")]
    CommitInvalid {
        node: NodeId,
        operation: String,
        code: String,
    },

    /// A listener observed a config block for a different channel.
    #[error("Unknown channel block event received from {node}")]
    UnexpectedChannelBlock { node: NodeId, channel: ChannelId },

    /// A listener's timer fired before any matching notification.
    #[error("REQUEST_TIMEOUT:{node}")]
    CommitTimeout { node: NodeId, timeout_ms: u64 },

    /// Transport failure on a notification stream.
    #[error("Problem setting up the event hub :{reason}")]
    ListenerConnection { node: NodeId, reason: String },

    /// A forwarded read-only query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

impl GatewayError {
    /// Create a validation error for a missing request field.
    pub fn missing(field: &str) -> Self {
        Self::Validation(format!("Missing {}", field))
    }

    /// True for input errors that must be rejected before the core runs.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Node the failure is attributed to, when there is one.
    pub fn node(&self) -> Option<&NodeId> {
        match self {
            Self::ProposalTransport { node, .. }
            | Self::CommitInvalid { node, .. }
            | Self::UnexpectedChannelBlock { node, .. }
            | Self::CommitTimeout { node, .. }
            | Self::ListenerConnection { node, .. } => Some(node),
            _ => None,
        }
    }
}
