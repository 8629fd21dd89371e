//! Proposal types for the endorsement phase
//!
//! A Proposal is built by an operation driver, sent once to its target
//! nodes, and answered by one NodeResponse per target.

use crate::{ChannelId, NodeId, TxId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status code a node returns for a successfully endorsed proposal.
pub const STATUS_OK: u16 = 200;

/// Status code used for node-level failures that produced no real response.
pub const STATUS_UNAVAILABLE: u16 = 503;

/// The ledger-changing operations the gateway drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    CreateChannel,
    JoinChannel,
    InstallChaincode,
    InstantiateChaincode,
    InvokeTransaction,
}

impl OperationKind {
    /// Human-readable label used in log lines and commit messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CreateChannel => "create channel",
            Self::JoinChannel => "join channel",
            Self::InstallChaincode => "install chaincode",
            Self::InstantiateChaincode => "chaincode instantiate",
            Self::InvokeTransaction => "invoke chaincode",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Runtime a chaincode package is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChaincodeType {
    Golang,
    Node,
    Java,
}

impl fmt::Display for ChaincodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChaincodeType::Golang => write!(f, "golang"),
            ChaincodeType::Node => write!(f, "node"),
            ChaincodeType::Java => write!(f, "java"),
        }
    }
}

/// Identity of a chaincode package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeSpec {
    pub name: String,
    pub version: String,
    pub chaincode_type: ChaincodeType,
}

/// Operation-specific body of a proposal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProposalPayload {
    /// Install a chaincode package on the target nodes.
    Install {
        chaincode: ChaincodeSpec,
        /// Source path of the package, passed through opaquely.
        path: String,
    },

    /// Instantiate an installed chaincode on a channel.
    Instantiate {
        channel: ChannelId,
        chaincode: ChaincodeSpec,
        /// Init function; omitted means the chaincode default.
        function: Option<String>,
        args: Vec<String>,
    },

    /// Invoke a chaincode function on a channel.
    Invoke {
        channel: ChannelId,
        chaincode: String,
        function: String,
        args: Vec<String>,
    },
}

impl ProposalPayload {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Install { .. } => OperationKind::InstallChaincode,
            Self::Instantiate { .. } => OperationKind::InstantiateChaincode,
            Self::Invoke { .. } => OperationKind::InvokeTransaction,
        }
    }

    /// Channel the proposal targets, if any (install is channel-less).
    pub fn channel(&self) -> Option<&ChannelId> {
        match self {
            Self::Install { .. } => None,
            Self::Instantiate { channel, .. } | Self::Invoke { channel, .. } => Some(channel),
        }
    }
}

/// A tentative operation submitted to nodes for endorsement.
///
/// Immutable once sent: the coordinator only ever borrows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub tx_id: TxId,
    pub targets: Vec<NodeId>,
    pub payload: ProposalPayload,
}

impl Proposal {
    pub fn new(tx_id: TxId, targets: Vec<NodeId>, payload: ProposalPayload) -> Self {
        Self {
            tx_id,
            targets,
            payload,
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.payload.kind()
    }
}

/// One node's answer to a proposal (or to a join request).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeResponse {
    pub node: NodeId,
    pub status: u16,
    pub message: String,
    /// Endorsement signature/payload returned on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endorsement: Option<Vec<u8>>,
}

impl NodeResponse {
    pub fn ok(node: NodeId, endorsement: Vec<u8>) -> Self {
        Self {
            node,
            status: STATUS_OK,
            message: String::new(),
            endorsement: Some(endorsement),
        }
    }

    pub fn rejected(node: NodeId, status: u16, message: impl Into<String>) -> Self {
        Self {
            node,
            status,
            message: message.into(),
            endorsement: None,
        }
    }

    /// Fold a transport failure into a failing response.
    pub fn transport_error(node: NodeId, reason: impl fmt::Display) -> Self {
        Self::rejected(node, STATUS_UNAVAILABLE, reason.to_string())
    }

    /// Entry for a target that never answered.
    pub fn missing(node: NodeId) -> Self {
        let message = format!("no response from {}", node);
        Self::rejected(node, STATUS_UNAVAILABLE, message)
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Failure description used in verdict reasons.
    pub fn describe_failure(&self) -> String {
        if self.message.is_empty() {
            format!("{} returned status {}", self.node, self.status)
        } else {
            format!("{} returned status {}: {}", self.node, self.status, self.message)
        }
    }
}

/// Decision over a full response set. Derived, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumVerdict {
    pub accepted: bool,
    /// Per-node failure descriptions, in response order.
    pub reasons: Vec<String>,
}

impl QuorumVerdict {
    pub fn accept() -> Self {
        Self {
            accepted: true,
            reasons: Vec::new(),
        }
    }

    pub fn reject(reasons: Vec<String>) -> Self {
        Self {
            accepted: false,
            reasons,
        }
    }
}
