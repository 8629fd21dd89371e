//! The node client capability set consumed by the coordinator.
//!
//! A `NodeClient` is a per-organization handle that signs with an enrolled
//! identity and talks to that organization's view of the network. It is
//! read-mostly and shared across operations through an `Arc`.

use std::time::Duration;

use async_trait::async_trait;
use gateway_types::{
    BlockInfo, ChainInfo, ChaincodeInfo, ChaincodeScope, ChannelId, CommitEvent, CommitFilter,
    NodeId, NodeResponse, OrderRequest, OrderSubmissionResult, OrgName, Proposal, Result,
    TransactionInfo, TxId,
};

/// Client for one organization's nodes and the ordering authority.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Organization this client signs for.
    fn org(&self) -> &OrgName;

    /// Create a transaction id; `admin` selects the org admin identity.
    fn new_tx_id(&self, admin: bool) -> TxId {
        let _ = admin;
        TxId::generate()
    }

    /// Whether the organization's network view defines the channel.
    fn has_channel(&self, channel: &ChannelId) -> bool;

    /// Organization-local nodes that emit commit notifications.
    ///
    /// `None` lists every event-emitting node of the organization.
    fn event_nodes(&self, channel: Option<&ChannelId>) -> Vec<NodeId>;

    /// Endorsers used when a caller names no target nodes.
    fn default_endorsers(&self, channel: &ChannelId) -> Vec<NodeId>;

    /// Fan a proposal out to its targets.
    ///
    /// Per-node transport failures come back as failing `NodeResponse`s;
    /// `Err` is reserved for failures of the call as a whole.
    async fn send_proposal(
        &self,
        proposal: &Proposal,
        timeout: Duration,
    ) -> Result<Vec<NodeResponse>>;

    /// Submit an agreed artifact to the ordering authority.
    async fn submit_order(&self, request: OrderRequest) -> Result<OrderSubmissionResult>;

    /// Connect to a node's notification stream and register `filter` on it.
    async fn open_commit_listener(
        &self,
        node: &NodeId,
        filter: &CommitFilter,
    ) -> Result<Box<dyn CommitStream>>;

    /// Fetch the genesis block of a channel from the ordering authority.
    async fn fetch_genesis_block(&self, channel: &ChannelId) -> Result<Vec<u8>>;

    /// Ask the target nodes to join a channel from its genesis block.
    async fn join_channel(
        &self,
        targets: &[NodeId],
        channel: &ChannelId,
        genesis_block: &[u8],
    ) -> Result<Vec<NodeResponse>>;

    /// Evaluate a chaincode function on one peer without ordering.
    async fn query_chaincode(
        &self,
        peer: &NodeId,
        channel: &ChannelId,
        chaincode: &str,
        function: &str,
        args: &[String],
    ) -> Result<Vec<u8>>;

    async fn query_block(&self, peer: &NodeId, channel: &ChannelId, number: u64)
        -> Result<BlockInfo>;

    async fn query_transaction(
        &self,
        peer: &NodeId,
        channel: &ChannelId,
        tx_id: &TxId,
    ) -> Result<TransactionInfo>;

    async fn query_chain_info(&self, peer: &NodeId, channel: &ChannelId) -> Result<ChainInfo>;

    async fn query_chaincodes(
        &self,
        peer: &NodeId,
        scope: ChaincodeScope,
        channel: Option<&ChannelId>,
    ) -> Result<Vec<ChaincodeInfo>>;

    async fn query_channels(&self, peer: &NodeId) -> Result<Vec<ChannelId>>;
}

/// A registered subscription on one node's notification stream.
///
/// `close` unregisters the subscription and releases the connection. The
/// listener pool calls it exactly once per opened stream.
#[async_trait]
pub trait CommitStream: Send {
    /// Node the stream is connected to.
    fn node(&self) -> &NodeId;

    /// Wait for the next notification; `Ok(None)` means the stream ended.
    async fn next_event(&mut self) -> Result<Option<CommitEvent>>;

    /// Unregister and disconnect.
    fn close(&mut self);
}
