//! `NodeClient` backed by the simulated network.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use gateway_client::{CommitStream, NodeClient};
use gateway_types::{
    BlockInfo, ChainInfo, ChaincodeInfo, ChaincodeScope, ChannelId, CommitEvent, CommitFilter,
    GatewayError, NodeId, NodeResponse, OrderRequest, OrderSubmissionResult, OrgName, Proposal,
    Result, TransactionInfo, TxId,
};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::network::SimNetwork;

/// One organization's view of the simulated network.
pub struct SimNodeClient {
    org: OrgName,
    peers: Vec<NodeId>,
    channels: Vec<ChannelId>,
    network: Arc<SimNetwork>,
}

impl SimNodeClient {
    pub fn new(
        org: OrgName,
        peers: Vec<NodeId>,
        channels: Vec<ChannelId>,
        network: Arc<SimNetwork>,
    ) -> Self {
        Self {
            org,
            peers,
            channels,
            network,
        }
    }

    async fn round_trip(&self) {
        let delay = self.network.round_trip();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Organization peers holding `channel`; only they see its blocks.
    fn joined_peers(&self, channel: &ChannelId) -> Vec<NodeId> {
        self.peers
            .iter()
            .filter(|node| self.network.has_joined(node, channel))
            .cloned()
            .collect()
    }

    fn check_peer(&self, node: &NodeId) -> Result<()> {
        if self.peers.contains(node) {
            Ok(())
        } else {
            Err(GatewayError::Query(format!(
                "peer {} is not a member of organization {}",
                node, self.org
            )))
        }
    }
}

#[async_trait]
impl NodeClient for SimNodeClient {
    fn org(&self) -> &OrgName {
        &self.org
    }

    fn has_channel(&self, channel: &ChannelId) -> bool {
        self.channels.contains(channel)
    }

    fn event_nodes(&self, channel: Option<&ChannelId>) -> Vec<NodeId> {
        match channel {
            Some(channel) => self.joined_peers(channel),
            None => self.peers.clone(),
        }
    }

    fn default_endorsers(&self, channel: &ChannelId) -> Vec<NodeId> {
        self.joined_peers(channel)
    }

    async fn send_proposal(
        &self,
        proposal: &Proposal,
        timeout: Duration,
    ) -> Result<Vec<NodeResponse>> {
        let calls = proposal.targets.iter().map(|node| async move {
            let call = async {
                self.round_trip().await;
                self.network.endorse(node, proposal)
            };
            match tokio::time::timeout(timeout, call).await {
                Ok(response) => response,
                Err(_) => {
                    warn!(node = %node, tx_id = %proposal.tx_id, "Proposal timed out");
                    NodeResponse::transport_error(node.clone(), "REQUEST_TIMEOUT")
                }
            }
        });
        Ok(join_all(calls).await)
    }

    async fn submit_order(&self, request: OrderRequest) -> Result<OrderSubmissionResult> {
        self.round_trip().await;
        Ok(self.network.order(request))
    }

    async fn open_commit_listener(
        &self,
        node: &NodeId,
        filter: &CommitFilter,
    ) -> Result<Box<dyn CommitStream>> {
        let receiver = self.network.subscribe(node)?;
        debug!(node = %node, filter = %filter, "Commit listener connected");
        Ok(Box::new(SimCommitStream {
            node: node.clone(),
            receiver: Some(receiver),
        }))
    }

    async fn fetch_genesis_block(&self, channel: &ChannelId) -> Result<Vec<u8>> {
        self.round_trip().await;
        self.network.genesis_block(channel)
    }

    async fn join_channel(
        &self,
        targets: &[NodeId],
        channel: &ChannelId,
        genesis_block: &[u8],
    ) -> Result<Vec<NodeResponse>> {
        let calls = targets.iter().map(|node| async move {
            self.round_trip().await;
            self.network.join(node, channel, genesis_block)
        });
        Ok(join_all(calls).await)
    }

    async fn query_chaincode(
        &self,
        peer: &NodeId,
        channel: &ChannelId,
        chaincode: &str,
        function: &str,
        args: &[String],
    ) -> Result<Vec<u8>> {
        self.check_peer(peer)?;
        self.round_trip().await;
        self.network
            .query_chaincode(peer, channel, chaincode, function, args)
    }

    async fn query_block(
        &self,
        peer: &NodeId,
        channel: &ChannelId,
        number: u64,
    ) -> Result<BlockInfo> {
        self.check_peer(peer)?;
        self.round_trip().await;
        self.network.query_block(peer, channel, number)
    }

    async fn query_transaction(
        &self,
        peer: &NodeId,
        channel: &ChannelId,
        tx_id: &TxId,
    ) -> Result<TransactionInfo> {
        self.check_peer(peer)?;
        self.round_trip().await;
        self.network.query_transaction(peer, channel, tx_id)
    }

    async fn query_chain_info(&self, peer: &NodeId, channel: &ChannelId) -> Result<ChainInfo> {
        self.check_peer(peer)?;
        self.round_trip().await;
        self.network.query_chain_info(peer, channel)
    }

    async fn query_chaincodes(
        &self,
        peer: &NodeId,
        scope: ChaincodeScope,
        channel: Option<&ChannelId>,
    ) -> Result<Vec<ChaincodeInfo>> {
        self.check_peer(peer)?;
        self.round_trip().await;
        self.network.query_chaincodes(peer, scope, channel)
    }

    async fn query_channels(&self, peer: &NodeId) -> Result<Vec<ChannelId>> {
        self.check_peer(peer)?;
        self.round_trip().await;
        self.network.query_channels(peer)
    }
}

/// Subscription on one simulated peer's broadcast stream.
struct SimCommitStream {
    node: NodeId,
    receiver: Option<broadcast::Receiver<CommitEvent>>,
}

#[async_trait]
impl CommitStream for SimCommitStream {
    fn node(&self) -> &NodeId {
        &self.node
    }

    async fn next_event(&mut self) -> Result<Option<CommitEvent>> {
        let Some(receiver) = self.receiver.as_mut() else {
            return Ok(None);
        };
        loop {
            match receiver.recv().await {
                Ok(event) => return Ok(Some(event)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(node = %self.node, skipped, "Commit listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(None),
            }
        }
    }

    fn close(&mut self) {
        if self.receiver.take().is_some() {
            debug!(node = %self.node, "Commit listener disconnected");
        }
    }
}
