//! Scripted node client for tests.
//!
//! Every call is appended to a journal with a sequence number and timestamp
//! so tests can check call ordering (listeners opened before the order is
//! submitted) and cleanup (every opened stream closed exactly once).
//!
//! Commit streams behave like a real network: notifications are only
//! delivered once the ordering authority has accepted the transaction (or a
//! join request has been sent), so a rejected order leaves listeners silent.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gateway_types::{
    BlockInfo, ChainInfo, ChaincodeInfo, ChaincodeScope, ChannelId, CommitEvent, CommitFilter,
    GatewayError, NodeId, NodeResponse, OrderRequest, OrderSubmissionResult, OrgName, Proposal,
    Result, TransactionInfo, TxId, ValidationCode,
};
use tokio::sync::watch;
use tracing::debug;

use crate::node::{CommitStream, NodeClient};

/// How a node answers a proposal or join request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalScript {
    /// Respond with status 200 and an endorsement.
    Endorse,
    /// Respond with a non-success status.
    Reject { status: u16, message: String },
    /// The request fails in transport.
    TransportError(String),
    /// The node never answers and is left out of the response set.
    NoResponse,
}

/// How a node's commit stream behaves once registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitScript {
    /// Deliver the awaited notification with this validation code.
    Commit(ValidationCode),
    /// Deliver a config block for a different channel.
    ForeignBlock(ChannelId),
    /// Never deliver anything.
    Silent,
    /// Fail the stream with a transport error.
    StreamError(String),
    /// End the stream without a notification.
    StreamEnd,
    /// Refuse the connection when the listener is opened.
    Refuse(String),
}

/// A recorded call on the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCallKind {
    SendProposal { tx_id: TxId, targets: Vec<NodeId> },
    SubmitOrder { tx_id: TxId },
    OpenListener { node: NodeId, filter: CommitFilter },
    CloseListener { node: NodeId },
    FetchGenesisBlock { channel: ChannelId },
    JoinChannel { channel: ChannelId, targets: Vec<NodeId> },
    Query { peer: NodeId },
}

/// Journal entry.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub seq: usize,
    pub at: DateTime<Utc>,
    pub kind: MockCallKind,
}

#[derive(Default)]
struct Journal {
    calls: Mutex<Vec<MockCall>>,
}

impl Journal {
    fn record(&self, kind: MockCallKind) {
        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        let seq = calls.len();
        calls.push(MockCall {
            seq,
            at: Utc::now(),
            kind,
        });
    }

    fn snapshot(&self) -> Vec<MockCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Scripted, journaling `NodeClient`.
pub struct MockNodeClient {
    org: OrgName,
    peers: Vec<NodeId>,
    channels: HashSet<ChannelId>,
    proposal_scripts: HashMap<NodeId, ProposalScript>,
    join_scripts: HashMap<NodeId, ProposalScript>,
    commit_scripts: HashMap<NodeId, CommitScript>,
    order_status: String,
    fanout_failure: Option<String>,
    unrelated_events: bool,
    query_payload: Vec<u8>,
    journal: Arc<Journal>,
    released: watch::Sender<bool>,
}

impl MockNodeClient {
    /// Create a mock for `org` with no peers, where ordering succeeds.
    pub fn new(org: impl Into<String>) -> Self {
        let (released, _) = watch::channel(false);
        Self {
            org: OrgName::new(org),
            peers: Vec::new(),
            channels: HashSet::new(),
            proposal_scripts: HashMap::new(),
            join_scripts: HashMap::new(),
            commit_scripts: HashMap::new(),
            order_status: "SUCCESS".to_string(),
            fanout_failure: None,
            unrelated_events: false,
            query_payload: Vec::new(),
            journal: Arc::new(Journal::default()),
            released,
        }
    }

    /// Organization peers; they endorse, join and commit as valid by default.
    pub fn with_peers<I, S>(mut self, peers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.peers = peers.into_iter().map(|p| NodeId::new(p)).collect();
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channels.insert(ChannelId::new(channel));
        self
    }

    pub fn with_proposal_script(mut self, peer: impl Into<String>, script: ProposalScript) -> Self {
        self.proposal_scripts.insert(NodeId::new(peer), script);
        self
    }

    pub fn with_join_script(mut self, peer: impl Into<String>, script: ProposalScript) -> Self {
        self.join_scripts.insert(NodeId::new(peer), script);
        self
    }

    pub fn with_commit_script(mut self, peer: impl Into<String>, script: CommitScript) -> Self {
        self.commit_scripts.insert(NodeId::new(peer), script);
        self
    }

    /// Status string the ordering authority answers with.
    pub fn with_order_status(mut self, status: impl Into<String>) -> Self {
        self.order_status = status.into();
        self
    }

    /// Fail every proposal fan-out as a whole instead of per node.
    pub fn with_fanout_failure(mut self, reason: impl Into<String>) -> Self {
        self.fanout_failure = Some(reason.into());
        self
    }

    /// Deliver notifications for other transactions and non-config blocks
    /// before the awaited one.
    pub fn with_unrelated_events(mut self) -> Self {
        self.unrelated_events = true;
        self
    }

    pub fn with_query_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.query_payload = payload.into();
        self
    }

    /// All recorded calls in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.journal.snapshot()
    }

    /// Number of listener connections opened successfully.
    pub fn opened_listeners(&self) -> usize {
        self.count(|kind| matches!(kind, MockCallKind::OpenListener { .. }))
    }

    /// Number of `close` calls across all streams.
    pub fn closed_listeners(&self) -> usize {
        self.count(|kind| matches!(kind, MockCallKind::CloseListener { .. }))
    }

    /// Number of `close` calls on streams for `node`.
    pub fn closes_for(&self, node: &str) -> usize {
        self.count(|kind| matches!(kind, MockCallKind::CloseListener { node: n } if n.as_str() == node))
    }

    pub fn order_submissions(&self) -> usize {
        self.count(|kind| matches!(kind, MockCallKind::SubmitOrder { .. }))
    }

    fn count(&self, predicate: impl Fn(&MockCallKind) -> bool) -> usize {
        self.journal
            .snapshot()
            .iter()
            .filter(|call| predicate(&call.kind))
            .count()
    }

    fn answer(&self, node: &NodeId, script: Option<&ProposalScript>, tx: &str) -> Option<NodeResponse> {
        if !self.peers.contains(node) {
            return Some(NodeResponse::transport_error(
                node.clone(),
                format!("unknown peer {}", node),
            ));
        }
        match script.unwrap_or(&ProposalScript::Endorse) {
            ProposalScript::Endorse => Some(NodeResponse::ok(
                node.clone(),
                format!("endorsed:{}:{}", node, tx).into_bytes(),
            )),
            ProposalScript::Reject { status, message } => Some(NodeResponse::rejected(
                node.clone(),
                *status,
                message.clone(),
            )),
            ProposalScript::TransportError(reason) => {
                Some(NodeResponse::transport_error(node.clone(), reason))
            }
            ProposalScript::NoResponse => None,
        }
    }

    fn require_peer(&self, peer: &NodeId) -> Result<()> {
        if self.peers.contains(peer) {
            Ok(())
        } else {
            Err(GatewayError::Query(format!("unknown peer {}", peer)))
        }
    }
}

#[async_trait]
impl NodeClient for MockNodeClient {
    fn org(&self) -> &OrgName {
        &self.org
    }

    fn has_channel(&self, channel: &ChannelId) -> bool {
        self.channels.contains(channel)
    }

    fn event_nodes(&self, _channel: Option<&ChannelId>) -> Vec<NodeId> {
        self.peers.clone()
    }

    fn default_endorsers(&self, _channel: &ChannelId) -> Vec<NodeId> {
        self.peers.clone()
    }

    async fn send_proposal(
        &self,
        proposal: &Proposal,
        _timeout: Duration,
    ) -> Result<Vec<NodeResponse>> {
        self.journal.record(MockCallKind::SendProposal {
            tx_id: proposal.tx_id.clone(),
            targets: proposal.targets.clone(),
        });

        if let Some(reason) = &self.fanout_failure {
            return Err(GatewayError::Internal(reason.clone()));
        }

        Ok(proposal
            .targets
            .iter()
            .filter_map(|node| {
                self.answer(node, self.proposal_scripts.get(node), proposal.tx_id.as_str())
            })
            .collect())
    }

    async fn submit_order(&self, request: OrderRequest) -> Result<OrderSubmissionResult> {
        self.journal.record(MockCallKind::SubmitOrder {
            tx_id: request.tx_id().clone(),
        });

        let result = OrderSubmissionResult::from_status(&self.order_status);
        if result.is_success() {
            self.released.send_replace(true);
        }
        Ok(result)
    }

    async fn open_commit_listener(
        &self,
        node: &NodeId,
        filter: &CommitFilter,
    ) -> Result<Box<dyn CommitStream>> {
        let script = self
            .commit_scripts
            .get(node)
            .cloned()
            .unwrap_or_else(|| CommitScript::Commit(ValidationCode::valid()));

        if let CommitScript::Refuse(reason) = script {
            return Err(GatewayError::ListenerConnection {
                node: node.clone(),
                reason,
            });
        }

        self.journal.record(MockCallKind::OpenListener {
            node: node.clone(),
            filter: filter.clone(),
        });

        let mut pending = VecDeque::new();
        if self.unrelated_events {
            pending.push_back(CommitEvent::Transaction {
                tx_id: TxId::generate(),
                code: ValidationCode::new("MVCC_READ_CONFLICT"),
                block_number: 7,
            });
            pending.push_back(CommitEvent::Block {
                channel: ChannelId::new("otherchannel"),
                block_number: 8,
                tx_count: 3,
            });
        }

        Ok(Box::new(MockCommitStream {
            node: node.clone(),
            filter: filter.clone(),
            script,
            pending,
            delivered: false,
            released: self.released.subscribe(),
            journal: self.journal.clone(),
        }))
    }

    async fn fetch_genesis_block(&self, channel: &ChannelId) -> Result<Vec<u8>> {
        self.journal.record(MockCallKind::FetchGenesisBlock {
            channel: channel.clone(),
        });
        Ok(format!("genesis:{}", channel).into_bytes())
    }

    async fn join_channel(
        &self,
        targets: &[NodeId],
        channel: &ChannelId,
        _genesis_block: &[u8],
    ) -> Result<Vec<NodeResponse>> {
        self.journal.record(MockCallKind::JoinChannel {
            channel: channel.clone(),
            targets: targets.to_vec(),
        });
        self.released.send_replace(true);

        Ok(targets
            .iter()
            .filter_map(|node| self.answer(node, self.join_scripts.get(node), channel.as_str()))
            .collect())
    }

    async fn query_chaincode(
        &self,
        peer: &NodeId,
        _channel: &ChannelId,
        _chaincode: &str,
        _function: &str,
        _args: &[String],
    ) -> Result<Vec<u8>> {
        self.journal.record(MockCallKind::Query { peer: peer.clone() });
        self.require_peer(peer)?;
        Ok(self.query_payload.clone())
    }

    async fn query_block(
        &self,
        peer: &NodeId,
        channel: &ChannelId,
        number: u64,
    ) -> Result<BlockInfo> {
        self.journal.record(MockCallKind::Query { peer: peer.clone() });
        self.require_peer(peer)?;
        Ok(BlockInfo {
            channel: channel.clone(),
            number,
            hash: format!("{:064x}", number + 1),
            previous_hash: format!("{:064x}", number),
            tx_ids: Vec::new(),
            committed_at: Utc::now(),
        })
    }

    async fn query_transaction(
        &self,
        peer: &NodeId,
        _channel: &ChannelId,
        tx_id: &TxId,
    ) -> Result<TransactionInfo> {
        self.journal.record(MockCallKind::Query { peer: peer.clone() });
        self.require_peer(peer)?;
        Err(GatewayError::Query(format!("transaction {} not found", tx_id)))
    }

    async fn query_chain_info(&self, peer: &NodeId, channel: &ChannelId) -> Result<ChainInfo> {
        self.journal.record(MockCallKind::Query { peer: peer.clone() });
        self.require_peer(peer)?;
        Ok(ChainInfo {
            channel: channel.clone(),
            height: 1,
            current_block_hash: format!("{:064x}", 1),
            previous_block_hash: format!("{:064x}", 0),
        })
    }

    async fn query_chaincodes(
        &self,
        peer: &NodeId,
        _scope: ChaincodeScope,
        _channel: Option<&ChannelId>,
    ) -> Result<Vec<ChaincodeInfo>> {
        self.journal.record(MockCallKind::Query { peer: peer.clone() });
        self.require_peer(peer)?;
        Ok(Vec::new())
    }

    async fn query_channels(&self, peer: &NodeId) -> Result<Vec<ChannelId>> {
        self.journal.record(MockCallKind::Query { peer: peer.clone() });
        self.require_peer(peer)?;
        let mut channels: Vec<ChannelId> = self.channels.iter().cloned().collect();
        channels.sort();
        Ok(channels)
    }
}

struct MockCommitStream {
    node: NodeId,
    filter: CommitFilter,
    script: CommitScript,
    pending: VecDeque<CommitEvent>,
    delivered: bool,
    released: watch::Receiver<bool>,
    journal: Arc<Journal>,
}

#[async_trait]
impl CommitStream for MockCommitStream {
    fn node(&self) -> &NodeId {
        &self.node
    }

    async fn next_event(&mut self) -> Result<Option<CommitEvent>> {
        if self.delivered {
            return Ok(None);
        }

        let released = self.released.wait_for(|released| *released).await.is_ok();
        if !released {
            return Err(GatewayError::ListenerConnection {
                node: self.node.clone(),
                reason: "event source dropped".to_string(),
            });
        }

        if let Some(event) = self.pending.pop_front() {
            return Ok(Some(event));
        }

        match self.script.clone() {
            CommitScript::Commit(code) => {
                self.delivered = true;
                let event = match &self.filter {
                    CommitFilter::Transaction(tx_id) => CommitEvent::Transaction {
                        tx_id: tx_id.clone(),
                        code,
                        block_number: 3,
                    },
                    CommitFilter::ChannelBlock(channel) => CommitEvent::Block {
                        channel: channel.clone(),
                        block_number: 0,
                        tx_count: 1,
                    },
                };
                Ok(Some(event))
            }
            CommitScript::ForeignBlock(channel) => {
                self.delivered = true;
                Ok(Some(CommitEvent::Block {
                    channel,
                    block_number: 0,
                    tx_count: 1,
                }))
            }
            CommitScript::Silent => {
                debug!(node = %self.node, "Mock stream staying silent");
                std::future::pending::<()>().await;
                Ok(None)
            }
            CommitScript::StreamError(reason) => Err(GatewayError::ListenerConnection {
                node: self.node.clone(),
                reason,
            }),
            CommitScript::StreamEnd | CommitScript::Refuse(_) => Ok(None),
        }
    }

    fn close(&mut self) {
        self.journal.record(MockCallKind::CloseListener {
            node: self.node.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_types::{ChaincodeSpec, ChaincodeType, ProposalPayload};

    fn install_proposal(targets: &[&str]) -> Proposal {
        Proposal::new(
            TxId::generate(),
            targets.iter().map(|t| NodeId::new(*t)).collect(),
            ProposalPayload::Install {
                chaincode: ChaincodeSpec {
                    name: "salmon".to_string(),
                    version: "v0".to_string(),
                    chaincode_type: ChaincodeType::Golang,
                },
                path: "github.com/salmon".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_scripted_proposal_responses() {
        let client = MockNodeClient::new("fredrick")
            .with_peers(["peer0", "peer1", "peer2"])
            .with_proposal_script(
                "peer1",
                ProposalScript::Reject {
                    status: 500,
                    message: "chaincode error".to_string(),
                },
            )
            .with_proposal_script("peer2", ProposalScript::NoResponse);

        let responses = client
            .send_proposal(
                &install_proposal(&["peer0", "peer1", "peer2"]),
                Duration::from_secs(1),
            )
            .await
            .unwrap();

        assert_eq!(responses.len(), 2);
        assert!(responses[0].is_success());
        assert_eq!(responses[1].status, 500);
    }

    #[tokio::test]
    async fn test_stream_waits_for_order_acceptance() {
        let client = MockNodeClient::new("fredrick").with_peers(["peer0"]);
        let tx_id = TxId::generate();
        let mut stream = client
            .open_commit_listener(&NodeId::new("peer0"), &CommitFilter::Transaction(tx_id.clone()))
            .await
            .unwrap();

        let early =
            tokio::time::timeout(Duration::from_millis(10), stream.next_event()).await;
        assert!(early.is_err());

        let order = OrderRequest::CreateChannel {
            tx_id: tx_id.clone(),
            channel: ChannelId::new("mychannel"),
            config: Vec::new(),
        };
        assert!(client.submit_order(order).await.unwrap().is_success());

        let event = stream.next_event().await.unwrap().unwrap();
        assert!(matches!(event, CommitEvent::Transaction { tx_id: t, .. } if t == tx_id));

        stream.close();
        assert_eq!(client.opened_listeners(), 1);
        assert_eq!(client.closes_for("peer0"), 1);
    }

    #[tokio::test]
    async fn test_refused_listener_is_not_journaled_as_open() {
        let client = MockNodeClient::new("fredrick")
            .with_peers(["peer0"])
            .with_commit_script("peer0", CommitScript::Refuse("connection refused".to_string()));

        let result = client
            .open_commit_listener(
                &NodeId::new("peer0"),
                &CommitFilter::Transaction(TxId::generate()),
            )
            .await;

        assert!(matches!(result, Err(GatewayError::ListenerConnection { .. })));
        assert_eq!(client.opened_listeners(), 0);
    }
}
