//! In-process simulated ledger network.
//!
//! One shared ordering service with a ledger per channel, a set of peers per
//! organization with their joined channels and installed chaincodes, and a
//! broadcast notification stream per peer. Chaincode execution is a plain
//! key/value store per chaincode.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use gateway_types::{
    BlockInfo, ChainInfo, ChaincodeInfo, ChaincodeScope, ChannelId, CommitEvent, GatewayError,
    NodeId, NodeResponse, OrderRequest, OrderSubmissionResult, OrgName, Proposal, ProposalPayload,
    Result, TransactionInfo, TxId, ValidationCode,
};
use rand::Rng;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::{FaultConfig, NetworkConfig};

const EVENT_BUFFER: usize = 256;

struct PeerState {
    org: OrgName,
    joined: HashSet<ChannelId>,
    installed: Vec<ChaincodeInfo>,
    events: broadcast::Sender<CommitEvent>,
}

struct SimBlock {
    number: u64,
    hash: String,
    previous_hash: String,
    tx_ids: Vec<TxId>,
    committed_at: DateTime<Utc>,
}

#[derive(Default)]
struct ChannelLedger {
    blocks: Vec<SimBlock>,
    instantiated: Vec<ChaincodeInfo>,
    state: HashMap<String, HashMap<String, serde_json::Value>>,
    transactions: HashMap<TxId, TransactionInfo>,
}

impl ChannelLedger {
    fn append(&mut self, tx_id: TxId) -> u64 {
        let number = self.blocks.len() as u64;
        let previous_hash = self
            .blocks
            .last()
            .map(|b| b.hash.clone())
            .unwrap_or_else(|| "0".repeat(16));

        let mut hasher = DefaultHasher::new();
        number.hash(&mut hasher);
        previous_hash.hash(&mut hasher);
        tx_id.as_str().hash(&mut hasher);

        self.blocks.push(SimBlock {
            number,
            hash: format!("{:016x}", hasher.finish()),
            previous_hash,
            tx_ids: vec![tx_id],
            committed_at: Utc::now(),
        });
        number
    }

    fn block_info(&self, channel: &ChannelId, number: u64) -> Option<BlockInfo> {
        self.blocks.get(number as usize).map(|b| BlockInfo {
            channel: channel.clone(),
            number: b.number,
            hash: b.hash.clone(),
            previous_hash: b.previous_hash.clone(),
            tx_ids: b.tx_ids.clone(),
            committed_at: b.committed_at,
        })
    }

    fn apply_write(&mut self, chaincode: &str, function: &str, args: &[String]) {
        let Some((key, rest)) = args.split_first() else {
            return;
        };
        let store = self.state.entry(chaincode.to_string()).or_default();

        if function.starts_with("delete") {
            store.remove(key);
            return;
        }
        if is_read_only(function) {
            return;
        }

        let value = match rest {
            [] => serde_json::Value::Null,
            [single] => serde_json::from_str(single)
                .unwrap_or_else(|_| serde_json::Value::String(single.clone())),
            many => serde_json::Value::from(many.to_vec()),
        };
        store.insert(key.clone(), value);
    }
}

fn is_read_only(function: &str) -> bool {
    function.starts_with("query") || function.starts_with("get")
}

/// The simulated network shared by every organization's client.
pub struct SimNetwork {
    peers: DashMap<NodeId, PeerState>,
    channels: DashMap<ChannelId, ChannelLedger>,
    faults: FaultConfig,
    latency: Duration,
    jitter_ms: u64,
}

impl SimNetwork {
    pub fn new(config: &NetworkConfig) -> Self {
        let peers = DashMap::new();
        for org in &config.organizations {
            for peer in &org.peers {
                let (events, _) = broadcast::channel(EVENT_BUFFER);
                peers.insert(
                    NodeId::new(peer),
                    PeerState {
                        org: OrgName::new(&org.name),
                        joined: HashSet::new(),
                        installed: Vec::new(),
                        events,
                    },
                );
            }
        }

        Self {
            peers,
            channels: DashMap::new(),
            faults: config.faults.clone(),
            latency: Duration::from_millis(config.latency_ms),
            jitter_ms: config.jitter_ms,
        }
    }

    /// Simulated round-trip delay.
    pub fn round_trip(&self) -> Duration {
        if self.jitter_ms == 0 {
            return self.latency;
        }
        let jitter = rand::thread_rng().gen_range(0..=self.jitter_ms);
        self.latency + Duration::from_millis(jitter)
    }

    /// Organization owning a peer.
    pub fn peer_org(&self, node: &NodeId) -> Option<OrgName> {
        self.peers.get(node).map(|p| p.org.clone())
    }

    /// Whether `node` holds a copy of `channel`'s ledger.
    pub fn has_joined(&self, node: &NodeId, channel: &ChannelId) -> bool {
        self.peers
            .get(node)
            .map(|p| p.joined.contains(channel))
            .unwrap_or(false)
    }

    fn is_silent(&self, node: &NodeId) -> bool {
        self.faults.silent_peers.iter().any(|p| p == node.as_str())
    }

    fn is_rejecting(&self, node: &NodeId) -> bool {
        self.faults.rejecting_peers.iter().any(|p| p == node.as_str())
    }

    /// Execute a proposal on one peer.
    pub fn endorse(&self, node: &NodeId, proposal: &Proposal) -> NodeResponse {
        if self.is_rejecting(node) {
            return NodeResponse::rejected(node.clone(), 500, "simulated endorsement failure");
        }
        let Some(mut peer) = self.peers.get_mut(node) else {
            return NodeResponse::transport_error(node.clone(), format!("unknown peer {}", node));
        };

        let endorsement = format!("{}:{}", node, proposal.tx_id).into_bytes();

        match &proposal.payload {
            ProposalPayload::Install { chaincode, path } => {
                let exists = peer
                    .installed
                    .iter()
                    .any(|c| c.name == chaincode.name && c.version == chaincode.version);
                if exists {
                    return NodeResponse::rejected(
                        node.clone(),
                        500,
                        format!(
                            "chaincode {}:{} already exists",
                            chaincode.name, chaincode.version
                        ),
                    );
                }
                peer.installed.push(ChaincodeInfo {
                    name: chaincode.name.clone(),
                    version: chaincode.version.clone(),
                    path: path.clone(),
                });
                debug!(node = %node, chaincode = %chaincode.name, "Chaincode installed");
                NodeResponse::ok(node.clone(), endorsement)
            }
            ProposalPayload::Instantiate {
                channel, chaincode, ..
            } => {
                if !peer.joined.contains(channel) {
                    return NodeResponse::rejected(
                        node.clone(),
                        500,
                        format!("peer has not joined channel {}", channel),
                    );
                }
                let installed = peer
                    .installed
                    .iter()
                    .any(|c| c.name == chaincode.name && c.version == chaincode.version);
                if !installed {
                    return NodeResponse::rejected(
                        node.clone(),
                        500,
                        format!(
                            "cannot get package for chaincode ({}:{})",
                            chaincode.name, chaincode.version
                        ),
                    );
                }
                let already = self
                    .channels
                    .get(channel)
                    .map(|l| l.instantiated.iter().any(|c| c.name == chaincode.name))
                    .unwrap_or(false);
                if already {
                    return NodeResponse::rejected(
                        node.clone(),
                        500,
                        format!("chaincode with name '{}' already exists", chaincode.name),
                    );
                }
                NodeResponse::ok(node.clone(), endorsement)
            }
            ProposalPayload::Invoke {
                channel, chaincode, ..
            } => {
                if !peer.joined.contains(channel) {
                    return NodeResponse::rejected(
                        node.clone(),
                        500,
                        format!("peer has not joined channel {}", channel),
                    );
                }
                let instantiated = self
                    .channels
                    .get(channel)
                    .map(|l| l.instantiated.iter().any(|c| &c.name == chaincode))
                    .unwrap_or(false);
                if !instantiated {
                    return NodeResponse::rejected(
                        node.clone(),
                        500,
                        format!(
                            "make sure the chaincode {} has been successfully instantiated and try again",
                            chaincode
                        ),
                    );
                }
                NodeResponse::ok(node.clone(), endorsement)
            }
        }
    }

    /// Sequence a request into its channel's ledger.
    pub fn order(&self, request: OrderRequest) -> OrderSubmissionResult {
        match request {
            OrderRequest::CreateChannel {
                tx_id,
                channel,
                config,
            } => self.create_channel(tx_id, channel, config),
            OrderRequest::Transaction {
                tx_id,
                proposal,
                endorsements,
            } => self.commit_transaction(tx_id, proposal, endorsements),
        }
    }

    fn create_channel(
        &self,
        tx_id: TxId,
        channel: ChannelId,
        config: Vec<u8>,
    ) -> OrderSubmissionResult {
        if config.is_empty() || self.channels.contains_key(&channel) {
            warn!(channel = %channel, "Rejected channel creation");
            return OrderSubmissionResult::failure("BAD_REQUEST");
        }

        let mut ledger = ChannelLedger::default();
        let number = ledger.append(tx_id.clone());
        ledger.transactions.insert(
            tx_id.clone(),
            TransactionInfo {
                tx_id,
                channel: channel.clone(),
                block_number: number,
                validation_code: ValidationCode::valid(),
            },
        );
        self.channels.insert(channel.clone(), ledger);
        info!(channel = %channel, "Channel created");
        OrderSubmissionResult::success()
    }

    fn commit_transaction(
        &self,
        tx_id: TxId,
        proposal: Proposal,
        endorsements: Vec<NodeResponse>,
    ) -> OrderSubmissionResult {
        let Some(channel) = proposal.payload.channel().cloned() else {
            return OrderSubmissionResult::failure("BAD_REQUEST");
        };
        if endorsements.is_empty() || !endorsements.iter().all(NodeResponse::is_success) {
            return OrderSubmissionResult::failure("BAD_REQUEST");
        }

        let code = if self.faults.invalid_commit_rate > 0.0
            && rand::thread_rng().gen_bool(self.faults.invalid_commit_rate.min(1.0))
        {
            ValidationCode::new("ENDORSEMENT_POLICY_FAILURE")
        } else {
            ValidationCode::valid()
        };

        let path = self.installed_path(&endorsements, &proposal.payload);

        let block_number = {
            let Some(mut ledger) = self.channels.get_mut(&channel) else {
                return OrderSubmissionResult::failure("NOT_FOUND");
            };

            if code.is_valid() {
                match &proposal.payload {
                    ProposalPayload::Instantiate { chaincode, .. } => {
                        ledger.instantiated.push(ChaincodeInfo {
                            name: chaincode.name.clone(),
                            version: chaincode.version.clone(),
                            path,
                        });
                    }
                    ProposalPayload::Invoke {
                        chaincode,
                        function,
                        args,
                        ..
                    } => ledger.apply_write(chaincode, function, args),
                    ProposalPayload::Install { .. } => {}
                }
            }

            let number = ledger.append(tx_id.clone());
            ledger.transactions.insert(
                tx_id.clone(),
                TransactionInfo {
                    tx_id: tx_id.clone(),
                    channel: channel.clone(),
                    block_number: number,
                    validation_code: code.clone(),
                },
            );
            number
        };

        debug!(tx_id = %tx_id, channel = %channel, block_number, code = %code, "Transaction ordered");
        self.emit_to_channel(
            &channel,
            CommitEvent::Transaction {
                tx_id,
                code,
                block_number,
            },
        );
        OrderSubmissionResult::success()
    }

    fn installed_path(&self, endorsements: &[NodeResponse], payload: &ProposalPayload) -> String {
        let ProposalPayload::Instantiate { chaincode, .. } = payload else {
            return String::new();
        };
        endorsements
            .iter()
            .find_map(|e| {
                self.peers.get(&e.node).and_then(|peer| {
                    peer.installed
                        .iter()
                        .find(|c| c.name == chaincode.name && c.version == chaincode.version)
                        .map(|c| c.path.clone())
                })
            })
            .unwrap_or_default()
    }

    fn emit_to_channel(&self, channel: &ChannelId, event: CommitEvent) {
        let senders: Vec<(NodeId, broadcast::Sender<CommitEvent>)> = self
            .peers
            .iter()
            .filter(|p| p.joined.contains(channel) && !self.is_silent(p.key()))
            .map(|p| (p.key().clone(), p.events.clone()))
            .collect();
        self.emit(senders, event);
    }

    fn emit(&self, senders: Vec<(NodeId, broadcast::Sender<CommitEvent>)>, event: CommitEvent) {
        let delay = self.round_trip();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            for (node, sender) in senders {
                // No subscribers is fine: nobody is listening on that peer.
                let delivered = sender.send(event.clone()).unwrap_or(0);
                debug!(node = %node, delivered, "Commit notification emitted");
            }
        });
    }

    /// Serialized genesis block of a channel.
    pub fn genesis_block(&self, channel: &ChannelId) -> Result<Vec<u8>> {
        let ledger = self
            .channels
            .get(channel)
            .ok_or_else(|| GatewayError::ChannelNotFound(channel.clone()))?;
        let block = ledger
            .block_info(channel, 0)
            .ok_or_else(|| GatewayError::Internal(format!("channel {} has no genesis block", channel)))?;
        serde_json::to_vec(&block).map_err(|e| GatewayError::Internal(e.to_string()))
    }

    /// Join one peer to a channel.
    pub fn join(&self, node: &NodeId, channel: &ChannelId, genesis_block: &[u8]) -> NodeResponse {
        let valid_block = serde_json::from_slice::<BlockInfo>(genesis_block)
            .map(|b| &b.channel == channel && b.number == 0)
            .unwrap_or(false);
        if !valid_block || !self.channels.contains_key(channel) {
            return NodeResponse::rejected(node.clone(), 500, "invalid genesis block");
        }

        let sender = {
            let Some(mut peer) = self.peers.get_mut(node) else {
                return NodeResponse::transport_error(node.clone(), format!("unknown peer {}", node));
            };
            if !peer.joined.insert(channel.clone()) {
                return NodeResponse::rejected(
                    node.clone(),
                    500,
                    format!("LedgerID already exists: {}", channel),
                );
            }
            peer.events.clone()
        };

        info!(node = %node, channel = %channel, "Peer joined channel");
        if !self.is_silent(node) {
            self.emit(
                vec![(node.clone(), sender)],
                CommitEvent::Block {
                    channel: channel.clone(),
                    block_number: 0,
                    tx_count: 1,
                },
            );
        }
        NodeResponse::ok(node.clone(), Vec::new())
    }

    /// Subscribe to a peer's notification stream.
    pub fn subscribe(&self, node: &NodeId) -> Result<broadcast::Receiver<CommitEvent>> {
        self.peers
            .get(node)
            .map(|p| p.events.subscribe())
            .ok_or_else(|| GatewayError::ListenerConnection {
                node: node.clone(),
                reason: format!("Error: connect ECONNREFUSED {}", node),
            })
    }

    fn require_joined(&self, peer: &NodeId, channel: &ChannelId) -> Result<()> {
        let joined = self
            .peers
            .get(peer)
            .ok_or_else(|| GatewayError::Query(format!("unknown peer {}", peer)))?
            .joined
            .contains(channel);
        if joined {
            Ok(())
        } else {
            Err(GatewayError::Query(format!(
                "peer {} has not joined channel {}",
                peer, channel
            )))
        }
    }

    /// Evaluate a read against a chaincode's key/value store.
    pub fn query_chaincode(
        &self,
        peer: &NodeId,
        channel: &ChannelId,
        chaincode: &str,
        function: &str,
        args: &[String],
    ) -> Result<Vec<u8>> {
        self.require_joined(peer, channel)?;
        let ledger = self
            .channels
            .get(channel)
            .ok_or_else(|| GatewayError::ChannelNotFound(channel.clone()))?;
        if !ledger.instantiated.iter().any(|c| c.name == chaincode) {
            return Err(GatewayError::Query(format!(
                "chaincode {} is not instantiated on channel {}",
                chaincode, channel
            )));
        }

        let empty = HashMap::new();
        let store = ledger.state.get(chaincode).unwrap_or(&empty);

        let value = match args.first() {
            Some(key) if !function.contains("All") => store
                .get(key)
                .cloned()
                .ok_or_else(|| GatewayError::Query(format!("{} does not exist", key)))?,
            _ => {
                let mut entries: Vec<_> = store.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                serde_json::Value::Array(
                    entries
                        .into_iter()
                        .map(|(k, v)| serde_json::json!({ "key": k, "record": v }))
                        .collect(),
                )
            }
        };
        serde_json::to_vec(&value).map_err(|e| GatewayError::Internal(e.to_string()))
    }

    pub fn query_block(&self, peer: &NodeId, channel: &ChannelId, number: u64) -> Result<BlockInfo> {
        self.require_joined(peer, channel)?;
        self.channels
            .get(channel)
            .and_then(|l| l.block_info(channel, number))
            .ok_or_else(|| GatewayError::Query(format!("block {} not found", number)))
    }

    pub fn query_transaction(
        &self,
        peer: &NodeId,
        channel: &ChannelId,
        tx_id: &TxId,
    ) -> Result<TransactionInfo> {
        self.require_joined(peer, channel)?;
        self.channels
            .get(channel)
            .and_then(|l| l.transactions.get(tx_id).cloned())
            .ok_or_else(|| GatewayError::Query(format!("transaction {} not found", tx_id)))
    }

    pub fn query_chain_info(&self, peer: &NodeId, channel: &ChannelId) -> Result<ChainInfo> {
        self.require_joined(peer, channel)?;
        let ledger = self
            .channels
            .get(channel)
            .ok_or_else(|| GatewayError::ChannelNotFound(channel.clone()))?;
        let last = ledger
            .blocks
            .last()
            .ok_or_else(|| GatewayError::Query(format!("channel {} is empty", channel)))?;
        Ok(ChainInfo {
            channel: channel.clone(),
            height: ledger.blocks.len() as u64,
            current_block_hash: last.hash.clone(),
            previous_block_hash: last.previous_hash.clone(),
        })
    }

    pub fn query_chaincodes(
        &self,
        peer: &NodeId,
        scope: ChaincodeScope,
        channel: Option<&ChannelId>,
    ) -> Result<Vec<ChaincodeInfo>> {
        match (scope, channel) {
            (ChaincodeScope::Installed, _) => self
                .peers
                .get(peer)
                .map(|p| p.installed.clone())
                .ok_or_else(|| GatewayError::Query(format!("unknown peer {}", peer))),
            (ChaincodeScope::Instantiated, Some(channel)) => {
                self.require_joined(peer, channel)?;
                Ok(self
                    .channels
                    .get(channel)
                    .map(|l| l.instantiated.clone())
                    .unwrap_or_default())
            }
            (ChaincodeScope::Instantiated, None) => Err(GatewayError::missing("channel")),
        }
    }

    pub fn query_channels(&self, peer: &NodeId) -> Result<Vec<ChannelId>> {
        let mut channels: Vec<ChannelId> = self
            .peers
            .get(peer)
            .ok_or_else(|| GatewayError::Query(format!("unknown peer {}", peer)))?
            .joined
            .iter()
            .cloned()
            .collect();
        channels.sort();
        Ok(channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_types::{ChaincodeSpec, ChaincodeType};

    fn network() -> SimNetwork {
        let mut config = NetworkConfig::default();
        config.latency_ms = 0;
        SimNetwork::new(&config)
    }

    fn peer0() -> NodeId {
        NodeId::new("peer0.org1.example.com")
    }

    fn channel() -> ChannelId {
        ChannelId::new("mychannel")
    }

    fn create_and_join(net: &SimNetwork) {
        let created = net.order(OrderRequest::CreateChannel {
            tx_id: TxId::generate(),
            channel: channel(),
            config: b"envelope".to_vec(),
        });
        assert!(created.is_success());
        let genesis = net.genesis_block(&channel()).unwrap();
        assert!(net.join(&peer0(), &channel(), &genesis).is_success());
    }

    fn spec() -> ChaincodeSpec {
        ChaincodeSpec {
            name: "salmon".to_string(),
            version: "v0".to_string(),
            chaincode_type: ChaincodeType::Golang,
        }
    }

    #[tokio::test]
    async fn test_duplicate_channel_is_rejected() {
        let net = network();
        create_and_join(&net);
        let again = net.order(OrderRequest::CreateChannel {
            tx_id: TxId::generate(),
            channel: channel(),
            config: b"envelope".to_vec(),
        });
        assert_eq!(again.failure_code(), Some("BAD_REQUEST"));
    }

    #[tokio::test]
    async fn test_second_join_is_rejected() {
        let net = network();
        create_and_join(&net);
        let genesis = net.genesis_block(&channel()).unwrap();
        let response = net.join(&peer0(), &channel(), &genesis);
        assert_eq!(response.status, 500);
        assert!(response.message.contains("LedgerID already exists"));
    }

    #[tokio::test]
    async fn test_invoke_requires_instantiated_chaincode() {
        let net = network();
        create_and_join(&net);
        let proposal = Proposal::new(
            TxId::generate(),
            vec![peer0()],
            ProposalPayload::Invoke {
                channel: channel(),
                chaincode: "salmon".to_string(),
                function: "recordSalmon".to_string(),
                args: vec!["s1".to_string(), "12".to_string()],
            },
        );
        assert_eq!(net.endorse(&peer0(), &proposal).status, 500);
    }

    #[tokio::test]
    async fn test_install_instantiate_invoke_query() {
        let net = network();
        create_and_join(&net);

        let install = Proposal::new(
            TxId::generate(),
            vec![peer0()],
            ProposalPayload::Install {
                chaincode: spec(),
                path: "github.com/salmon".to_string(),
            },
        );
        assert!(net.endorse(&peer0(), &install).is_success());
        assert_eq!(net.endorse(&peer0(), &install).status, 500);

        let instantiate = Proposal::new(
            TxId::generate(),
            vec![peer0()],
            ProposalPayload::Instantiate {
                channel: channel(),
                chaincode: spec(),
                function: None,
                args: vec![],
            },
        );
        let response = net.endorse(&peer0(), &instantiate);
        assert!(response.is_success());
        let ordered = net.order(OrderRequest::Transaction {
            tx_id: instantiate.tx_id.clone(),
            proposal: instantiate.clone(),
            endorsements: vec![response],
        });
        assert!(ordered.is_success());

        let invoke = Proposal::new(
            TxId::generate(),
            vec![peer0()],
            ProposalPayload::Invoke {
                channel: channel(),
                chaincode: "salmon".to_string(),
                function: "recordSalmon".to_string(),
                args: vec!["s1".to_string(), r#"{"weight":12}"#.to_string()],
            },
        );
        let response = net.endorse(&peer0(), &invoke);
        assert!(response.is_success());
        assert!(net
            .order(OrderRequest::Transaction {
                tx_id: invoke.tx_id.clone(),
                proposal: invoke.clone(),
                endorsements: vec![response],
            })
            .is_success());

        let payload = net
            .query_chaincode(&peer0(), &channel(), "salmon", "querySalmon", &["s1".to_string()])
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(value["weight"], 12);

        let info = net.query_chain_info(&peer0(), &channel()).unwrap();
        assert_eq!(info.height, 3);

        let tx = net
            .query_transaction(&peer0(), &channel(), &invoke.tx_id)
            .unwrap();
        assert_eq!(tx.block_number, 2);
        assert!(tx.validation_code.is_valid());

        let installed = net
            .query_chaincodes(&peer0(), ChaincodeScope::Installed, None)
            .unwrap();
        assert_eq!(installed[0].to_string(), "name: salmon, version: v0, path: github.com/salmon");
        let instantiated = net
            .query_chaincodes(&peer0(), ChaincodeScope::Instantiated, Some(&channel()))
            .unwrap();
        assert_eq!(instantiated[0].path, "github.com/salmon");
    }

    #[tokio::test]
    async fn test_subscribers_receive_commit_events() {
        let net = network();
        create_and_join(&net);
        let mut rx = net.subscribe(&peer0()).unwrap();

        // The join notification may already be in flight.
        let _ = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await;

        let tx_id = TxId::generate();
        let proposal = Proposal::new(
            tx_id.clone(),
            vec![peer0()],
            ProposalPayload::Invoke {
                channel: channel(),
                chaincode: "salmon".to_string(),
                function: "record".to_string(),
                args: vec![],
            },
        );
        let ordered = net.order(OrderRequest::Transaction {
            tx_id: tx_id.clone(),
            proposal,
            endorsements: vec![NodeResponse::ok(peer0(), vec![])],
        });
        assert!(ordered.is_success());

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, CommitEvent::Transaction { tx_id: t, .. } if t == tx_id));
    }

    #[test]
    fn test_unknown_peer_cannot_subscribe() {
        let net = network();
        assert!(matches!(
            net.subscribe(&NodeId::new("peer9")),
            Err(GatewayError::ListenerConnection { .. })
        ));
    }

    #[tokio::test]
    async fn test_has_joined_tracks_membership() {
        let net = network();
        assert!(!net.has_joined(&peer0(), &channel()));

        create_and_join(&net);
        assert!(net.has_joined(&peer0(), &channel()));
        assert!(!net.has_joined(&NodeId::new("peer1.org1.example.com"), &channel()));
        assert!(!net.has_joined(&peer0(), &ChannelId::new("otherchannel")));
        assert!(!net.has_joined(&NodeId::new("peer9"), &channel()));
    }
}
