//! Commit coordination for one operation.
//!
//! ```text
//! Built -> Proposed -> QuorumChecked -> Rejected
//!                                    -> Ordering -> Committed
//!                                                -> PartiallyCommitted
//!                                                -> OrderRejected
//!                                                -> Timeout
//! ```
//!
//! Channel creation skips endorsement (`Built -> Ordering`). Channel join
//! puts its join call in the ordering slot and listens for config blocks.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use gateway_client::NodeClient;
use gateway_types::{
    CommitFilter, GatewayError, NodeId, NodeResponse, OperationKind, OrderRequest,
    OrderSubmissionResult, Proposal, QuorumVerdict, Result, TxId,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::CommitConfig;
use crate::listener::{CommitListenerPool, ListenerReport};
use crate::quorum;

/// Where an operation is in the commit protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPhase {
    Built,
    Proposed,
    QuorumChecked,
    Rejected,
    Ordering,
    Committed,
    PartiallyCommitted,
    OrderRejected,
    Timeout,
}

impl CommitPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Rejected
                | Self::Committed
                | Self::PartiallyCommitted
                | Self::OrderRejected
                | Self::Timeout
        )
    }
}

/// Padded response set and the verdict over it.
#[derive(Debug, Clone)]
pub struct Endorsement {
    pub responses: Vec<NodeResponse>,
    pub verdict: QuorumVerdict,
}

impl Endorsement {
    pub fn accepted(&self) -> bool {
        self.verdict.accepted
    }

    /// Error surfaced for a rejected verdict.
    pub fn rejection(&self) -> GatewayError {
        GatewayError::QuorumRejected(self.verdict.reasons.join("; "))
    }
}

/// Full record of one coordinated operation.
#[derive(Debug, Clone)]
pub struct CommitReport {
    pub tx_id: TxId,
    pub operation: OperationKind,
    pub phase: CommitPhase,
    pub endorsement: Option<Endorsement>,
    pub order: Option<OrderSubmissionResult>,
    pub listeners: Vec<ListenerReport>,
    /// First failure; surfaced as the operation's message.
    pub error: Option<GatewayError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CommitReport {
    fn new(tx_id: TxId, operation: OperationKind) -> Self {
        let now = Utc::now();
        Self {
            tx_id,
            operation,
            phase: CommitPhase::Built,
            endorsement: None,
            order: None,
            listeners: Vec::new(),
            error: None,
            started_at: now,
            finished_at: now,
        }
    }

    fn advance(&mut self, phase: CommitPhase) {
        debug!(
            tx_id = %self.tx_id,
            operation = %self.operation,
            from = ?self.phase,
            to = ?phase,
            "Commit phase transition"
        );
        self.phase = phase;
        if phase.is_terminal() {
            self.finished_at = Utc::now();
        }
    }

    fn finish(mut self, phase: CommitPhase, error: Option<GatewayError>) -> Self {
        self.error = error;
        self.advance(phase);
        self
    }

    pub fn is_committed(&self) -> bool {
        self.phase == CommitPhase::Committed
    }

    /// `Ok` when committed, otherwise the first failure.
    pub fn into_result(self) -> Result<Self> {
        if self.is_committed() {
            return Ok(self);
        }
        Err(self.error.clone().unwrap_or_else(|| {
            GatewayError::Internal(format!("operation ended in phase {:?}", self.phase))
        }))
    }
}

/// Merge the order outcome and listener outcomes into a terminal phase.
///
/// A failed submission wins over every listener. Otherwise the first failing
/// listener (in registration order) is surfaced; later failures are logged.
pub fn reconcile(
    order: &Result<OrderSubmissionResult>,
    listeners: &[ListenerReport],
) -> (CommitPhase, Option<GatewayError>) {
    match order {
        Err(e) => return (CommitPhase::OrderRejected, Some(e.clone())),
        Ok(result) => {
            if let Some(code) = result.failure_code() {
                return (
                    CommitPhase::OrderRejected,
                    Some(GatewayError::OrderRejected(code.to_string())),
                );
            }
        }
    }

    let mut failures = listeners
        .iter()
        .filter_map(|report| report.outcome.error().map(|e| (report, e)));

    let Some((first, error)) = failures.next() else {
        return (CommitPhase::Committed, None);
    };

    for (report, other) in failures {
        debug!(node = %report.node, error = %other, "Additional listener failure");
    }

    let phase = if first.outcome.is_timeout() {
        CommitPhase::Timeout
    } else {
        CommitPhase::PartiallyCommitted
    };
    (phase, Some(error.clone()))
}

/// Drives one operation through the commit protocol.
pub struct CommitCoordinator {
    client: Arc<dyn NodeClient>,
    config: CommitConfig,
}

impl CommitCoordinator {
    pub fn new(client: Arc<dyn NodeClient>, config: CommitConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &Arc<dyn NodeClient> {
        &self.client
    }

    pub fn config(&self) -> &CommitConfig {
        &self.config
    }

    /// Fan the proposal out and evaluate the padded response set.
    ///
    /// A failure of the fan-out call as a whole becomes a failing response
    /// for every target.
    pub async fn endorse(&self, proposal: &Proposal) -> Endorsement {
        let timeout = self.config.proposal_timeout_for(proposal.kind());
        let responses = match self.client.send_proposal(proposal, timeout).await {
            Ok(responses) => responses,
            Err(e) => {
                warn!(tx_id = %proposal.tx_id, error = %e, "Proposal fan-out failed");
                proposal
                    .targets
                    .iter()
                    .map(|node| NodeResponse::transport_error(node.clone(), &e))
                    .collect()
            }
        };

        let responses = quorum::complete_response_set(&proposal.targets, responses);
        let verdict = quorum::evaluate(&responses, proposal.targets.len());

        if verdict.accepted {
            info!(
                tx_id = %proposal.tx_id,
                responses = responses.len(),
                "Successfully sent Proposal and received ProposalResponse"
            );
        } else {
            for reason in &verdict.reasons {
                warn!(tx_id = %proposal.tx_id, reason = %reason, "Proposal was bad");
            }
        }

        Endorsement { responses, verdict }
    }

    /// Endorsement only, for operations with nothing to order.
    pub async fn propose(&self, proposal: &Proposal) -> CommitReport {
        let mut report = CommitReport::new(proposal.tx_id.clone(), proposal.kind());
        report.advance(CommitPhase::Proposed);

        let endorsement = self.endorse(proposal).await;
        report.advance(CommitPhase::QuorumChecked);

        if endorsement.accepted() {
            report.endorsement = Some(endorsement);
            // Nothing to order: an accepted verdict is the commit.
            return report.finish(CommitPhase::Committed, None);
        }

        let error = endorsement.rejection();
        report.endorsement = Some(endorsement);
        report.finish(CommitPhase::Rejected, Some(error))
    }

    /// Propose, order and wait for commit notifications on `listen_on`.
    pub async fn execute(&self, proposal: Proposal, listen_on: &[NodeId]) -> CommitReport {
        let operation = proposal.kind();
        let mut report = CommitReport::new(proposal.tx_id.clone(), operation);
        report.advance(CommitPhase::Proposed);

        let endorsement = self.endorse(&proposal).await;
        report.advance(CommitPhase::QuorumChecked);

        if !endorsement.accepted() {
            let error = endorsement.rejection();
            report.endorsement = Some(endorsement);
            return report.finish(CommitPhase::Rejected, Some(error));
        }

        let order = OrderRequest::Transaction {
            tx_id: proposal.tx_id.clone(),
            endorsements: endorsement.responses.clone(),
            proposal,
        };
        report.endorsement = Some(endorsement);

        let filter = CommitFilter::Transaction(report.tx_id.clone());
        let timeout = self.config.listener_timeout_for(operation);
        let client = self.client.clone();

        self.order_and_listen(report, listen_on, &filter, timeout, async move {
            client.submit_order(order).await
        })
        .await
    }

    /// Submit straight to the ordering authority with no listeners.
    pub async fn order_only(&self, operation: OperationKind, request: OrderRequest) -> CommitReport {
        let tx_id = request.tx_id().clone();
        let filter = CommitFilter::Transaction(tx_id.clone());
        let report = CommitReport::new(tx_id, operation);
        let client = self.client.clone();

        self.order_and_listen(report, &[], &filter, Duration::ZERO, async move {
            client.submit_order(request).await
        })
        .await
    }

    /// Register block listeners, then run `submission` in the ordering slot.
    ///
    /// Used by channel join, whose submission is the join call itself.
    pub async fn submit_and_listen<F>(
        &self,
        tx_id: TxId,
        operation: OperationKind,
        listen_on: &[NodeId],
        filter: &CommitFilter,
        submission: F,
    ) -> CommitReport
    where
        F: Future<Output = Result<OrderSubmissionResult>>,
    {
        let report = CommitReport::new(tx_id, operation);
        let timeout = self.config.listener_timeout_for(operation);
        self.order_and_listen(report, listen_on, filter, timeout, submission)
            .await
    }

    async fn order_and_listen<F>(
        &self,
        mut report: CommitReport,
        listen_on: &[NodeId],
        filter: &CommitFilter,
        timeout: Duration,
        submission: F,
    ) -> CommitReport
    where
        F: Future<Output = Result<OrderSubmissionResult>>,
    {
        report.advance(CommitPhase::Ordering);

        // Every listener is subscribed before the submission is polled.
        let pool = if listen_on.is_empty() {
            CommitListenerPool::empty()
        } else {
            CommitListenerPool::register(
                self.client.as_ref(),
                listen_on,
                filter,
                report.operation,
                timeout,
            )
            .await
        };
        debug!(
            tx_id = %report.tx_id,
            registered = pool.registered(),
            listeners = pool.len(),
            "Commit listeners registered"
        );

        let joined = pool.join_with(submission).await;
        let (phase, error) = reconcile(&joined.order_result, &joined.listener_results);

        match &joined.order_result {
            Ok(result) if result.is_success() => {
                info!(tx_id = %report.tx_id, "Successfully sent transaction to the orderer")
            }
            Ok(result) => warn!(
                tx_id = %report.tx_id,
                code = result.failure_code().unwrap_or_default(),
                "Failed to order the transaction"
            ),
            Err(e) => warn!(tx_id = %report.tx_id, error = %e, "Order submission failed"),
        }

        report.order = joined.order_result.ok();
        report.listeners = joined.listener_results;
        report.finish(phase, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::{ListenerOutcome, ListenerState};
    use gateway_types::{ChannelId, NodeId};

    fn report(node: &str, outcome: ListenerOutcome) -> ListenerReport {
        ListenerReport {
            node: NodeId::new(node),
            state: ListenerState::Resolved,
            outcome,
        }
    }

    fn timed_out(node: &str) -> ListenerReport {
        report(
            node,
            ListenerOutcome::TimedOut(GatewayError::CommitTimeout {
                node: NodeId::new(node),
                timeout_ms: 3000,
            }),
        )
    }

    fn invalid(node: &str) -> ListenerReport {
        report(
            node,
            ListenerOutcome::Invalid(GatewayError::CommitInvalid {
                node: NodeId::new(node),
                operation: "invoke chaincode".to_string(),
                code: "MVCC_READ_CONFLICT".to_string(),
            }),
        )
    }

    #[test]
    fn test_order_failure_wins_over_listeners() {
        let (phase, error) = reconcile(
            &Ok(OrderSubmissionResult::failure("BAD_REQUEST")),
            &[timed_out("peer0")],
        );
        assert_eq!(phase, CommitPhase::OrderRejected);
        assert_eq!(
            error.unwrap().to_string(),
            "Failed to order the transaction. Error code: BAD_REQUEST"
        );
    }

    #[test]
    fn test_first_listener_failure_wins() {
        let (phase, error) = reconcile(
            &Ok(OrderSubmissionResult::success()),
            &[
                report("peer0", ListenerOutcome::Valid("ok".to_string())),
                invalid("peer1"),
                timed_out("peer2"),
            ],
        );
        assert_eq!(phase, CommitPhase::PartiallyCommitted);
        assert_eq!(error.unwrap().node().unwrap().as_str(), "peer1");
    }

    #[test]
    fn test_timeout_first_is_timeout_phase() {
        let (phase, error) = reconcile(
            &Ok(OrderSubmissionResult::success()),
            &[timed_out("peer1"), invalid("peer0")],
        );
        assert_eq!(phase, CommitPhase::Timeout);
        assert_eq!(error.unwrap().to_string(), "REQUEST_TIMEOUT:peer1");
    }

    #[test]
    fn test_all_valid_is_committed() {
        let (phase, error) = reconcile(
            &Ok(OrderSubmissionResult::success()),
            &[report("peer0", ListenerOutcome::Valid("ok".to_string()))],
        );
        assert_eq!(phase, CommitPhase::Committed);
        assert!(error.is_none());
    }

    #[test]
    fn test_submission_error_is_order_rejected() {
        let (phase, error) = reconcile(
            &Err(GatewayError::ChannelNotFound(ChannelId::new("mychannel"))),
            &[],
        );
        assert_eq!(phase, CommitPhase::OrderRejected);
        assert!(matches!(error, Some(GatewayError::ChannelNotFound(_))));
    }
}
