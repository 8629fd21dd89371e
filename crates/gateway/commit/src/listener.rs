//! Commit listener pool.
//!
//! A listener watches one node's notification stream for one filter (a
//! transaction id, or a config block on a channel) under its own timer. Its
//! stream is held by a guard that closes it exactly once, whichever way the
//! listener resolves, including when the pool is dropped mid-flight.
//!
//! All listeners are opened before the caller issues the order submission;
//! [`CommitListenerPool::join_with`] then drives the listeners and the
//! submission as one concurrent join.

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use gateway_client::{CommitStream, NodeClient};
use gateway_types::{
    CommitEvent, CommitFilter, GatewayError, NodeId, OperationKind,
};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

/// Lifecycle of one listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerState {
    /// Connected and subscribed; waiting.
    Registered,
    /// A notification or stream failure settled the listener.
    Resolved,
    /// The timer fired first.
    TimedOut,
    /// Released without resolving (never connected, or dropped).
    Unregistered,
}

/// What a listener resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerOutcome {
    /// The awaited notification arrived with the valid code.
    Valid(String),
    /// A notification arrived with another code, or for another channel.
    Invalid(GatewayError),
    /// The stream could not be opened or failed while waiting.
    ConnectionError(GatewayError),
    /// No matching notification before the timer fired.
    TimedOut(GatewayError),
}

impl ListenerOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut(_))
    }

    /// Failure carried by the outcome.
    pub fn error(&self) -> Option<&GatewayError> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid(e) | Self::ConnectionError(e) | Self::TimedOut(e) => Some(e),
        }
    }
}

/// Final report for one listener.
#[derive(Debug, Clone)]
pub struct ListenerReport {
    pub node: NodeId,
    pub state: ListenerState,
    pub outcome: ListenerOutcome,
}

/// Owns an open stream and closes it exactly once.
struct StreamGuard {
    stream: Box<dyn CommitStream>,
    released: bool,
}

impl StreamGuard {
    fn new(stream: Box<dyn CommitStream>) -> Self {
        Self {
            stream,
            released: false,
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.stream.close();
            trace!(node = %self.stream.node(), "Listener connection released");
        }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// A registered listener.
pub struct CommitListener {
    node: NodeId,
    filter: CommitFilter,
    operation: OperationKind,
    timeout: Duration,
    guard: StreamGuard,
}

impl CommitListener {
    /// Connect to `node` and subscribe to `filter`.
    pub async fn register(
        client: &dyn NodeClient,
        node: &NodeId,
        filter: &CommitFilter,
        operation: OperationKind,
        timeout: Duration,
    ) -> Result<Self, ListenerReport> {
        match client.open_commit_listener(node, filter).await {
            Ok(stream) => {
                debug!(node = %node, filter = %filter, "Commit listener registered");
                Ok(Self {
                    node: node.clone(),
                    filter: filter.clone(),
                    operation,
                    timeout,
                    guard: StreamGuard::new(stream),
                })
            }
            Err(e) => {
                warn!(node = %node, error = %e, "Failed to open commit listener");
                Err(ListenerReport {
                    node: node.clone(),
                    state: ListenerState::Unregistered,
                    outcome: ListenerOutcome::ConnectionError(connection_error(node, e)),
                })
            }
        }
    }

    pub fn node(&self) -> &NodeId {
        &self.node
    }

    /// Wait for resolution or timeout, then release the connection.
    pub async fn wait(self) -> ListenerReport {
        let Self {
            node,
            filter,
            operation,
            timeout,
            mut guard,
        } = self;

        let watched = watch(guard.stream.as_mut(), &node, &filter, operation);
        let (state, outcome) = match tokio::time::timeout(timeout, watched).await {
            Ok(outcome) => (ListenerState::Resolved, outcome),
            Err(_) => {
                let error = GatewayError::CommitTimeout {
                    node: node.clone(),
                    timeout_ms: timeout.as_millis() as u64,
                };
                warn!(node = %node, timeout_ms = timeout.as_millis() as u64, "{}", error);
                (ListenerState::TimedOut, ListenerOutcome::TimedOut(error))
            }
        };

        guard.release();

        ListenerReport {
            node,
            state,
            outcome,
        }
    }
}

fn connection_error(node: &NodeId, error: GatewayError) -> GatewayError {
    match error {
        e @ GatewayError::ListenerConnection { .. } => e,
        other => GatewayError::ListenerConnection {
            node: node.clone(),
            reason: other.to_string(),
        },
    }
}

/// Read the stream until a notification settles the listener.
async fn watch(
    stream: &mut dyn CommitStream,
    node: &NodeId,
    filter: &CommitFilter,
    operation: OperationKind,
) -> ListenerOutcome {
    loop {
        let event = match stream.next_event().await {
            Ok(Some(event)) => event,
            Ok(None) => {
                return ListenerOutcome::ConnectionError(GatewayError::ListenerConnection {
                    node: node.clone(),
                    reason: "notification stream closed".to_string(),
                })
            }
            Err(e) => {
                let error = connection_error(node, e);
                warn!(node = %node, "{}", error);
                return ListenerOutcome::ConnectionError(error);
            }
        };

        match (filter, event) {
            (CommitFilter::Transaction(expected), CommitEvent::Transaction { tx_id, code, block_number }) => {
                if &tx_id != expected {
                    continue;
                }
                info!(
                    tx_id = %tx_id,
                    code = %code,
                    block_number,
                    "Transaction {} has status of {} in block {}",
                    tx_id,
                    code,
                    block_number
                );
                if code.is_valid() {
                    return ListenerOutcome::Valid(format!("The {} transaction was valid.", operation));
                }
                let error = GatewayError::CommitInvalid {
                    node: node.clone(),
                    operation: operation.label().to_string(),
                    code: code.as_str().to_string(),
                };
                warn!(node = %node, "{}", error);
                return ListenerOutcome::Invalid(error);
            }
            (CommitFilter::ChannelBlock(expected), CommitEvent::Block { channel, tx_count, .. }) => {
                // Config blocks carry exactly one transaction.
                if tx_count != 1 {
                    continue;
                }
                if &channel == expected {
                    let message = format!(
                        "EventHub {} has reported a block update for channel {}",
                        node, channel
                    );
                    info!("{}", message);
                    return ListenerOutcome::Valid(message);
                }
                let error = GatewayError::UnexpectedChannelBlock {
                    node: node.clone(),
                    channel,
                };
                warn!(node = %node, "{}", error);
                return ListenerOutcome::Invalid(error);
            }
            _ => continue,
        }
    }
}

/// Result of joining the order submission with every listener.
#[derive(Debug)]
pub struct JoinedOutcome<T> {
    pub order_result: T,
    /// One report per listening node, in registration order.
    pub listener_results: Vec<ListenerReport>,
}

enum Slot {
    Open(CommitListener),
    Failed(ListenerReport),
}

/// Listeners for one operation.
pub struct CommitListenerPool {
    slots: Vec<Slot>,
}

impl CommitListenerPool {
    /// A pool with no listeners; joining it only awaits the submission.
    pub fn empty() -> Self {
        Self { slots: Vec::new() }
    }

    /// Open a listener on every node concurrently and wait until all are
    /// connected (or have failed to connect).
    pub async fn register(
        client: &dyn NodeClient,
        nodes: &[NodeId],
        filter: &CommitFilter,
        operation: OperationKind,
        timeout: Duration,
    ) -> Self {
        let opened = join_all(
            nodes
                .iter()
                .map(|node| CommitListener::register(client, node, filter, operation, timeout)),
        )
        .await;

        let slots = opened
            .into_iter()
            .map(|result| match result {
                Ok(listener) => Slot::Open(listener),
                Err(report) => Slot::Failed(report),
            })
            .collect();

        Self { slots }
    }

    /// Number of listeners that reached `Registered`.
    pub fn registered(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Open(_)))
            .count()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Run `order` concurrently with every listener and collect both.
    pub async fn join_with<F, T>(self, order: F) -> JoinedOutcome<T>
    where
        F: Future<Output = T>,
    {
        let mut failed = Vec::new();
        let mut open = Vec::new();
        for (index, slot) in self.slots.into_iter().enumerate() {
            match slot {
                Slot::Open(listener) => open.push((index, listener)),
                Slot::Failed(report) => failed.push((index, report)),
            }
        }

        let waits = join_all(
            open.into_iter()
                .map(|(index, listener)| async move { (index, listener.wait().await) }),
        );
        let (order_result, waited) = tokio::join!(order, waits);

        let mut ordered: Vec<(usize, ListenerReport)> = waited.into_iter().chain(failed).collect();
        ordered.sort_by_key(|(index, _)| *index);

        JoinedOutcome {
            order_result,
            listener_results: ordered.into_iter().map(|(_, report)| report).collect(),
        }
    }
}
