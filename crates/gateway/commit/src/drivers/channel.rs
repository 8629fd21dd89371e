//! Channel creation and join.

use std::sync::Arc;

use gateway_client::NodeClient;
use gateway_types::{
    CommitFilter, CreateChannelRequest, GatewayError, JoinChannelRequest, OperationKind,
    OperationOutcome, OrderRequest, OrderSubmissionResult, Result,
};
use tracing::{error, info, instrument};

use crate::config::CommitConfig;
use crate::coordinator::CommitCoordinator;
use crate::quorum;

/// Submit a signed channel configuration to the ordering authority.
///
/// Channel creation is not repeated on peers, so the only success criterion
/// is the ordering status.
#[instrument(skip(client, config, request), fields(org = %client.org(), channel = %request.channel_name))]
pub async fn create_channel(
    client: Arc<dyn NodeClient>,
    config: &CommitConfig,
    request: &CreateChannelRequest,
) -> Result<OperationOutcome> {
    request.validate()?;
    let channel = request.channel();

    let envelope = match tokio::fs::read(&request.channel_config_path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let err = GatewayError::ChannelConfig {
                path: request.channel_config_path.clone(),
                reason: e.to_string(),
            };
            error!("{}", err);
            return Ok(OperationOutcome::failed(format!(
                "Failed to initialize the channel: {}",
                err
            )));
        }
    };

    let order = OrderRequest::CreateChannel {
        tx_id: client.new_tx_id(true),
        channel: channel.clone(),
        config: envelope,
    };

    let coordinator = CommitCoordinator::new(client, config.clone());
    let report = coordinator
        .order_only(OperationKind::CreateChannel, order)
        .await;

    match report.into_result() {
        Ok(_) => {
            info!("Successfully created the channel '{}'", channel);
            Ok(OperationOutcome::succeeded(format!(
                "Channel '{}' created Successfully",
                channel
            )))
        }
        Err(e) => {
            error!(error = %e, "Failed to create the channel '{}'", channel);
            Ok(OperationOutcome::failed(format!(
                "Failed to create the channel '{}'",
                channel
            )))
        }
    }
}

/// Have the organization's peers join a channel.
///
/// The genesis block is fetched first; block listeners on every event node of
/// the organization are registered before the join request goes out, and a
/// listener resolves when the channel's config block arrives.
#[instrument(skip(client, config, request), fields(org = %client.org(), channel = %request.channel_name))]
pub async fn join_channel(
    client: Arc<dyn NodeClient>,
    config: &CommitConfig,
    request: &JoinChannelRequest,
) -> Result<OperationOutcome> {
    request.validate()?;
    let channel = request.channel();
    let org = client.org().clone();
    info!("Calling peers in organization \"{}\" to join the channel", org);

    let failed = |e: &GatewayError| {
        error!(error = %e, "Failed to join channel");
        OperationOutcome::failed(format!("Failed to join all peers to channel. cause:{}", e))
    };

    if !client.has_channel(&channel) {
        return Ok(failed(&GatewayError::ChannelNotFound(channel)));
    }

    let genesis = match client.fetch_genesis_block(&channel).await {
        Ok(block) => block,
        Err(e) => return Ok(failed(&e)),
    };

    let listen_on = client.event_nodes(None);
    let filter = CommitFilter::ChannelBlock(channel.clone());
    let tx_id = client.new_tx_id(true);

    let submission = {
        let client = client.clone();
        let peers = request.peers.clone();
        let channel = channel.clone();
        async move {
            let responses = match client.join_channel(&peers, &channel, &genesis).await {
                Ok(responses) => quorum::complete_response_set(&peers, responses),
                Err(e) => return Err(e),
            };
            let verdict = quorum::evaluate(&responses, peers.len());
            if verdict.accepted {
                info!("Successfully joined peers to the channel {}", channel);
                Ok(OrderSubmissionResult::success())
            } else {
                Err(GatewayError::QuorumRejected(verdict.reasons.join("; ")))
            }
        }
    };

    let coordinator = CommitCoordinator::new(client, config.clone());
    let report = coordinator
        .submit_and_listen(tx_id, OperationKind::JoinChannel, &listen_on, &filter, submission)
        .await;

    match report.into_result() {
        Ok(_) => {
            let message = format!(
                "Successfully joined peers in organization {} to the channel:{}",
                org, channel
            );
            info!("{}", message);
            Ok(OperationOutcome::succeeded(message))
        }
        Err(e) => Ok(failed(&e)),
    }
}
