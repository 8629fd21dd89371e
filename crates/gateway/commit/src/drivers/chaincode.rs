//! Chaincode install, instantiate and invoke.

use std::sync::Arc;

use gateway_client::NodeClient;
use gateway_types::{
    ChaincodeSpec, ChannelId, GatewayError, InstallChaincodeRequest, InstantiateChaincodeRequest,
    InvokeRequest, NodeId, OperationOutcome, Proposal, ProposalPayload, Result,
};
use tracing::{error, info, instrument};

use crate::config::CommitConfig;
use crate::coordinator::CommitCoordinator;

fn targets_or_default(client: &dyn NodeClient, peers: &[NodeId], channel: &ChannelId) -> Vec<NodeId> {
    if peers.is_empty() {
        client.default_endorsers(channel)
    } else {
        peers.to_vec()
    }
}

/// Install a chaincode package on the target peers.
///
/// Endorsement only: the package lands on each peer's filesystem and nothing
/// is ordered, so success means every target accepted the proposal.
#[instrument(skip(client, config, request), fields(org = %client.org(), chaincode = %request.chaincode_name))]
pub async fn install_chaincode(
    client: Arc<dyn NodeClient>,
    config: &CommitConfig,
    request: &InstallChaincodeRequest,
) -> Result<OperationOutcome> {
    request.validate()?;
    let chaincode_type = request
        .chaincode_type
        .ok_or_else(|| GatewayError::missing("chaincodeType"))?;

    let proposal = Proposal::new(
        client.new_tx_id(true),
        request.peers.clone(),
        ProposalPayload::Install {
            chaincode: ChaincodeSpec {
                name: request.chaincode_name.clone(),
                version: request.chaincode_version.clone(),
                chaincode_type,
            },
            path: request.chaincode_path.clone(),
        },
    );

    let coordinator = CommitCoordinator::new(client, config.clone());
    match coordinator.propose(&proposal).await.into_result() {
        Ok(_) => {
            info!("Successfully install chaincode");
            Ok(OperationOutcome::succeeded("Successfully install chaincode"))
        }
        Err(e) => {
            error!(error = %e, "Failed to install");
            Ok(OperationOutcome::failed(format!("Failed to install due to:{}", e)))
        }
    }
}

/// Instantiate an installed chaincode on a channel and wait for the
/// instantiate transaction to commit on the organization's event nodes.
#[instrument(skip(client, config, request), fields(org = %client.org(), channel = %request.channel_name, chaincode = %request.chaincode_name))]
pub async fn instantiate_chaincode(
    client: Arc<dyn NodeClient>,
    config: &CommitConfig,
    request: &InstantiateChaincodeRequest,
) -> Result<OperationOutcome> {
    request.validate()?;
    let chaincode_type = request
        .chaincode_type
        .ok_or_else(|| GatewayError::missing("chaincodeType"))?;
    let channel = request.channel();
    let org = client.org().clone();

    if !client.has_channel(&channel) {
        let e = GatewayError::ChannelNotFound(channel);
        error!("{}", e);
        return Ok(OperationOutcome::failed(format!("Failed to instantiate. cause:{}", e)));
    }

    let proposal = Proposal::new(
        client.new_tx_id(true),
        targets_or_default(client.as_ref(), &request.peers, &channel),
        ProposalPayload::Instantiate {
            channel: channel.clone(),
            chaincode: ChaincodeSpec {
                name: request.chaincode_name.clone(),
                version: request.chaincode_version.clone(),
                chaincode_type,
            },
            function: request.fcn.clone(),
            args: request.args.clone().unwrap_or_default(),
        },
    );
    let listen_on = client.event_nodes(Some(&channel));

    let coordinator = CommitCoordinator::new(client, config.clone());
    match coordinator.execute(proposal, &listen_on).await.into_result() {
        Ok(_) => {
            let message = format!(
                "Successfully instantiate chaincode in organization {} to the channel '{}'",
                org, channel
            );
            info!("{}", message);
            Ok(OperationOutcome::succeeded(message))
        }
        Err(e) => {
            error!(error = %e, "Failed to instantiate");
            Ok(OperationOutcome::failed(format!("Failed to instantiate. cause:{}", e)))
        }
    }
}

/// Invoke a chaincode function and wait for the transaction to commit.
///
/// The outcome carries the transaction id on success and failure alike.
#[instrument(skip(client, config, request), fields(org = %client.org(), channel = %request.channel_name, chaincode = %request.chaincode_name, fcn = %request.fcn))]
pub async fn invoke_chaincode(
    client: Arc<dyn NodeClient>,
    config: &CommitConfig,
    request: &InvokeRequest,
) -> Result<OperationOutcome> {
    request.validate()?;
    let channel = request.channel();

    if !client.has_channel(&channel) {
        let e = GatewayError::ChannelNotFound(channel);
        error!("{}", e);
        return Ok(OperationOutcome::failed(format!("Failed to invoke chaincode. cause:{}", e)));
    }

    let tx_id = client.new_tx_id(false);
    let proposal = Proposal::new(
        tx_id.clone(),
        targets_or_default(client.as_ref(), &request.peers, &channel),
        ProposalPayload::Invoke {
            channel: channel.clone(),
            chaincode: request.chaincode_name.clone(),
            function: request.fcn.clone(),
            args: request.args.clone().unwrap_or_default(),
        },
    );
    let listen_on = client.event_nodes(Some(&channel));

    let coordinator = CommitCoordinator::new(client, config.clone());
    let outcome = match coordinator.execute(proposal, &listen_on).await.into_result() {
        Ok(_) => {
            let message = format!(
                "Successfully invoked the chaincode {} to the channel '{}' for transaction ID: {}",
                request.chaincode_name, channel, tx_id
            );
            info!("{}", message);
            OperationOutcome::succeeded(message)
        }
        Err(e) => {
            error!(error = %e, "Failed to invoke chaincode");
            OperationOutcome::failed(format!("Failed to invoke chaincode. cause:{}", e))
        }
    };

    Ok(outcome.with_tx_id(tx_id))
}
