//! Chaincode lifecycle and invoke handlers

use super::respond;
use crate::api::caller::Caller;
use crate::api::json::ApiJson;
use crate::api::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    Json,
};
use gateway_types::{
    ChaincodeType, InstallChaincodeRequest, InstantiateChaincodeRequest, InvokeRequest, NodeId,
    OperationOutcome,
};
use serde::Deserialize;
use tracing::info;

/// Install a chaincode on the caller organization's peers
pub async fn install_chaincode(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    ApiJson(request): ApiJson<InstallChaincodeRequest>,
) -> ApiResult<Json<OperationOutcome>> {
    info!(
        org = %ctx.org,
        chaincode = %request.chaincode_name,
        version = %request.chaincode_version,
        "<<< Install chaincode >>>"
    );
    respond(state.gateway.install_chaincode(&ctx, &request).await?)
}

/// Instantiate request body; the channel comes from the path
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstantiateBody {
    #[serde(default)]
    pub peers: Vec<NodeId>,
    #[serde(default)]
    pub chaincode_name: String,
    #[serde(default)]
    pub chaincode_version: String,
    pub chaincode_type: Option<ChaincodeType>,
    #[serde(default)]
    pub fcn: Option<String>,
    pub args: Option<Vec<String>>,
}

/// Instantiate an installed chaincode on a channel
pub async fn instantiate_chaincode(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    Caller(ctx): Caller,
    ApiJson(body): ApiJson<InstantiateBody>,
) -> ApiResult<Json<OperationOutcome>> {
    info!(
        org = %ctx.org,
        channel = %channel,
        chaincode = %body.chaincode_name,
        "<<< Instantiate chaincode >>>"
    );
    let request = InstantiateChaincodeRequest {
        peers: body.peers,
        channel_name: channel,
        chaincode_name: body.chaincode_name,
        chaincode_version: body.chaincode_version,
        chaincode_type: body.chaincode_type,
        fcn: body.fcn,
        args: body.args,
    };
    respond(state.gateway.instantiate_chaincode(&ctx, &request).await?)
}

/// Invoke request body; channel and chaincode come from the path
#[derive(Debug, Deserialize)]
pub struct InvokeBody {
    #[serde(default)]
    pub peers: Vec<NodeId>,
    #[serde(default)]
    pub fcn: String,
    pub args: Option<Vec<String>>,
}

/// Invoke a chaincode function and wait for it to commit
pub async fn invoke_chaincode(
    State(state): State<AppState>,
    Path((channel, chaincode)): Path<(String, String)>,
    Caller(ctx): Caller,
    ApiJson(body): ApiJson<InvokeBody>,
) -> ApiResult<Json<OperationOutcome>> {
    info!(
        org = %ctx.org,
        channel = %channel,
        chaincode = %chaincode,
        fcn = %body.fcn,
        "<<< Invoke transaction >>>"
    );
    let request = InvokeRequest {
        peers: body.peers,
        channel_name: channel,
        chaincode_name: chaincode,
        fcn: body.fcn,
        args: body.args,
    };
    respond(state.gateway.invoke_chaincode(&ctx, &request).await?)
}
