//! Channel handlers

use super::respond;
use crate::api::caller::Caller;
use crate::api::json::ApiJson;
use crate::api::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    Json,
};
use gateway_types::{CreateChannelRequest, JoinChannelRequest, NodeId, OperationOutcome};
use serde::Deserialize;
use tracing::info;

/// Create a channel from a config envelope on the daemon's filesystem
pub async fn create_channel(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    ApiJson(request): ApiJson<CreateChannelRequest>,
) -> ApiResult<Json<OperationOutcome>> {
    info!(
        org = %ctx.org,
        channel = %request.channel_name,
        "<<< Create Channel >>>"
    );
    respond(state.gateway.create_channel(&ctx, &request).await?)
}

/// Join request body
#[derive(Debug, Deserialize)]
pub struct JoinChannelBody {
    #[serde(default)]
    pub peers: Vec<NodeId>,
}

/// Join the caller organization's peers to a channel
pub async fn join_channel(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    Caller(ctx): Caller,
    ApiJson(body): ApiJson<JoinChannelBody>,
) -> ApiResult<Json<OperationOutcome>> {
    info!(org = %ctx.org, channel = %channel, "<<< Join Channel >>>");
    let request = JoinChannelRequest {
        channel_name: channel,
        peers: body.peers,
    };
    respond(state.gateway.join_channel(&ctx, &request).await?)
}
