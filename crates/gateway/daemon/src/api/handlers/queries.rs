//! Read-only query handlers

use super::require_peer;
use crate::api::caller::Caller;
use crate::api::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use gateway_types::{
    BlockInfo, ChainInfo, ChaincodeInfo, ChaincodeScope, ChannelId, GatewayError, TransactionInfo,
    TxId,
};
use serde::Deserialize;
use tracing::debug;

/// Query parameters naming the peer to ask
#[derive(Debug, Deserialize)]
pub struct PeerParams {
    pub peer: Option<String>,
}

/// Query parameters for a chaincode query
#[derive(Debug, Deserialize)]
pub struct ChaincodeQueryParams {
    pub peer: Option<String>,
    pub fcn: Option<String>,
    /// JSON array; single quotes are accepted in place of double quotes.
    pub args: Option<String>,
}

/// Parse the `args` query parameter into chaincode arguments.
///
/// Non-string JSON elements are passed in their JSON text form.
pub fn parse_args(raw: &str) -> ApiResult<Vec<String>> {
    let normalized = raw.replace('\'', "\"");
    let values: Vec<serde_json::Value> = serde_json::from_str(&normalized)
        .map_err(|e| ApiError::BadRequest(format!("Invalid args: {}", e)))?;

    Ok(values
        .into_iter()
        .map(|value| match value {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .collect())
}

/// Evaluate a chaincode function on one peer
pub async fn query_chaincode(
    State(state): State<AppState>,
    Path((channel, chaincode)): Path<(String, String)>,
    Query(params): Query<ChaincodeQueryParams>,
    Caller(ctx): Caller,
) -> ApiResult<Json<serde_json::Value>> {
    let peer = require_peer(params.peer)?;
    let fcn = params
        .fcn
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| ApiError::from(GatewayError::missing("fcn")))?;
    let args = match params.args {
        Some(raw) => parse_args(&raw)?,
        None => return Err(GatewayError::missing("args").into()),
    };
    debug!(channel = %channel, chaincode = %chaincode, fcn = %fcn, ?args, "Query chaincode");

    let value = state
        .gateway
        .query_chaincode(&ctx, &peer, &ChannelId::new(channel), &chaincode, &fcn, &args)
        .await?;
    Ok(Json(value))
}

/// Get a block by number
pub async fn query_block(
    State(state): State<AppState>,
    Path((channel, number)): Path<(String, u64)>,
    Query(params): Query<PeerParams>,
    Caller(ctx): Caller,
) -> ApiResult<Json<BlockInfo>> {
    let peer = require_peer(params.peer)?;
    let block = state
        .gateway
        .query_block(&ctx, &peer, &ChannelId::new(channel), number)
        .await?;
    Ok(Json(block))
}

/// Get a committed transaction by id
pub async fn query_transaction(
    State(state): State<AppState>,
    Path((channel, tx_id)): Path<(String, String)>,
    Query(params): Query<PeerParams>,
    Caller(ctx): Caller,
) -> ApiResult<Json<TransactionInfo>> {
    let peer = require_peer(params.peer)?;
    let tx = state
        .gateway
        .query_transaction(&ctx, &peer, &ChannelId::new(channel), &TxId::new(tx_id))
        .await?;
    Ok(Json(tx))
}

/// Get the height and head hashes of a channel
pub async fn query_chain_info(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    Query(params): Query<PeerParams>,
    Caller(ctx): Caller,
) -> ApiResult<Json<ChainInfo>> {
    let peer = require_peer(params.peer)?;
    let info = state
        .gateway
        .query_chain_info(&ctx, &peer, &ChannelId::new(channel))
        .await?;
    Ok(Json(info))
}

/// Query parameters for listing chaincodes
#[derive(Debug, Deserialize)]
pub struct ChaincodeListParams {
    pub peer: Option<String>,
    #[serde(rename = "type")]
    pub scope: Option<ChaincodeScope>,
    pub channel: Option<String>,
}

/// List installed chaincodes on a peer, or those instantiated on a channel
pub async fn list_chaincodes(
    State(state): State<AppState>,
    Query(params): Query<ChaincodeListParams>,
    Caller(ctx): Caller,
) -> ApiResult<Json<Vec<ChaincodeInfo>>> {
    let peer = require_peer(params.peer)?;
    let scope = params
        .scope
        .ok_or_else(|| ApiError::from(GatewayError::missing("type")))?;
    let channel = params.channel.map(ChannelId::new);

    let chaincodes = state
        .gateway
        .query_chaincodes(&ctx, &peer, scope, channel.as_ref())
        .await?;
    Ok(Json(chaincodes))
}

/// List the channels a peer has joined
pub async fn list_channels(
    State(state): State<AppState>,
    Query(params): Query<PeerParams>,
    Caller(ctx): Caller,
) -> ApiResult<Json<Vec<ChannelId>>> {
    let peer = require_peer(params.peer)?;
    let channels = state.gateway.query_channels(&ctx, &peer).await?;
    Ok(Json(channels))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args_accepts_single_quotes() {
        let args = parse_args("['salmon-1', 12]").unwrap();
        assert_eq!(args, vec!["salmon-1".to_string(), "12".to_string()]);
    }

    #[test]
    fn test_parse_args_rejects_non_array() {
        assert!(matches!(parse_args("salmon-1"), Err(ApiError::BadRequest(_))));
    }
}
