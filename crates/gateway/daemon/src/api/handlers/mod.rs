//! API request handlers

mod chaincodes;
mod channels;
mod health;
mod queries;

pub use chaincodes::*;
pub use channels::*;
pub use health::*;
pub use queries::*;

use crate::error::{ApiError, ApiResult};
use axum::Json;
use gateway_types::{GatewayError, NodeId, OperationOutcome};

/// Turn an operation outcome into a response; `success: false` is a 500.
fn respond(outcome: OperationOutcome) -> ApiResult<Json<OperationOutcome>> {
    if outcome.success {
        Ok(Json(outcome))
    } else {
        Err(ApiError::OperationFailed(outcome.message))
    }
}

/// Required `peer` query parameter.
fn require_peer(peer: Option<String>) -> ApiResult<NodeId> {
    peer.filter(|p| !p.trim().is_empty())
        .map(NodeId::new)
        .ok_or_else(|| GatewayError::missing("peer").into())
}
