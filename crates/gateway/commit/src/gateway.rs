//! Gateway facade
//!
//! Single entry point for the boundary layer. Resolves the caller's
//! organization client, then runs an operation driver or forwards a
//! read-only query.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use gateway_client::{NodeClient, NodeClientProvider};
use gateway_types::{
    BlockInfo, ChainInfo, ChaincodeInfo, ChaincodeScope, ChannelId, CreateChannelRequest,
    GatewayError, InstallChaincodeRequest, InstantiateChaincodeRequest, InvokeRequest,
    JoinChannelRequest, NodeId, OperationOutcome, OrgName, Result, TransactionInfo, TxId,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::config::CommitConfig;
use crate::drivers;

/// Who is asking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Unique request ID for tracing
    pub request_id: Uuid,
    pub org: OrgName,
    /// Enrolled user to act as; `None` uses the organization identity.
    pub user: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl RequestContext {
    pub fn new(org: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            org: OrgName::new(org),
            user: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

/// Facade over the client provider and the operation drivers.
pub struct Gateway {
    provider: Arc<dyn NodeClientProvider>,
    config: CommitConfig,
}

impl Gateway {
    pub fn new(provider: Arc<dyn NodeClientProvider>, config: CommitConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &CommitConfig {
        &self.config
    }

    async fn client(&self, ctx: &RequestContext) -> Result<Arc<dyn NodeClient>> {
        let client = self
            .provider
            .client_for(&ctx.org, ctx.user.as_deref())
            .await?;
        debug!(
            request_id = %ctx.request_id,
            org = %ctx.org,
            "Successfully got the client for the organization"
        );
        Ok(client)
    }

    pub async fn create_channel(
        &self,
        ctx: &RequestContext,
        request: &CreateChannelRequest,
    ) -> Result<OperationOutcome> {
        request.validate()?;
        let client = self.client(ctx).await?;
        drivers::create_channel(client, &self.config, request).await
    }

    pub async fn join_channel(
        &self,
        ctx: &RequestContext,
        request: &JoinChannelRequest,
    ) -> Result<OperationOutcome> {
        request.validate()?;
        let client = self.client(ctx).await?;
        drivers::join_channel(client, &self.config, request).await
    }

    pub async fn install_chaincode(
        &self,
        ctx: &RequestContext,
        request: &InstallChaincodeRequest,
    ) -> Result<OperationOutcome> {
        request.validate()?;
        let client = self.client(ctx).await?;
        drivers::install_chaincode(client, &self.config, request).await
    }

    pub async fn instantiate_chaincode(
        &self,
        ctx: &RequestContext,
        request: &InstantiateChaincodeRequest,
    ) -> Result<OperationOutcome> {
        request.validate()?;
        let client = self.client(ctx).await?;
        drivers::instantiate_chaincode(client, &self.config, request).await
    }

    pub async fn invoke_chaincode(
        &self,
        ctx: &RequestContext,
        request: &InvokeRequest,
    ) -> Result<OperationOutcome> {
        request.validate()?;
        let client = self.client(ctx).await?;
        drivers::invoke_chaincode(client, &self.config, request).await
    }

    /// Evaluate a chaincode function on one peer.
    ///
    /// The payload is returned as JSON when it parses, otherwise as a string.
    #[instrument(skip(self, ctx, args), fields(org = %ctx.org))]
    pub async fn query_chaincode(
        &self,
        ctx: &RequestContext,
        peer: &NodeId,
        channel: &ChannelId,
        chaincode: &str,
        function: &str,
        args: &[String],
    ) -> Result<serde_json::Value> {
        let client = self.client(ctx).await?;
        if !client.has_channel(channel) {
            return Err(GatewayError::ChannelNotFound(channel.clone()));
        }
        let payload = client
            .query_chaincode(peer, channel, chaincode, function, args)
            .await?;
        Ok(decode_payload(&payload))
    }

    pub async fn query_block(
        &self,
        ctx: &RequestContext,
        peer: &NodeId,
        channel: &ChannelId,
        number: u64,
    ) -> Result<BlockInfo> {
        let client = self.client(ctx).await?;
        if !client.has_channel(channel) {
            return Err(GatewayError::ChannelNotFound(channel.clone()));
        }
        client.query_block(peer, channel, number).await
    }

    pub async fn query_transaction(
        &self,
        ctx: &RequestContext,
        peer: &NodeId,
        channel: &ChannelId,
        tx_id: &TxId,
    ) -> Result<TransactionInfo> {
        let client = self.client(ctx).await?;
        if !client.has_channel(channel) {
            return Err(GatewayError::ChannelNotFound(channel.clone()));
        }
        client.query_transaction(peer, channel, tx_id).await
    }

    pub async fn query_chain_info(
        &self,
        ctx: &RequestContext,
        peer: &NodeId,
        channel: &ChannelId,
    ) -> Result<ChainInfo> {
        let client = self.client(ctx).await?;
        if !client.has_channel(channel) {
            return Err(GatewayError::ChannelNotFound(channel.clone()));
        }
        client.query_chain_info(peer, channel).await
    }

    /// Installed chaincodes on a peer, or those instantiated on a channel.
    pub async fn query_chaincodes(
        &self,
        ctx: &RequestContext,
        peer: &NodeId,
        scope: ChaincodeScope,
        channel: Option<&ChannelId>,
    ) -> Result<Vec<ChaincodeInfo>> {
        if scope == ChaincodeScope::Instantiated && channel.is_none() {
            return Err(GatewayError::missing("channel"));
        }
        let client = self.client(ctx).await?;
        client.query_chaincodes(peer, scope, channel).await
    }

    pub async fn query_channels(&self, ctx: &RequestContext, peer: &NodeId) -> Result<Vec<ChannelId>> {
        let client = self.client(ctx).await?;
        client.query_channels(peer).await
    }
}

fn decode_payload(payload: &[u8]) -> serde_json::Value {
    serde_json::from_slice(payload).unwrap_or_else(|_| {
        serde_json::Value::String(String::from_utf8_lossy(payload).into_owned())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_client::{MockNodeClient, StaticClientProvider};

    fn gateway(client: MockNodeClient) -> Gateway {
        let provider = StaticClientProvider::new().with_org(Arc::new(client), ["alice"]);
        Gateway::new(Arc::new(provider), CommitConfig::default())
    }

    #[tokio::test]
    async fn test_validation_runs_before_client_lookup() {
        let gw = gateway(MockNodeClient::new("fredrick").with_peers(["peer0"]));
        let request = InvokeRequest {
            peers: vec![],
            channel_name: "mychannel".to_string(),
            chaincode_name: String::new(),
            fcn: "move".to_string(),
            args: Some(vec![]),
        };

        let err = gw
            .invoke_chaincode(&RequestContext::new("nobody"), &request)
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::missing("chaincodeName"));
    }

    #[tokio::test]
    async fn test_unknown_user_is_propagated() {
        let gw = gateway(MockNodeClient::new("fredrick").with_peers(["peer0"]));
        let request = JoinChannelRequest {
            channel_name: "mychannel".to_string(),
            peers: vec![NodeId::new("peer0")],
        };

        let err = gw
            .join_channel(&RequestContext::new("fredrick").with_user("mallory"), &request)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::IdentityNotFound { .. }));
    }

    #[tokio::test]
    async fn test_query_payload_decoding() {
        let gw = gateway(
            MockNodeClient::new("fredrick")
                .with_peers(["peer0"])
                .with_channel("mychannel")
                .with_query_payload(r#"{"weight": 12}"#),
        );
        let ctx = RequestContext::new("fredrick").with_user("alice");

        let value = gw
            .query_chaincode(
                &ctx,
                &NodeId::new("peer0"),
                &ChannelId::new("mychannel"),
                "salmon",
                "query",
                &["salmon-1".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(value["weight"], 12);

        assert_eq!(decode_payload(b"plain text"), serde_json::json!("plain text"));
    }

    #[tokio::test]
    async fn test_query_on_undefined_channel() {
        let gw = gateway(MockNodeClient::new("fredrick").with_peers(["peer0"]));
        let err = gw
            .query_chain_info(
                &RequestContext::new("fredrick"),
                &NodeId::new("peer0"),
                &ChannelId::new("nochannel"),
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Channel nochannel was not defined in the connection profile"
        );
    }
}
