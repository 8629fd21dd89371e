//! Simulated network
//!
//! Backs every configured organization with a [`SimNodeClient`] over one
//! shared [`SimNetwork`], so the daemon runs without external nodes.

mod client;
mod network;

pub use client::SimNodeClient;
pub use network::SimNetwork;

use std::sync::Arc;

use gateway_client::StaticClientProvider;
use gateway_types::{ChannelId, NodeId, OrgName};
use tracing::info;

use crate::config::NetworkConfig;

/// Build the client provider for every organization in `config`.
pub fn build_provider(config: &NetworkConfig, network: Arc<SimNetwork>) -> StaticClientProvider {
    let channels: Vec<ChannelId> = config.channels.iter().map(ChannelId::new).collect();

    config
        .organizations
        .iter()
        .fold(StaticClientProvider::new(), |provider, org| {
            info!(org = %org.name, peers = org.peers.len(), "Registering organization");
            let client = SimNodeClient::new(
                OrgName::new(&org.name),
                org.peers.iter().map(NodeId::new).collect(),
                channels.clone(),
                network.clone(),
            );
            provider.with_org(Arc::new(client), org.users.iter().cloned())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_client::NodeClientProvider;

    #[tokio::test]
    async fn test_provider_covers_configured_orgs() {
        let config = NetworkConfig::default();
        let provider = build_provider(&config, Arc::new(SimNetwork::new(&config)));

        let client = provider
            .client_for(&OrgName::new("org2"), Some("admin"))
            .await
            .unwrap();
        assert_eq!(client.org().as_str(), "org2");
        assert!(client.has_channel(&ChannelId::new("mychannel")));
        assert_eq!(
            client.event_nodes(None),
            vec![
                NodeId::new("peer0.org2.example.com"),
                NodeId::new("peer1.org2.example.com")
            ]
        );

        // Nobody has joined yet, so no peer sees the channel's blocks.
        let channel = ChannelId::new("mychannel");
        assert!(client.event_nodes(Some(&channel)).is_empty());
        assert!(client.default_endorsers(&channel).is_empty());
    }
}
