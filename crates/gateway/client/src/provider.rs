//! Lookup of per-organization node clients.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use gateway_types::{GatewayError, OrgName, Result};
use tracing::debug;

use crate::node::NodeClient;

/// Supplies a node client for an organization, optionally bound to a user.
#[async_trait]
pub trait NodeClientProvider: Send + Sync {
    /// Get the client for `org`.
    ///
    /// Fails with `IdentityNotFound` when `user` is given but has no
    /// enrolled identity in the organization.
    async fn client_for(&self, org: &OrgName, user: Option<&str>) -> Result<Arc<dyn NodeClient>>;
}

struct OrgEntry {
    client: Arc<dyn NodeClient>,
    users: HashSet<String>,
}

/// Provider over a fixed set of pre-built clients.
#[derive(Default)]
pub struct StaticClientProvider {
    orgs: HashMap<OrgName, OrgEntry>,
}

impl StaticClientProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an organization's client and its enrolled users.
    pub fn with_org<I, S>(mut self, client: Arc<dyn NodeClient>, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let org = client.org().clone();
        self.orgs.insert(
            org,
            OrgEntry {
                client,
                users: users.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    /// Organizations known to this provider.
    pub fn orgs(&self) -> impl Iterator<Item = &OrgName> {
        self.orgs.keys()
    }
}

#[async_trait]
impl NodeClientProvider for StaticClientProvider {
    async fn client_for(&self, org: &OrgName, user: Option<&str>) -> Result<Arc<dyn NodeClient>> {
        let entry = self
            .orgs
            .get(org)
            .ok_or_else(|| GatewayError::Validation(format!("Unknown organization {}", org)))?;

        if let Some(user) = user {
            if !entry.users.contains(user) {
                return Err(GatewayError::IdentityNotFound {
                    org: org.clone(),
                    user: user.to_string(),
                });
            }
            debug!(org = %org, user, "User was found to be registered and enrolled");
        }

        Ok(entry.client.clone())
    }
}
