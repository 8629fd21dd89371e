//! Timeouts for the proposal and commit-listening phases.
//!
//! Each operation has its own budget: a join waits far longer for its
//! genesis block than an invoke waits for its commit notification.

use std::time::Duration;

use gateway_types::OperationKind;
use serde::{Deserialize, Serialize};

/// Per-operation timeouts used by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitConfig {
    /// Proposal fan-out budget for install and invoke.
    #[serde(with = "duration_ms")]
    pub proposal_timeout: Duration,

    /// Proposal fan-out budget for instantiate (chaincode containers start).
    #[serde(with = "duration_ms")]
    pub instantiate_proposal_timeout: Duration,

    /// Commit listener timer for invoke.
    #[serde(with = "duration_ms")]
    pub invoke_commit_timeout: Duration,

    /// Commit listener timer for instantiate.
    #[serde(with = "duration_ms")]
    pub instantiate_commit_timeout: Duration,

    /// Block listener timer for join.
    #[serde(with = "duration_ms")]
    pub join_block_timeout: Duration,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            proposal_timeout: Duration::from_secs(45),
            instantiate_proposal_timeout: Duration::from_secs(60),
            invoke_commit_timeout: Duration::from_secs(3),
            instantiate_commit_timeout: Duration::from_secs(60),
            join_block_timeout: Duration::from_secs(60),
        }
    }
}

impl CommitConfig {
    /// Proposal fan-out budget for an operation.
    pub fn proposal_timeout_for(&self, kind: OperationKind) -> Duration {
        match kind {
            OperationKind::InstantiateChaincode => self.instantiate_proposal_timeout,
            _ => self.proposal_timeout,
        }
    }

    /// Listener timer for an operation; zero when it has no listeners.
    pub fn listener_timeout_for(&self, kind: OperationKind) -> Duration {
        match kind {
            OperationKind::InvokeTransaction => self.invoke_commit_timeout,
            OperationKind::InstantiateChaincode => self.instantiate_commit_timeout,
            OperationKind::JoinChannel => self.join_block_timeout,
            OperationKind::CreateChannel | OperationKind::InstallChaincode => Duration::ZERO,
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let config = CommitConfig::default();
        assert_eq!(
            config.listener_timeout_for(OperationKind::InvokeTransaction),
            Duration::from_secs(3)
        );
        assert_eq!(
            config.listener_timeout_for(OperationKind::JoinChannel),
            Duration::from_secs(60)
        );
        assert_eq!(
            config.proposal_timeout_for(OperationKind::InstantiateChaincode),
            Duration::from_secs(60)
        );
        assert_eq!(
            config.proposal_timeout_for(OperationKind::InvokeTransaction),
            Duration::from_secs(45)
        );
    }

    #[test]
    fn test_durations_are_milliseconds_on_the_wire() {
        let json = serde_json::to_value(CommitConfig::default()).unwrap();
        assert_eq!(json["invoke_commit_timeout"], 3000);

        let config: CommitConfig =
            serde_json::from_str(r#"{"join_block_timeout": 1500}"#).unwrap();
        assert_eq!(config.join_block_timeout, Duration::from_millis(1500));
        assert_eq!(config.invoke_commit_timeout, Duration::from_secs(3));
    }
}
