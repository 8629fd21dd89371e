//! The unit returned to the boundary layer.

use crate::TxId;
use serde::{Deserialize, Serialize};

/// Aggregate result of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<TxId>,
}

impl OperationOutcome {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            tx_id: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            tx_id: None,
        }
    }

    pub fn with_tx_id(mut self, tx_id: TxId) -> Self {
        self.tx_id = Some(tx_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_json_omits_missing_tx_id() {
        let outcome = OperationOutcome::succeeded("Successfully install chaincode");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("tx_id").is_none());

        let with_tx = OperationOutcome::succeeded("ok").with_tx_id(TxId::new("abc"));
        let json = serde_json::to_value(&with_tx).unwrap();
        assert_eq!(json["tx_id"], "abc");
    }
}
