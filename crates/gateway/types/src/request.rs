//! Driver request shapes
//!
//! These are the inputs the boundary layer hands to each operation driver.
//! `validate` enforces presence of required fields; a failing request never
//! reaches the coordinator.

use crate::error::{GatewayError, Result};
use crate::{ChaincodeType, ChannelId, NodeId};
use serde::{Deserialize, Serialize};

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GatewayError::missing(field));
    }
    Ok(())
}

fn require_peers(peers: &[NodeId]) -> Result<()> {
    if peers.is_empty() {
        return Err(GatewayError::missing("peers"));
    }
    Ok(())
}

/// Create a channel from a config envelope on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChannelRequest {
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub channel_config_path: String,
}

impl CreateChannelRequest {
    pub fn validate(&self) -> Result<()> {
        require(&self.channel_name, "channelName")?;
        require(&self.channel_config_path, "channelConfigPath")
    }

    pub fn channel(&self) -> ChannelId {
        ChannelId::new(&self.channel_name)
    }
}

/// Have an organization's peers join a channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinChannelRequest {
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub peers: Vec<NodeId>,
}

impl JoinChannelRequest {
    pub fn validate(&self) -> Result<()> {
        require(&self.channel_name, "channelName")?;
        require_peers(&self.peers)
    }

    pub fn channel(&self) -> ChannelId {
        ChannelId::new(&self.channel_name)
    }
}

/// Install a chaincode package on target peers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallChaincodeRequest {
    #[serde(default)]
    pub peers: Vec<NodeId>,
    #[serde(default)]
    pub chaincode_name: String,
    #[serde(default)]
    pub chaincode_path: String,
    #[serde(default)]
    pub chaincode_version: String,
    pub chaincode_type: Option<ChaincodeType>,
}

impl InstallChaincodeRequest {
    pub fn validate(&self) -> Result<()> {
        require_peers(&self.peers)?;
        require(&self.chaincode_name, "chaincodeName")?;
        require(&self.chaincode_path, "chaincodePath")?;
        require(&self.chaincode_version, "chaincodeVersion")?;
        if self.chaincode_type.is_none() {
            return Err(GatewayError::missing("chaincodeType"));
        }
        Ok(())
    }
}

/// Instantiate an installed chaincode on a channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstantiateChaincodeRequest {
    /// Endorsing peers; empty means the client's default endorsers.
    #[serde(default)]
    pub peers: Vec<NodeId>,
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub chaincode_name: String,
    #[serde(default)]
    pub chaincode_version: String,
    pub chaincode_type: Option<ChaincodeType>,
    #[serde(default)]
    pub fcn: Option<String>,
    pub args: Option<Vec<String>>,
}

impl InstantiateChaincodeRequest {
    pub fn validate(&self) -> Result<()> {
        require(&self.chaincode_name, "chaincodeName")?;
        require(&self.chaincode_version, "chaincodeVersion")?;
        require(&self.channel_name, "channelName")?;
        if self.chaincode_type.is_none() {
            return Err(GatewayError::missing("chaincodeType"));
        }
        if self.args.is_none() {
            return Err(GatewayError::missing("args"));
        }
        Ok(())
    }

    pub fn channel(&self) -> ChannelId {
        ChannelId::new(&self.channel_name)
    }
}

/// Invoke a chaincode function on a channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeRequest {
    #[serde(default)]
    pub peers: Vec<NodeId>,
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub chaincode_name: String,
    #[serde(default)]
    pub fcn: String,
    pub args: Option<Vec<String>>,
}

impl InvokeRequest {
    pub fn validate(&self) -> Result<()> {
        require(&self.chaincode_name, "chaincodeName")?;
        require(&self.channel_name, "channelName")?;
        require(&self.fcn, "fcn")?;
        if self.args.is_none() {
            return Err(GatewayError::missing("args"));
        }
        Ok(())
    }

    pub fn channel(&self) -> ChannelId {
        ChannelId::new(&self.channel_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_validation_order() {
        let mut request = InstallChaincodeRequest {
            peers: vec![],
            chaincode_name: "salmon".to_string(),
            chaincode_path: "github.com/salmon".to_string(),
            chaincode_version: "v0".to_string(),
            chaincode_type: None,
        };
        assert_eq!(
            request.validate().unwrap_err(),
            GatewayError::missing("peers")
        );

        request.peers.push(NodeId::new("peer0"));
        assert_eq!(
            request.validate().unwrap_err(),
            GatewayError::missing("chaincodeType")
        );

        request.chaincode_type = Some(ChaincodeType::Golang);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_invoke_request_from_json() {
        let request: InvokeRequest = serde_json::from_str(
            r#"{"peers":["peer0"],"fcn":"recordSalmon","args":["1","Salmon"]}"#,
        )
        .unwrap();
        assert_eq!(
            request.validate().unwrap_err(),
            GatewayError::missing("chaincodeName")
        );
    }

    #[test]
    fn test_instantiate_allows_missing_fcn() {
        let request: InstantiateChaincodeRequest = serde_json::from_str(
            r#"{"channelName":"mychannel","chaincodeName":"salmon","chaincodeVersion":"v0","chaincodeType":"golang","args":[]}"#,
        )
        .unwrap();
        assert!(request.validate().is_ok());
        assert!(request.fcn.is_none());
    }

    #[test]
    fn test_blank_channel_is_missing() {
        let request = JoinChannelRequest {
            channel_name: "  ".to_string(),
            peers: vec![NodeId::new("peer0")],
        };
        assert_eq!(
            request.validate().unwrap_err(),
            GatewayError::missing("channelName")
        );
    }
}
