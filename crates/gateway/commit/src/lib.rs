//! # Ledger Gateway Commit - propose, endorse, order, commit
//!
//! Drives ledger-changing operations through the commit protocol of a
//! permissioned network: fan a proposal out to the target nodes, require
//! every one of them to endorse it, hand the endorsed artifact to the
//! ordering authority, and wait concurrently on independent commit
//! notifications before declaring success.
//!
//! ## Key Components
//!
//! - [`quorum`]: unanimous acceptance over a padded response set
//! - [`CommitListenerPool`]: per-node commit listeners with timers and
//!   guaranteed release of their connections
//! - [`CommitCoordinator`]: the per-operation state machine and the
//!   "first failure wins" reconciliation
//! - [`drivers`]: create channel, join channel, install, instantiate, invoke
//! - [`Gateway`]: facade used by the boundary layer, including read-only
//!   query forwarding
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gateway_client::{MockNodeClient, StaticClientProvider};
//! use gateway_commit::{CommitConfig, Gateway, RequestContext};
//! use gateway_types::{InstallChaincodeRequest, ChaincodeType, NodeId};
//!
//! # async fn example() {
//! let client = MockNodeClient::new("fredrick").with_peers(["peer0", "peer1"]);
//! let provider = StaticClientProvider::new().with_org(Arc::new(client), ["alice"]);
//! let gateway = Gateway::new(Arc::new(provider), CommitConfig::default());
//!
//! let request = InstallChaincodeRequest {
//!     peers: vec![NodeId::new("peer0"), NodeId::new("peer1")],
//!     chaincode_name: "salmon".to_string(),
//!     chaincode_path: "github.com/salmon".to_string(),
//!     chaincode_version: "v0".to_string(),
//!     chaincode_type: Some(ChaincodeType::Golang),
//! };
//! let ctx = RequestContext::new("fredrick").with_user("alice");
//! let outcome = gateway.install_chaincode(&ctx, &request).await.unwrap();
//! assert!(outcome.success);
//! # }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod config;
pub mod coordinator;
pub mod drivers;
pub mod gateway;
pub mod listener;
pub mod quorum;

pub use config::CommitConfig;
pub use coordinator::{reconcile, CommitCoordinator, CommitPhase, CommitReport, Endorsement};
pub use gateway::{Gateway, RequestContext};
pub use listener::{
    CommitListener, CommitListenerPool, JoinedOutcome, ListenerOutcome, ListenerReport,
    ListenerState,
};
