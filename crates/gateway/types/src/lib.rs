//! Ledger Gateway Types - core types for commit coordination
//!
//! The gateway drives ledger-changing operations (channel creation and
//! join, chaincode install and instantiate, transaction invoke) through the
//! propose → endorse → order → commit protocol of a permissioned network.
//!
//! ## Key Concepts
//!
//! - **Proposal**: a tentative operation sent to nodes for endorsement
//! - **NodeResponse**: one node's answer; transport failures are folded in
//! - **QuorumVerdict**: unanimous-acceptance decision over a response set
//! - **OrderRequest / OrderSubmissionResult**: the ordering phase
//! - **CommitEvent / CommitFilter**: commit notifications and what to watch
//! - **OperationOutcome**: the result surfaced to the boundary layer

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod commit;
pub mod error;
pub mod ids;
pub mod outcome;
pub mod proposal;
pub mod query;
pub mod request;

pub use commit::{
    CommitEvent, CommitFilter, OrderRequest, OrderStatus, OrderSubmissionResult, ValidationCode,
};
pub use error::{GatewayError, Result};
pub use ids::{ChannelId, NodeId, OrgName, TxId};
pub use outcome::OperationOutcome;
pub use proposal::{
    ChaincodeSpec, ChaincodeType, NodeResponse, OperationKind, Proposal, ProposalPayload,
    QuorumVerdict, STATUS_OK, STATUS_UNAVAILABLE,
};
pub use query::{BlockInfo, ChainInfo, ChaincodeInfo, ChaincodeScope, TransactionInfo};
pub use request::{
    CreateChannelRequest, InstallChaincodeRequest, InstantiateChaincodeRequest, InvokeRequest,
    JoinChannelRequest,
};
