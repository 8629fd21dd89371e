//! Ledger Gateway Client - the node client boundary
//!
//! The coordinator never talks to the network directly. It consumes the
//! [`NodeClient`] capability set for one organization, obtained from a
//! [`NodeClientProvider`], and watches commit notifications through
//! [`CommitStream`] handles.
//!
//! [`MockNodeClient`] is a scripted implementation with a call journal, used
//! to check ordering and listener-cleanup behavior without a network.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod mock;
pub mod node;
pub mod provider;

pub use mock::{CommitScript, MockCall, MockCallKind, MockNodeClient, ProposalScript};
pub use node::{CommitStream, NodeClient};
pub use provider::{NodeClientProvider, StaticClientProvider};
