//! Operation drivers.
//!
//! Each driver validates its request, picks the target and listening sets,
//! and parameterizes the coordinator. `Err` is returned only for input that
//! fails validation; every other failure becomes an unsuccessful
//! [`OperationOutcome`](gateway_types::OperationOutcome).

mod chaincode;
mod channel;

pub use chaincode::{install_chaincode, instantiate_chaincode, invoke_chaincode};
pub use channel::{create_channel, join_channel};
