//! Client-side core for a Soroban land-registry contract.
//!
//! The crate is organized around the transaction lifecycle: [`codec`]
//! translates native values to and from the contract's wire form,
//! [`read`] runs queries by simulation, [`submission`] drives the
//! build/simulate/sign/submit/poll write path, [`error`] folds every
//! failure into one closed taxonomy, and [`registry`] exposes one method
//! per contract function on top of it all.

#[cfg(feature = "local-signer")]
pub mod cli;
pub mod codec;
pub mod config;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod read;
pub mod registry;
pub mod rpc;
pub mod submission;
pub mod telemetry;

#[cfg(test)]
mod test_utils;

pub use envelope::ContractCall;
pub use error::{classify, ClassifiedError, ErrorKind};
pub use gateway::{AccountSnapshot, LedgerGateway};
pub use read::read_call;
pub use registry::{BuyerProfile, LandListing, LandRegistry, SellerProfile};
pub use submission::{submit_contract_call, SubmissionResult, SubmitError};
