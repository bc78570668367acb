//! Transaction signing abstraction.
//!
//! This crate provides a `TransactionSigner` trait that abstracts how
//! transaction envelopes get signed. Production deployments bridge to an
//! external wallet (a browser extension holding the user's keys); the
//! `local-signer` feature provides an in-process ed25519 signer for CLI
//! use and test code.

use async_trait::async_trait;

#[cfg(feature = "local-signer")]
pub mod local;

#[cfg(feature = "local-signer")]
pub use local::LocalSigner;

/// Errors that can occur while obtaining a signature.
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    /// The user explicitly declined to sign.
    #[error("user declined to sign the transaction")]
    Rejected,
    /// The signing wallet could not be reached at all.
    #[error("signing wallet unavailable: {0}")]
    WalletUnavailable(String),
    #[error("transaction envelope is not valid XDR: {0}")]
    MalformedEnvelope(#[from] stellar_xdr::curr::Error),
    #[error("signing failed: {0}")]
    Signing(String),
}

/// Abstraction over the external signer boundary.
///
/// Implementations receive the base64 XDR of an unsigned (but fully
/// assembled) transaction envelope together with the network passphrase
/// the signature must be bound to, and return the signed envelope's
/// base64 XDR.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    async fn sign_transaction(
        &self,
        envelope_xdr: &str,
        network_passphrase: &str,
    ) -> Result<String, SignerError>;
}
