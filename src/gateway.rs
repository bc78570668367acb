//! Seam between the contract-interaction core and the network.
//!
//! The submission state machine and the read executor talk to the ledger
//! exclusively through [`LedgerGateway`], so tests can script network
//! behavior and production code can swap transports without touching the
//! protocol logic.

use async_trait::async_trait;

use crate::rpc::{
    GetTransactionResponse, RpcError, SendTransactionResponse, SimulateTransactionResponse,
};

/// Read-only view of an account at BUILDING time. Balance is in stroops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub account_id: String,
    pub balance: i64,
    pub sequence: i64,
}

#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Fetches the current account entry (balance and sequence number).
    async fn fetch_account(&self, account_id: &str) -> Result<AccountSnapshot, RpcError>;

    /// Dry-runs an unsigned transaction envelope against current ledger
    /// state.
    async fn simulate(&self, envelope_xdr: &str)
        -> Result<SimulateTransactionResponse, RpcError>;

    /// Submits a signed transaction envelope.
    async fn submit(&self, envelope_xdr: &str) -> Result<SendTransactionResponse, RpcError>;

    /// Queries the status of a submitted transaction by hash.
    async fn transaction_status(&self, hash: &str) -> Result<GetTransactionResponse, RpcError>;

    /// Out-of-band existence check for a transaction, used only by the
    /// ambiguous-outcome recovery path.
    async fn transaction_record_exists(&self, hash: &str) -> Result<bool, RpcError>;
}
