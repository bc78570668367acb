//! JSON-RPC transport for Soroban RPC, plus the raw Horizon lookup used
//! by the ambiguous-outcome recovery path.
//!
//! `get_transaction` wraps its decode failures in a dedicated error
//! variant: confirmation payloads for void-returning contract calls are a
//! known source of benign parse failures, and the submission state machine
//! needs to recognize exactly that class.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, OnceLock};
use stellar_xdr::curr::{
    AccountId, LedgerEntryData, LedgerKey, LedgerKeyAccount, Limits, PublicKey, ReadXdr, Uint256,
    WriteXdr,
};
use tracing::debug;
use url::Url;

use crate::codec;
use crate::config::Ctx;
use crate::gateway::{AccountSnapshot, LedgerGateway};

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("empty RPC result for {method}")]
    EmptyResult { method: &'static str },
    #[error("malformed response payload: {0}")]
    MalformedResponse(String),
    /// Decode failure on a transaction confirmation payload. Kept distinct
    /// from [`RpcError::MalformedResponse`] so the submission state machine
    /// can apply its bounded assumed-success recovery to this class only.
    #[error("malformed confirmation payload: {0}")]
    MalformedConfirmation(String),
    #[error("account not found: {account_id}")]
    AccountNotFound { account_id: String },
    #[error("could not encode ledger key: {0}")]
    Xdr(#[from] stellar_xdr::curr::Error),
    #[error(transparent)]
    Encoding(#[from] codec::EncodingError),
}

#[derive(Serialize)]
struct JsonRpcRequest<'a, P: Serialize> {
    jsonrpc: &'static str,
    id: u32,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

#[derive(Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateTransactionResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub transaction_data: Option<String>,
    #[serde(default)]
    pub min_resource_fee: Option<String>,
    #[serde(default)]
    pub results: Option<Vec<SimulateHostFunctionResult>>,
    #[serde(default)]
    pub latest_ledger: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateHostFunctionResult {
    #[serde(default)]
    pub xdr: Option<String>,
    #[serde(default)]
    pub auth: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionResponse {
    pub status: SendTransactionStatus,
    pub hash: String,
    #[serde(default)]
    pub error_result_xdr: Option<String>,
    #[serde(default)]
    pub latest_ledger: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SendTransactionStatus {
    Pending,
    Duplicate,
    TryAgainLater,
    Error,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTransactionResponse {
    pub status: TransactionStatus,
    #[serde(default)]
    pub result_xdr: Option<String>,
    #[serde(default)]
    pub return_value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    NotFound,
    Pending,
    Success,
    Failed,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetLedgerEntriesResponse {
    #[serde(default)]
    entries: Option<Vec<LedgerEntryResult>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerEntryResult {
    xdr: String,
}

/// HTTP client for one Soroban RPC endpoint and its companion Horizon
/// endpoint.
pub struct SorobanRpcClient {
    http: Client,
    rpc_url: Url,
    horizon_url: Url,
}

impl SorobanRpcClient {
    pub fn new(rpc_url: Url, horizon_url: Url) -> Self {
        Self {
            http: Client::new(),
            rpc_url,
            horizon_url,
        }
    }

    pub fn from_ctx(ctx: &Ctx) -> Self {
        Self::new(ctx.soroban_rpc_url.clone(), ctx.horizon_url.clone())
    }

    async fn rpc_call<P: Serialize>(
        &self,
        method: &'static str,
        params: P,
    ) -> Result<serde_json::Value, RpcError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };

        let response: JsonRpcResponse = self
            .http
            .post(self.rpc_url.clone())
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(RpcError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        response.result.ok_or(RpcError::EmptyResult { method })
    }

    fn decode_result<T: DeserializeOwned>(
        method: &'static str,
        result: serde_json::Value,
    ) -> Result<T, RpcError> {
        serde_json::from_value(result)
            .map_err(|e| RpcError::MalformedResponse(format!("{method}: {e}")))
    }
}

#[async_trait]
impl LedgerGateway for SorobanRpcClient {
    async fn fetch_account(&self, account_id: &str) -> Result<AccountSnapshot, RpcError> {
        let Uint256(key_bytes) = codec::parse_account(account_id)?;
        let ledger_key = LedgerKey::Account(LedgerKeyAccount {
            account_id: AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(key_bytes))),
        });
        let key_xdr = ledger_key.to_xdr_base64(Limits::none())?;

        let result = self
            .rpc_call("getLedgerEntries", json!({ "keys": [key_xdr] }))
            .await?;
        let response: GetLedgerEntriesResponse = Self::decode_result("getLedgerEntries", result)?;

        let Some(entry) = response.entries.and_then(|mut e| e.pop()) else {
            return Err(RpcError::AccountNotFound {
                account_id: account_id.to_string(),
            });
        };

        let data = LedgerEntryData::from_xdr_base64(&entry.xdr, Limits::none())?;
        let LedgerEntryData::Account(account) = data else {
            return Err(RpcError::MalformedResponse(
                "ledger entry is not an account entry".to_string(),
            ));
        };

        Ok(AccountSnapshot {
            account_id: account_id.to_string(),
            balance: account.balance,
            sequence: account.seq_num.0,
        })
    }

    async fn simulate(
        &self,
        envelope_xdr: &str,
    ) -> Result<SimulateTransactionResponse, RpcError> {
        let result = self
            .rpc_call("simulateTransaction", json!({ "transaction": envelope_xdr }))
            .await?;
        Self::decode_result("simulateTransaction", result)
    }

    async fn submit(&self, envelope_xdr: &str) -> Result<SendTransactionResponse, RpcError> {
        let result = self
            .rpc_call("sendTransaction", json!({ "transaction": envelope_xdr }))
            .await?;
        Self::decode_result("sendTransaction", result)
    }

    async fn transaction_status(&self, hash: &str) -> Result<GetTransactionResponse, RpcError> {
        let result = self
            .rpc_call("getTransaction", json!({ "hash": hash }))
            .await?;
        serde_json::from_value(result)
            .map_err(|e| RpcError::MalformedConfirmation(e.to_string()))
    }

    async fn transaction_record_exists(&self, hash: &str) -> Result<bool, RpcError> {
        let url = self
            .horizon_url
            .join(&format!("transactions/{hash}"))
            .map_err(|e| RpcError::MalformedResponse(format!("bad lookup URL: {e}")))?;

        debug!(%url, "out-of-band transaction lookup");
        let response = self.http.get(url).send().await?;
        Ok(response.status().is_success())
    }
}

static SHARED_CLIENT: OnceLock<Arc<SorobanRpcClient>> = OnceLock::new();

/// Process-wide shared RPC client, constructed once from the first `Ctx`
/// it is asked for. Later calls ignore their argument.
pub fn shared_client(ctx: &Ctx) -> Arc<SorobanRpcClient> {
    SHARED_CLIENT
        .get_or_init(|| Arc::new(SorobanRpcClient::from_ctx(ctx)))
        .clone()
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use stellar_xdr::curr::{
        AccountEntry, AccountEntryExt, SequenceNumber, Thresholds,
    };

    use super::*;

    fn client(server: &MockServer) -> SorobanRpcClient {
        SorobanRpcClient::new(
            server.url("/").parse().unwrap(),
            server.url("/horizon/").parse().unwrap(),
        )
    }

    fn test_account_id() -> String {
        stellar_strkey::ed25519::PublicKey([4u8; 32]).to_string()
    }

    fn account_entry_xdr(balance: i64, sequence: i64) -> String {
        let entry = AccountEntry {
            account_id: AccountId(PublicKey::PublicKeyTypeEd25519(Uint256([4u8; 32]))),
            balance,
            seq_num: SequenceNumber(sequence),
            num_sub_entries: 0,
            inflation_dest: None,
            flags: 0,
            home_domain: Default::default(),
            thresholds: Thresholds([1, 0, 0, 0]),
            signers: Default::default(),
            ext: AccountEntryExt::V0,
        };
        LedgerEntryData::Account(entry)
            .to_xdr_base64(Limits::none())
            .unwrap()
    }

    #[tokio::test]
    async fn fetch_account_parses_balance_and_sequence() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).body_contains("getLedgerEntries");
            then.status(200).json_body(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {
                    "entries": [{ "xdr": account_entry_xdr(120_000_000, 41) }],
                    "latestLedger": 500
                }
            }));
        });

        let snapshot = client(&server)
            .fetch_account(&test_account_id())
            .await
            .unwrap();

        mock.assert();
        assert_eq!(snapshot.balance, 120_000_000);
        assert_eq!(snapshot.sequence, 41);
    }

    #[tokio::test]
    async fn fetch_account_maps_missing_entry_to_account_not_found() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).body_contains("getLedgerEntries");
            then.status(200).json_body(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": { "entries": [], "latestLedger": 500 }
            }));
        });

        let err = client(&server)
            .fetch_account(&test_account_id())
            .await
            .unwrap_err();

        assert!(matches!(err, RpcError::AccountNotFound { .. }));
    }

    #[tokio::test]
    async fn rpc_level_error_surfaces_code_and_message() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).body_contains("sendTransaction");
            then.status(200).json_body(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32602, "message": "invalid transaction" }
            }));
        });

        let err = client(&server).submit("AAAA").await.unwrap_err();

        let RpcError::Rpc { code, message } = err else {
            panic!("expected Rpc error, got {err:?}");
        };
        assert_eq!(code, -32602);
        assert_eq!(message, "invalid transaction");
    }

    #[tokio::test]
    async fn pending_confirmation_parses_as_a_regular_status() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).body_contains("getTransaction");
            then.status(200).json_body(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": { "status": "PENDING" }
            }));
        });

        let response = client(&server).transaction_status("cafe").await.unwrap();

        assert_eq!(response.status, TransactionStatus::Pending);
    }

    #[tokio::test]
    async fn unparseable_confirmation_is_flagged_as_malformed_confirmation() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).body_contains("getTransaction");
            then.status(200).json_body(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": { "status": 17 }
            }));
        });

        let err = client(&server).transaction_status("cafe").await.unwrap_err();

        assert!(matches!(err, RpcError::MalformedConfirmation(_)));
    }

    #[tokio::test]
    async fn send_transaction_statuses_deserialize() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).body_contains("sendTransaction");
            then.status(200).json_body(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": { "status": "PENDING", "hash": "ab".repeat(32), "latestLedger": 7 }
            }));
        });

        let response = client(&server).submit("AAAA").await.unwrap();

        assert_eq!(response.status, SendTransactionStatus::Pending);
        assert_eq!(response.hash, "ab".repeat(32));
    }

    #[tokio::test]
    async fn record_lookup_reports_existence_by_http_status() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/horizon/transactions/feed");
            then.status(200).json_body(serde_json::json!({ "id": "feed" }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/horizon/transactions/gone");
            then.status(404);
        });

        let client = client(&server);
        assert!(client.transaction_record_exists("feed").await.unwrap());
        assert!(!client.transaction_record_exists("gone").await.unwrap());
    }
}
