//! Scripted test doubles for the network seam and the signer.
//!
//! `MockGateway` replays queued responses in order, so tests can drive the
//! submission state machine through any sequence of ledger behaviors
//! without a server. Queued items that are never consumed are fine; a
//! consumed-but-empty queue panics, since it means the test script and the
//! code under test disagree about how many calls happen.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use registry_signer::{SignerError, TransactionSigner};
use stellar_xdr::curr::{Limits, ScVal, WriteXdr};

use crate::config::{Ctx, LogLevel};
use crate::gateway::{AccountSnapshot, LedgerGateway};
use crate::rpc::{
    GetTransactionResponse, RpcError, SendTransactionResponse, SendTransactionStatus,
    SimulateTransactionResponse, TransactionStatus,
};

const MOCK_HASH: &str = "3389e9f0f1a65f19736cacf544c2e825313e8447f569233bb8db39aa607c8889";

pub(crate) fn test_ctx() -> Ctx {
    Ctx {
        contract_id: stellar_strkey::Contract([1u8; 32]).to_string(),
        soroban_rpc_url: "http://localhost:8000/".parse().unwrap(),
        horizon_url: "http://localhost:8001/".parse().unwrap(),
        network_passphrase: "Test SDF Network ; September 2015".to_string(),
        log_level: LogLevel::Debug,
    }
}

pub(crate) fn simulation_success(return_value: ScVal) -> SimulateTransactionResponse {
    use crate::rpc::SimulateHostFunctionResult;
    use stellar_xdr::curr::{
        ExtensionPoint, LedgerFootprint, SorobanResources, SorobanTransactionData,
    };

    let transaction_data = SorobanTransactionData {
        ext: ExtensionPoint::V0,
        resources: SorobanResources {
            footprint: LedgerFootprint {
                read_only: Default::default(),
                read_write: Default::default(),
            },
            instructions: 1_000,
            read_bytes: 64,
            write_bytes: 64,
        },
        resource_fee: 0,
    }
    .to_xdr_base64(Limits::none())
    .unwrap();

    SimulateTransactionResponse {
        error: None,
        transaction_data: Some(transaction_data),
        min_resource_fee: Some("5000".to_string()),
        results: Some(vec![SimulateHostFunctionResult {
            xdr: Some(return_value.to_xdr_base64(Limits::none()).unwrap()),
            auth: Vec::new(),
        }]),
        latest_ledger: 500,
    }
}

pub(crate) fn simulation_failure(error: &str) -> SimulateTransactionResponse {
    SimulateTransactionResponse {
        error: Some(error.to_string()),
        transaction_data: None,
        min_resource_fee: None,
        results: None,
        latest_ledger: 500,
    }
}

pub(crate) fn not_found_status() -> GetTransactionResponse {
    GetTransactionResponse {
        status: TransactionStatus::NotFound,
        result_xdr: None,
        return_value: None,
    }
}

pub(crate) fn pending_status() -> GetTransactionResponse {
    GetTransactionResponse {
        status: TransactionStatus::Pending,
        result_xdr: None,
        return_value: None,
    }
}

pub(crate) fn success_status() -> GetTransactionResponse {
    GetTransactionResponse {
        status: TransactionStatus::Success,
        result_xdr: None,
        return_value: None,
    }
}

pub(crate) fn status_error(message: &str) -> RpcError {
    RpcError::Rpc {
        code: -32603,
        message: message.to_string(),
    }
}

pub(crate) struct MockGateway {
    balance: Mutex<i64>,
    sequence: i64,
    simulations: Mutex<VecDeque<Result<SimulateTransactionResponse, RpcError>>>,
    send_response: Mutex<SendTransactionResponse>,
    statuses: Mutex<VecDeque<Result<GetTransactionResponse, RpcError>>>,
    record_exists: Mutex<bool>,
    fetch_count: AtomicU32,
    simulate_count: AtomicU32,
    submit_count: AtomicU32,
    status_count: AtomicU32,
    record_count: AtomicU32,
}

impl MockGateway {
    pub(crate) fn new() -> Self {
        Self {
            balance: Mutex::new(1_000_000_000),
            sequence: 7,
            simulations: Mutex::new(VecDeque::new()),
            send_response: Mutex::new(SendTransactionResponse {
                status: SendTransactionStatus::Pending,
                hash: MOCK_HASH.to_string(),
                error_result_xdr: None,
                latest_ledger: 500,
            }),
            statuses: Mutex::new(VecDeque::new()),
            record_exists: Mutex::new(false),
            fetch_count: AtomicU32::new(0),
            simulate_count: AtomicU32::new(0),
            submit_count: AtomicU32::new(0),
            status_count: AtomicU32::new(0),
            record_count: AtomicU32::new(0),
        }
    }

    pub(crate) fn account_id(&self) -> String {
        stellar_strkey::ed25519::PublicKey([4u8; 32]).to_string()
    }

    pub(crate) fn set_balance(&self, balance: i64) {
        *self.balance.lock().unwrap() = balance;
    }

    pub(crate) fn push_simulation(
        &self,
        response: Result<SimulateTransactionResponse, RpcError>,
    ) {
        self.simulations.lock().unwrap().push_back(response);
    }

    pub(crate) fn set_send_response(&self, response: SendTransactionResponse) {
        *self.send_response.lock().unwrap() = response;
    }

    pub(crate) fn push_status(&self, response: Result<GetTransactionResponse, RpcError>) {
        self.statuses.lock().unwrap().push_back(response);
    }

    pub(crate) fn set_record_exists(&self, exists: bool) {
        *self.record_exists.lock().unwrap() = exists;
    }

    pub(crate) fn fetch_calls(&self) -> u32 {
        self.fetch_count.load(Ordering::SeqCst)
    }

    pub(crate) fn simulate_calls(&self) -> u32 {
        self.simulate_count.load(Ordering::SeqCst)
    }

    pub(crate) fn submit_calls(&self) -> u32 {
        self.submit_count.load(Ordering::SeqCst)
    }

    pub(crate) fn status_calls(&self) -> u32 {
        self.status_count.load(Ordering::SeqCst)
    }

    pub(crate) fn record_lookup_calls(&self) -> u32 {
        self.record_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerGateway for MockGateway {
    async fn fetch_account(&self, account_id: &str) -> Result<AccountSnapshot, RpcError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        Ok(AccountSnapshot {
            account_id: account_id.to_string(),
            balance: *self.balance.lock().unwrap(),
            sequence: self.sequence,
        })
    }

    async fn simulate(
        &self,
        _envelope_xdr: &str,
    ) -> Result<SimulateTransactionResponse, RpcError> {
        self.simulate_count.fetch_add(1, Ordering::SeqCst);
        self.simulations
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted simulation response left")
    }

    async fn submit(&self, _envelope_xdr: &str) -> Result<SendTransactionResponse, RpcError> {
        self.submit_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.send_response.lock().unwrap().clone())
    }

    async fn transaction_status(&self, _hash: &str) -> Result<GetTransactionResponse, RpcError> {
        self.status_count.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted status response left")
    }

    async fn transaction_record_exists(&self, _hash: &str) -> Result<bool, RpcError> {
        self.record_count.fetch_add(1, Ordering::SeqCst);
        Ok(*self.record_exists.lock().unwrap())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SignerBehavior {
    /// Returns the envelope unchanged, as if signed.
    Sign,
    Reject,
    Fail,
}

pub(crate) struct MockSigner {
    behavior: SignerBehavior,
    call_count: AtomicU32,
}

impl MockSigner {
    pub(crate) fn new(behavior: SignerBehavior) -> Self {
        Self {
            behavior,
            call_count: AtomicU32::new(0),
        }
    }

    pub(crate) fn calls(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionSigner for MockSigner {
    async fn sign_transaction(
        &self,
        envelope_xdr: &str,
        _network_passphrase: &str,
    ) -> Result<String, SignerError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            SignerBehavior::Sign => Ok(envelope_xdr.to_string()),
            SignerBehavior::Reject => Err(SignerError::Rejected),
            SignerBehavior::Fail => Err(SignerError::WalletUnavailable(
                "wallet extension not reachable".to_string(),
            )),
        }
    }
}
