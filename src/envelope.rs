//! Transaction envelope construction for contract invocations.
//!
//! Envelopes carry exactly one `InvokeHostFunctionOp`. Assembly binds the
//! resource footprint computed by simulation onto the transaction before
//! it is handed to the signer.

use std::time::{SystemTime, UNIX_EPOCH};

use stellar_xdr::curr::{
    HostFunction, InvokeContractArgs, InvokeHostFunctionOp, Limits, Memo, MuxedAccount, Operation,
    OperationBody, Preconditions, ReadXdr, ScSymbol, ScVal, SequenceNumber,
    SorobanTransactionData, TimeBounds, TimePoint, Transaction, TransactionEnvelope,
    TransactionExt, TransactionResult, TransactionV1Envelope, WriteXdr,
};

use crate::codec::{self, EncodingError};
use crate::rpc::SimulateTransactionResponse;

/// One contract invocation: a function name plus its encoded arguments.
#[derive(Debug, Clone)]
pub struct ContractCall {
    pub function: String,
    pub args: Vec<ScVal>,
}

impl ContractCall {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, value: ScVal) -> Self {
        self.args.push(value);
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("XDR encoding failed: {0}")]
    Xdr(#[from] stellar_xdr::curr::Error),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error("'{0}' is not a valid contract function name")]
    BadFunctionName(String),
    #[error("simulation response carries no transaction data to assemble")]
    MissingTransactionData,
    #[error("simulation returned an invalid resource fee '{0}'")]
    BadResourceFee(String),
    #[error("unsupported transaction envelope type")]
    UnsupportedEnvelope,
}

/// Builds the base64 XDR of an unsigned envelope invoking `call` on
/// `contract_id`, sourced from `source_account` at `sequence + 1`.
pub(crate) fn build_invoke_envelope(
    contract_id: &str,
    source_account: &str,
    sequence: i64,
    fee: u32,
    timeout_secs: u64,
    call: &ContractCall,
) -> Result<String, BuildError> {
    let contract_address = codec::parse_address(contract_id)?;
    let source = codec::parse_account(source_account)?;

    let function_name = ScSymbol(
        call.function
            .clone()
            .try_into()
            .map_err(|_| BuildError::BadFunctionName(call.function.clone()))?,
    );
    let args = call.args.clone().try_into()?;

    let operation = Operation {
        source_account: None,
        body: OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
            host_function: HostFunction::InvokeContract(InvokeContractArgs {
                contract_address,
                function_name,
                args,
            }),
            auth: Default::default(),
        }),
    };

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();

    let tx = Transaction {
        source_account: MuxedAccount::Ed25519(source),
        fee,
        seq_num: SequenceNumber(sequence + 1),
        cond: Preconditions::Time(TimeBounds {
            min_time: TimePoint(0),
            max_time: TimePoint(now + timeout_secs),
        }),
        memo: Memo::None,
        operations: vec![operation].try_into()?,
        ext: TransactionExt::V0,
    };

    let envelope = TransactionEnvelope::Tx(TransactionV1Envelope {
        tx,
        signatures: Default::default(),
    });
    Ok(envelope.to_xdr_base64(Limits::none())?)
}

/// Patches a simulated envelope with the computed resource footprint and
/// raises the fee by the simulation's minimum resource fee. The result is
/// what gets signed; the footprint is binding from here on.
pub(crate) fn assemble_envelope(
    envelope_xdr: &str,
    simulation: &SimulateTransactionResponse,
) -> Result<String, BuildError> {
    let envelope = TransactionEnvelope::from_xdr_base64(envelope_xdr, Limits::none())?;
    let TransactionEnvelope::Tx(mut v1) = envelope else {
        return Err(BuildError::UnsupportedEnvelope);
    };

    let data_xdr = simulation
        .transaction_data
        .as_deref()
        .ok_or(BuildError::MissingTransactionData)?;
    let soroban_data = SorobanTransactionData::from_xdr_base64(data_xdr, Limits::none())?;

    // The RPC carries the fee as an int64 decimal string; the envelope
    // fee field is only 32 bits, so an oversized fee clamps rather than
    // erroring out.
    let resource_fee: u64 = match simulation.min_resource_fee.as_deref() {
        None => 0,
        Some(raw) => raw
            .parse()
            .map_err(|_| BuildError::BadResourceFee(raw.to_string()))?,
    };

    v1.tx.fee = v1
        .tx
        .fee
        .saturating_add(u32::try_from(resource_fee).unwrap_or(u32::MAX));
    v1.tx.ext = TransactionExt::V1(soroban_data);

    Ok(TransactionEnvelope::Tx(v1).to_xdr_base64(Limits::none())?)
}

/// Best-effort extraction of the result code name from a base64
/// `TransactionResult`. Returns `None` on any parse failure; callers must
/// treat this as enrichment only.
pub(crate) fn transaction_result_code(result_xdr: &str) -> Option<String> {
    TransactionResult::from_xdr_base64(result_xdr, Limits::none())
        .ok()
        .map(|result| result.result.name().to_string())
}
