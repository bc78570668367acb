//! Read-only contract calls via simulation.
//!
//! Reads never mutate the ledger: a throwaway transaction is built against
//! a placeholder account and simulated, and the return value extracted
//! from the simulation. Contract-level aborts signal "no such entity" for
//! the registry's lookup functions and decode to `None` rather than an
//! error; anything else is a hard failure.

use serde_json::Value;
use stellar_xdr::curr::{Limits, ReadXdr, ScVal};
use tracing::debug;

use crate::codec;
use crate::config::Ctx;
use crate::envelope::{build_invoke_envelope, BuildError, ContractCall};
use crate::gateway::LedgerGateway;
use crate::rpc::RpcError;

/// Well-known all-zero account used as the simulation source. Never
/// funded, never signs anything.
pub(crate) const PLACEHOLDER_ACCOUNT: &str =
    "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF";

const READ_FEE: u32 = 100;
const READ_TIMEOUT_SECS: u64 = 30;

/// Failure texts that mean the contract's own logic trapped, which for
/// every lookup-by-key function in the registry means "entity not found".
const ABORT_SIGNATURES: [&str; 3] = ["UnreachableCodeReached", "InvalidAction", "WasmVm"];

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("simulation failed: {0}")]
    Simulation(String),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error("could not decode simulation return value: {0}")]
    Decode(stellar_xdr::curr::Error),
}

/// Executes a contract function with no mutation and returns its decoded
/// result, or `None` when the contract aborted (entity not found).
///
/// No retries; callers needing resilience wrap this themselves.
pub async fn read_call<G>(
    gateway: &G,
    ctx: &Ctx,
    call: &ContractCall,
) -> Result<Option<Value>, ReadError>
where
    G: LedgerGateway + ?Sized,
{
    let envelope = build_invoke_envelope(
        &ctx.contract_id,
        PLACEHOLDER_ACCOUNT,
        0,
        READ_FEE,
        READ_TIMEOUT_SECS,
        call,
    )?;

    let simulation = gateway.simulate(&envelope).await?;

    if let Some(error) = simulation.error {
        if ABORT_SIGNATURES.iter().any(|sig| error.contains(sig)) {
            debug!(function = %call.function, "contract aborted during read, treating as not found");
            return Ok(None);
        }
        return Err(ReadError::Simulation(error));
    }

    let Some(retval_xdr) = simulation
        .results
        .and_then(|results| results.into_iter().next())
        .and_then(|result| result.xdr)
    else {
        return Ok(None);
    };

    let value = ScVal::from_xdr_base64(&retval_xdr, Limits::none()).map_err(ReadError::Decode)?;
    Ok(Some(codec::to_native(&value)))
}
