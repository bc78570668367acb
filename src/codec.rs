//! Conversion between native values and the Soroban wire value model.
//!
//! Encoders produce `ScVal`s for contract-call arguments; the decoder maps
//! any `ScVal` a contract can return into a JSON-like native value. Prices
//! are always carried in stroops (the ledger's smallest unit); converting
//! to and from display units is the caller's job.

use serde_json::{Map, Value};
use stellar_xdr::curr::{
    AccountId, Hash, Int128Parts, PublicKey, ScAddress, ScString, ScVal, Uint256,
};

/// Stroops per XLM, the ledger's fixed-point scale.
pub const STROOPS_PER_XLM: i64 = 10_000_000;

#[derive(Debug, Clone, thiserror::Error)]
pub enum EncodingError {
    #[error("malformed Stellar address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("string value exceeds XDR length limits")]
    StringTooLong,
}

pub fn string(value: &str) -> Result<ScVal, EncodingError> {
    let inner = value
        .to_string()
        .try_into()
        .map_err(|_| EncodingError::StringTooLong)?;
    Ok(ScVal::String(ScString(inner)))
}

pub fn u32(value: u32) -> ScVal {
    ScVal::U32(value)
}

pub fn i128(value: i128) -> ScVal {
    ScVal::I128(Int128Parts {
        hi: (value >> 64) as i64,
        lo: value as u64,
    })
}

pub fn boolean(value: bool) -> ScVal {
    ScVal::Bool(value)
}

/// Encodes an account (`G...`) or contract (`C...`) address, validating
/// the strkey form before encoding.
pub fn address(value: &str) -> Result<ScVal, EncodingError> {
    Ok(ScVal::Address(parse_address(value)?))
}

/// Absent values encode to the distinguished void value; present values
/// carry whatever the inner encoder produced.
pub fn option(value: Option<ScVal>) -> ScVal {
    value.unwrap_or(ScVal::Void)
}

pub(crate) fn parse_address(value: &str) -> Result<ScAddress, EncodingError> {
    match stellar_strkey::Strkey::from_string(value) {
        Ok(stellar_strkey::Strkey::PublicKeyEd25519(pk)) => Ok(ScAddress::Account(AccountId(
            PublicKey::PublicKeyTypeEd25519(Uint256(pk.0)),
        ))),
        Ok(stellar_strkey::Strkey::Contract(contract)) => {
            Ok(ScAddress::Contract(Hash(contract.0)))
        }
        Ok(_) => Err(EncodingError::InvalidAddress {
            address: value.to_string(),
            reason: "unsupported strkey form".to_string(),
        }),
        Err(e) => Err(EncodingError::InvalidAddress {
            address: value.to_string(),
            reason: format!("{e:?}"),
        }),
    }
}

/// Parses an account address into its raw ed25519 key. Contract addresses
/// cannot act as transaction sources and are rejected here.
pub(crate) fn parse_account(value: &str) -> Result<Uint256, EncodingError> {
    match stellar_strkey::Strkey::from_string(value) {
        Ok(stellar_strkey::Strkey::PublicKeyEd25519(pk)) => Ok(Uint256(pk.0)),
        Ok(_) => Err(EncodingError::InvalidAddress {
            address: value.to_string(),
            reason: "expected an account (G...) address".to_string(),
        }),
        Err(e) => Err(EncodingError::InvalidAddress {
            address: value.to_string(),
            reason: format!("{e:?}"),
        }),
    }
}

/// Maps a wire value to a JSON-like native value.
///
/// Total: value shapes the registry contract never produces still decode
/// to something printable rather than failing.
pub fn to_native(value: &ScVal) -> Value {
    match value {
        ScVal::Bool(b) => Value::Bool(*b),
        ScVal::Void => Value::Null,
        ScVal::U32(v) => Value::from(*v),
        ScVal::I32(v) => Value::from(*v),
        ScVal::U64(v) => Value::from(*v),
        ScVal::I64(v) => Value::from(*v),
        ScVal::Timepoint(t) => Value::from(t.0),
        ScVal::Duration(d) => Value::from(d.0),
        ScVal::U128(parts) => {
            let combined = u128::from(parts.hi) << 64 | u128::from(parts.lo);
            match u64::try_from(combined) {
                Ok(small) => Value::from(small),
                Err(_) => Value::String(combined.to_string()),
            }
        }
        ScVal::I128(parts) => {
            let combined = i128::from(parts.hi) << 64 | i128::from(parts.lo);
            match i64::try_from(combined) {
                Ok(small) => Value::from(small),
                Err(_) => Value::String(combined.to_string()),
            }
        }
        ScVal::Bytes(bytes) => Value::String(
            bytes
                .0
                .iter()
                .map(|b| format!("{b:02x}"))
                .collect::<String>(),
        ),
        ScVal::String(s) => Value::String(s.0.to_utf8_string_lossy()),
        ScVal::Symbol(s) => Value::String(s.0.to_utf8_string_lossy()),
        ScVal::Vec(Some(items)) => Value::Array(items.0.iter().map(to_native).collect()),
        ScVal::Vec(None) => Value::Array(Vec::new()),
        ScVal::Map(Some(entries)) => {
            let mut object = Map::new();
            for entry in entries.0.iter() {
                let key = match to_native(&entry.key) {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                object.insert(key, to_native(&entry.val));
            }
            Value::Object(object)
        }
        ScVal::Map(None) => Value::Object(Map::new()),
        ScVal::Address(addr) => Value::String(address_to_string(addr)),
        other => Value::String(format!("{other:?}")),
    }
}

pub(crate) fn address_to_string(address: &ScAddress) -> String {
    match address {
        ScAddress::Account(AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(bytes)))) => {
            stellar_strkey::ed25519::PublicKey(*bytes).to_string()
        }
        ScAddress::Contract(Hash(bytes)) => stellar_strkey::Contract(*bytes).to_string(),
    }
}
