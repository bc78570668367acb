//! Failure classification for contract interactions.
//!
//! Raw failure text arrives from three layers with three different
//! vocabularies: contract panics surfaced through simulation, ledger and
//! RPC rejections, and local signing problems. [`classify`] folds them all
//! into one closed [`ErrorKind`] taxonomy by substring matching, contract
//! vocabulary first since its messages are the most specific. Matching is
//! case-insensitive and total: anything unrecognized lands in
//! [`ErrorKind::UnknownError`] with its original text preserved.

use registry_signer::SignerError;
use crate::codec::EncodingError;
use crate::envelope::BuildError;
use crate::read::ReadError;
use crate::rpc::RpcError;
use crate::submission::SubmitError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UserRejected,
    WalletNotInstalled,
    AccountNotFound,
    AccountUnfunded,
    InsufficientBalance,
    TransactionTimeout,
    BadAuthorization,
    ContractNotFound,
    NetworkError,
    AlreadyInitialized,
    AlreadyRegistered,
    NotRegistered,
    NotVerified,
    NotAuthorizedRole,
    InvalidFractionCount,
    FractionsSoldOut,
    DuplicateFractionOwnership,
    FractionalityMismatch,
    RequestNotApproved,
    PaymentAlreadyReceived,
    EntityNotFound,
    EncodingError,
    UnknownError,
}

/// Contract panic vocabulary, matched first. Ordered so that the more
/// specific phrasings win: "already registered" must not be shadowed by a
/// later "registered" match, and the role-restriction phrasings come
/// before the broader entity lookups.
const CONTRACT_SIGNATURES: &[(&str, ErrorKind)] = &[
    ("already initialized", ErrorKind::AlreadyInitialized),
    ("already registered", ErrorKind::AlreadyRegistered),
    ("not registered", ErrorKind::NotRegistered),
    ("not verified", ErrorKind::NotVerified),
    ("inspector", ErrorKind::NotAuthorizedRole),
    ("only the seller", ErrorKind::NotAuthorizedRole),
    ("only the buyer", ErrorKind::NotAuthorizedRole),
    ("invalid number of fractions", ErrorKind::InvalidFractionCount),
    ("all fractions have been sold", ErrorKind::FractionsSoldOut),
    ("already owns a fraction", ErrorKind::DuplicateFractionOwnership),
    (
        "cannot transfer ownership of fractional land",
        ErrorKind::FractionalityMismatch,
    ),
    ("this is not fractional land", ErrorKind::FractionalityMismatch),
    ("this is fractional land", ErrorKind::FractionalityMismatch),
    ("request not approved", ErrorKind::RequestNotApproved),
    ("payment already received", ErrorKind::PaymentAlreadyReceived),
    ("land not found", ErrorKind::EntityNotFound),
    ("seller not found", ErrorKind::EntityNotFound),
    ("buyer not found", ErrorKind::EntityNotFound),
    ("request not found", ErrorKind::EntityNotFound),
];

/// Ledger, RPC and wallet vocabulary, matched after the contract table.
const LEDGER_SIGNATURES: &[(&str, ErrorKind)] = &[
    ("user declined", ErrorKind::UserRejected),
    ("rejected", ErrorKind::UserRejected),
    ("freighter", ErrorKind::WalletNotInstalled),
    ("account not found", ErrorKind::AccountNotFound),
    ("account requires a minimum balance", ErrorKind::AccountUnfunded),
    ("insufficient balance", ErrorKind::InsufficientBalance),
    ("underfunded", ErrorKind::InsufficientBalance),
    ("timed out", ErrorKind::TransactionTimeout),
    ("timeout", ErrorKind::TransactionTimeout),
    ("bad_auth", ErrorKind::BadAuthorization),
    ("bad auth", ErrorKind::BadAuthorization),
    ("badauth", ErrorKind::BadAuthorization),
    ("contract not found", ErrorKind::ContractNotFound),
    ("network", ErrorKind::NetworkError),
    ("connection", ErrorKind::NetworkError),
    ("rate limit", ErrorKind::NetworkError),
    ("malformed", ErrorKind::EncodingError),
];

/// Maps raw failure text onto the closed taxonomy. Total; never fails.
pub fn classify(raw: &str) -> ErrorKind {
    let lowered = raw.to_lowercase();

    for (needle, kind) in CONTRACT_SIGNATURES {
        if lowered.contains(needle) {
            return *kind;
        }
    }
    for (needle, kind) in LEDGER_SIGNATURES {
        if lowered.contains(needle) {
            return *kind;
        }
    }
    ErrorKind::UnknownError
}

impl ErrorKind {
    /// Stable user-facing message for this kind, or `None` when the raw
    /// text itself is the most useful thing to show.
    pub fn user_message(self) -> Option<&'static str> {
        match self {
            Self::UserRejected => Some("Transaction was declined in the wallet."),
            Self::WalletNotInstalled => {
                Some("No Stellar wallet is available. Install one and try again.")
            }
            Self::AccountNotFound => {
                Some("Account does not exist on this network. Fund it first.")
            }
            Self::AccountUnfunded => {
                Some("Account has not met the minimum balance requirement.")
            }
            Self::InsufficientBalance => {
                Some("Not enough XLM to cover this transaction's fees.")
            }
            Self::TransactionTimeout => {
                Some("Transaction was not confirmed in time. Check its status before retrying.")
            }
            Self::BadAuthorization => Some("Transaction signature was not accepted."),
            Self::ContractNotFound => {
                Some("The land registry contract was not found on this network.")
            }
            Self::NetworkError => Some("Network problem while contacting the ledger. Try again."),
            Self::AlreadyInitialized => Some("The registry has already been initialized."),
            Self::AlreadyRegistered => Some("This address is already registered."),
            Self::NotRegistered => Some("This address is not registered yet."),
            Self::NotVerified => Some("This account has not been verified by the land inspector."),
            Self::NotAuthorizedRole => {
                Some("This account is not allowed to perform that action.")
            }
            Self::InvalidFractionCount => {
                Some("Fraction count must be between 1 and 100.")
            }
            Self::FractionsSoldOut => Some("All fractions of this land have been sold."),
            Self::DuplicateFractionOwnership => {
                Some("This buyer already owns a fraction of this land.")
            }
            Self::FractionalityMismatch => {
                Some("That operation does not apply to this land's fraction mode.")
            }
            Self::RequestNotApproved => Some("The purchase request has not been approved."),
            Self::PaymentAlreadyReceived => {
                Some("Payment for this request was already received.")
            }
            Self::EntityNotFound => Some("No matching record exists in the registry."),
            Self::EncodingError | Self::UnknownError => None,
        }
    }

    /// Whether retrying the same operation unchanged can plausibly
    /// succeed.
    pub fn is_recoverable(self) -> bool {
        matches!(self, Self::TransactionTimeout | Self::NetworkError)
    }
}

/// A failure folded into the taxonomy, carrying a display-ready message.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
    pub recoverable: bool,
}

impl ClassifiedError {
    fn of_kind(kind: ErrorKind, raw: String) -> Self {
        let message = kind
            .user_message()
            .map(str::to_string)
            .unwrap_or(raw);
        Self {
            kind,
            message,
            recoverable: kind.is_recoverable(),
        }
    }

    pub fn from_message(raw: &str) -> Self {
        Self::of_kind(classify(raw), raw.to_string())
    }
}

impl From<SubmitError> for ClassifiedError {
    fn from(err: SubmitError) -> Self {
        // Structured variants carry their kind directly; only the
        // free-text ones go through the signature tables.
        let kind = match &err {
            SubmitError::InsufficientBalance { .. } => Some(ErrorKind::InsufficientBalance),
            SubmitError::Rejected => Some(ErrorKind::UserRejected),
            SubmitError::Timeout { .. } => Some(ErrorKind::TransactionTimeout),
            SubmitError::Signer(SignerError::WalletUnavailable(_)) => {
                Some(ErrorKind::WalletNotInstalled)
            }
            SubmitError::Rpc(RpcError::AccountNotFound { .. }) => Some(ErrorKind::AccountNotFound),
            SubmitError::Rpc(RpcError::Transport(_)) => Some(ErrorKind::NetworkError),
            SubmitError::Build(BuildError::Encoding(_)) => Some(ErrorKind::EncodingError),
            _ => None,
        };
        match kind {
            Some(kind) => Self::of_kind(kind, err.to_string()),
            None => Self::from_message(&err.to_string()),
        }
    }
}

impl From<ReadError> for ClassifiedError {
    fn from(err: ReadError) -> Self {
        let kind = match &err {
            ReadError::Rpc(RpcError::AccountNotFound { .. }) => Some(ErrorKind::AccountNotFound),
            ReadError::Rpc(RpcError::Transport(_)) => Some(ErrorKind::NetworkError),
            ReadError::Build(BuildError::Encoding(_)) | ReadError::Decode(_) => {
                Some(ErrorKind::EncodingError)
            }
            _ => None,
        };
        match kind {
            Some(kind) => Self::of_kind(kind, err.to_string()),
            None => Self::from_message(&err.to_string()),
        }
    }
}

impl From<EncodingError> for ClassifiedError {
    fn from(err: EncodingError) -> Self {
        Self::of_kind(ErrorKind::EncodingError, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_panics_classify_by_specific_phrase() {
        let cases = [
            ("Contract already initialized", ErrorKind::AlreadyInitialized),
            ("Address already registered", ErrorKind::AlreadyRegistered),
            ("Seller not registered", ErrorKind::NotRegistered),
            ("Seller not verified", ErrorKind::NotVerified),
            ("Only Land Inspector can verify", ErrorKind::NotAuthorizedRole),
            (
                "Only the seller can approve this request",
                ErrorKind::NotAuthorizedRole,
            ),
            (
                "Invalid number of fractions (must be 1-100)",
                ErrorKind::InvalidFractionCount,
            ),
            ("All fractions have been sold", ErrorKind::FractionsSoldOut),
            (
                "Buyer already owns a fraction of this land",
                ErrorKind::DuplicateFractionOwnership,
            ),
            (
                "This is fractional land, use request_fractional_land instead",
                ErrorKind::FractionalityMismatch,
            ),
            (
                "This is not fractional land, use request_land instead",
                ErrorKind::FractionalityMismatch,
            ),
            (
                "Cannot transfer ownership of fractional land",
                ErrorKind::FractionalityMismatch,
            ),
            ("Request not approved", ErrorKind::RequestNotApproved),
            ("Payment already received", ErrorKind::PaymentAlreadyReceived),
            ("Land not found", ErrorKind::EntityNotFound),
            ("Request not found", ErrorKind::EntityNotFound),
        ];

        for (raw, expected) in cases {
            assert_eq!(classify(raw), expected, "raw: {raw}");
        }
    }

    #[test]
    fn ledger_vocabulary_classifies_after_contract_vocabulary() {
        assert_eq!(classify("User declined access"), ErrorKind::UserRejected);
        assert_eq!(
            classify("tx_insufficient_balance: operation underfunded"),
            ErrorKind::InsufficientBalance
        );
        assert_eq!(
            classify("transaction timed out after 30 attempts"),
            ErrorKind::TransactionTimeout
        );
        assert_eq!(classify("txBAD_AUTH: bad auth"), ErrorKind::BadAuthorization);
        assert_eq!(
            classify("network request failed"),
            ErrorKind::NetworkError
        );
    }

    #[test]
    fn contract_table_wins_over_ledger_table() {
        // "Seller not verified by the network inspector" carries both a
        // contract phrase and the "network" ledger phrase.
        assert_eq!(
            classify("network check: Seller not verified"),
            ErrorKind::NotVerified
        );
    }

    #[test]
    fn unrecognized_text_is_unknown_and_keeps_its_message() {
        let classified = ClassifiedError::from_message("xyzzy happened");
        assert_eq!(classified.kind, ErrorKind::UnknownError);
        assert_eq!(classified.message, "xyzzy happened");
        assert!(!classified.recoverable);
    }

    #[test]
    fn only_timeout_and_network_are_recoverable() {
        assert!(ErrorKind::TransactionTimeout.is_recoverable());
        assert!(ErrorKind::NetworkError.is_recoverable());
        assert!(!ErrorKind::UserRejected.is_recoverable());
        assert!(!ErrorKind::AlreadyRegistered.is_recoverable());
    }

    #[test]
    fn structured_submit_errors_bypass_the_signature_tables() {
        let err = SubmitError::InsufficientBalance {
            balance: 5,
            required: 10_000_000,
        };
        let classified = ClassifiedError::from(err);
        assert_eq!(classified.kind, ErrorKind::InsufficientBalance);

        let classified = ClassifiedError::from(SubmitError::Rejected);
        assert_eq!(classified.kind, ErrorKind::UserRejected);
        assert!(!classified.recoverable);

        let classified = ClassifiedError::from(SubmitError::Timeout {
            hash: "cafe".to_string(),
            attempts: 30,
        });
        assert_eq!(classified.kind, ErrorKind::TransactionTimeout);
        assert!(classified.recoverable);
    }

    #[test]
    fn network_side_submission_refusal_is_not_a_user_rejection() {
        let err = SubmitError::Submission("submission refused with no result code".to_string());
        let classified = ClassifiedError::from(err);

        assert_eq!(classified.kind, ErrorKind::UnknownError);
        assert!(classified.message.contains("submission refused"));
    }

    #[test]
    fn simulation_text_from_contract_panic_classifies() {
        let err = SubmitError::Simulation(
            "HostError: Error(WasmVm, InvalidAction): Address already registered".to_string(),
        );
        let classified = ClassifiedError::from(err);
        assert_eq!(classified.kind, ErrorKind::AlreadyRegistered);
        assert_eq!(
            classified.message,
            "This address is already registered."
        );
    }
}
