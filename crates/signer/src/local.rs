//! In-process ed25519 signer.
//!
//! Signs transaction envelopes with a locally held secret key. The
//! signature covers the SHA-256 hash of the transaction signature
//! payload, which binds the signature to a single network passphrase.

use async_trait::async_trait;
use ed25519_dalek::{Signer as _, SigningKey};
use sha2::{Digest, Sha256};
use stellar_xdr::curr::{
    DecoratedSignature, Hash, Limits, ReadXdr, Signature, SignatureHint, TransactionEnvelope,
    TransactionSignaturePayload, TransactionSignaturePayloadTaggedTransaction, WriteXdr,
};

use crate::{SignerError, TransactionSigner};

pub struct LocalSigner {
    signing_key: SigningKey,
}

impl LocalSigner {
    /// Builds a signer from a raw 32-byte ed25519 seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Builds a signer from an `S...` strkey-encoded secret key.
    pub fn from_secret_key(secret: &str) -> Result<Self, SignerError> {
        let seed = stellar_strkey::ed25519::PrivateKey::from_string(secret)
            .map_err(|e| SignerError::Signing(format!("invalid secret key: {e:?}")))?;
        Ok(Self::from_seed(&seed.0))
    }

    /// The `G...` strkey address of the signing key.
    pub fn public_key(&self) -> String {
        stellar_strkey::ed25519::PublicKey(self.signing_key.verifying_key().to_bytes())
            .to_string()
    }

    fn signature_hint(&self) -> SignatureHint {
        let public = self.signing_key.verifying_key().to_bytes();
        let mut hint = [0u8; 4];
        hint.copy_from_slice(&public[28..32]);
        SignatureHint(hint)
    }
}

#[async_trait]
impl TransactionSigner for LocalSigner {
    async fn sign_transaction(
        &self,
        envelope_xdr: &str,
        network_passphrase: &str,
    ) -> Result<String, SignerError> {
        let envelope = TransactionEnvelope::from_xdr_base64(envelope_xdr, Limits::none())?;
        let TransactionEnvelope::Tx(mut v1) = envelope else {
            return Err(SignerError::Signing(
                "only v1 transaction envelopes are supported".to_string(),
            ));
        };

        let network_id = Hash(Sha256::digest(network_passphrase.as_bytes()).into());
        let payload = TransactionSignaturePayload {
            network_id,
            tagged_transaction: TransactionSignaturePayloadTaggedTransaction::Tx(v1.tx.clone()),
        };
        let payload_hash: [u8; 32] = Sha256::digest(payload.to_xdr(Limits::none())?).into();

        let signature = self.signing_key.sign(&payload_hash);
        let decorated = DecoratedSignature {
            hint: self.signature_hint(),
            signature: Signature(
                signature
                    .to_bytes()
                    .to_vec()
                    .try_into()
                    .map_err(|_| SignerError::Signing("signature exceeds 64 bytes".to_string()))?,
            ),
        };

        let mut signatures = v1.signatures.to_vec();
        signatures.push(decorated);
        v1.signatures = signatures
            .try_into()
            .map_err(|_| SignerError::Signing("too many signatures on envelope".to_string()))?;

        Ok(TransactionEnvelope::Tx(v1).to_xdr_base64(Limits::none())?)
    }
}
